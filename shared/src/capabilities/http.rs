use crux_core::capability::{CapabilityContext, Operation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{AppError, ErrorKind};

pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_REQUEST_BODY_SIZE: usize = 20 * 1024 * 1024;
pub const MAX_HEADER_VALUE_LENGTH: usize = 8192;
pub const MAX_HEADERS_COUNT: usize = 16;

/// Headers the shell's HTTP stack sets itself.
const RESERVED_HEADERS: [&str; 3] = ["host", "content-length", "transfer-encoding"];

/// An absolute `http`/`https` URL with a host and no embedded credentials.
///
/// Campus backends usually sit on private addresses (and the Android emulator
/// reaches the host machine through `10.0.2.2`), so private hosts are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatedUrl(String);

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, HttpError> {
        let raw = url.into();
        let invalid = |reason: String| HttpError::InvalidUrl {
            url: raw.chars().take(80).collect(),
            reason,
        };

        if raw.trim().is_empty() {
            return Err(invalid("empty".into()));
        }
        if raw.len() > MAX_URL_LENGTH {
            return Err(invalid(format!("longer than {MAX_URL_LENGTH} bytes")));
        }
        let parsed = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(invalid(format!("scheme '{other}' is not http(s)"))),
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(invalid("no host".into()));
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(invalid("embedded credentials".into()));
        }
        Ok(Self(parsed.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path and query, without scheme and host. Handy in logs and tests.
    pub fn path_and_query(&self) -> String {
        match Url::parse(&self.0) {
            Ok(parsed) => match parsed.query() {
                Some(query) => format!("{}?{}", parsed.path(), query),
                None => parsed.path().to_string(),
            },
            Err(_) => self.0.clone(),
        }
    }
}

/// Request headers. Names compare case-insensitively; setting a name again
/// replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeaders(Vec<(String, String)>);

impl HttpHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), HttpError> {
        let (name, value) = (name.into(), value.into());
        let reject = |reason: &str| HttpError::InvalidHeader {
            name: name.chars().take(40).collect(),
            reason: reason.to_string(),
        };

        let token = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
        if name.is_empty() || !name.chars().all(token) {
            return Err(reject("name must be a non-empty token"));
        }
        if RESERVED_HEADERS.iter().any(|r| name.eq_ignore_ascii_case(r)) {
            return Err(reject("set by the shell"));
        }
        if value.len() > MAX_HEADER_VALUE_LENGTH {
            return Err(reject("value too long"));
        }
        if value.contains(['\r', '\n', '\0']) {
            return Err(reject("value contains a line break or NUL"));
        }

        self.0.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        if self.0.len() == MAX_HEADERS_COUNT {
            return Err(reject("header list is full"));
        }
        self.0.push((name, value));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn has_request_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request for the shell to execute. The body is raw bytes; JSON and
/// multipart encoding happen in the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    method: HttpMethod,
    url: ValidatedUrl,
    headers: HttpHeaders,
    #[serde(with = "serde_bytes")]
    body: Option<Vec<u8>>,
    timeout_ms: u64,
    request_id: String,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: ValidatedUrl, timeout_ms: u64) -> Self {
        Self {
            method,
            url,
            headers: HttpHeaders::new(),
            body: None,
            timeout_ms,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, HttpError> {
        self.headers.insert(name, value)?;
        Ok(self)
    }

    pub fn with_bearer(self, token: &SecretString) -> Result<Self, HttpError> {
        self.with_header("Authorization", format!("Bearer {}", token.expose_secret()))
    }

    pub fn with_body(mut self, content_type: &str, body: Vec<u8>) -> Result<Self, HttpError> {
        if !self.method.has_request_body() {
            return Err(HttpError::BodyNotAllowed {
                method: self.method,
            });
        }
        if body.len() > MAX_REQUEST_BODY_SIZE {
            return Err(HttpError::Oversized { len: body.len() });
        }

        self.headers.insert("Content-Type", content_type)?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, HttpError> {
        let body = serde_json::to_vec(value).map_err(|e| HttpError::Encode(e.to_string()))?;
        self.with_body("application/json", body)
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &ValidatedUrl {
        &self.url
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpOperation {
    Execute(HttpRequest),
}

impl HttpOperation {
    pub fn request(&self) -> &HttpRequest {
        match self {
            HttpOperation::Execute(request) => request,
        }
    }
}

impl Operation for HttpOperation {
    type Output = HttpResult;
}

/// Failures building a request or reaching the server. A response with a
/// non-2xx status is not an `HttpError`; it comes back as an [`HttpResponse`].
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("{url:?} is not a usable server address ({reason})")]
    InvalidUrl { url: String, reason: String },

    #[error("header {name:?} rejected: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("{method} carries no body")]
    BodyNotAllowed { method: HttpMethod },

    #[error("body of {len} bytes is over the upload cap")]
    Oversized { len: usize },

    #[error("could not encode body: {0}")]
    Encode(String),

    #[error("could not decode {0}")]
    Decode(String),

    #[error("server unreachable: {message}")]
    Connection { message: String },

    #[error("no reply within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("shell dropped the request")]
    Aborted,
}

impl HttpError {
    /// Transport failures worth a retry; everything else fails the same way twice.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

impl From<HttpError> for AppError {
    fn from(e: HttpError) -> Self {
        let (kind, summary) = match e {
            HttpError::Connection { .. } | HttpError::Aborted => {
                (ErrorKind::Network, "No connection to the server")
            }
            HttpError::Timeout { .. } => (ErrorKind::Timeout, "The server did not answer"),
            HttpError::Decode(_) => (ErrorKind::Serialization, "Unexpected reply from the server"),
            HttpError::InvalidUrl { .. } => (ErrorKind::Configuration, "Server address is not valid"),
            HttpError::InvalidHeader { .. }
            | HttpError::BodyNotAllowed { .. }
            | HttpError::Oversized { .. }
            | HttpError::Encode(_) => (ErrorKind::Internal, "Could not build the request"),
        };
        AppError::new(kind, summary).with_internal(e.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpResponse {
    status: u16,
    headers: HttpHeaders,
    #[serde(with = "serde_bytes")]
    body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, headers: HttpHeaders, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A response with no headers, mostly useful to shells and tests.
    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, HttpHeaders::new(), body.into())
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HttpError::Decode(format!("{} reply: {e}", self.status)))
    }
}

pub type HttpResult = Result<HttpResponse, HttpError>;

/// Capability that hands [`HttpRequest`]s to the shell.
#[derive(crux_core::macros::Capability)]
pub struct Api<Ev> {
    context: CapabilityContext<HttpOperation, Ev>,
}

impl<Ev> Api<Ev> {
    pub fn new(context: CapabilityContext<HttpOperation, Ev>) -> Self {
        Self { context }
    }
}

impl<Ev> Api<Ev>
where
    Ev: 'static,
{
    pub fn send<F>(&self, request: HttpRequest, make_event: F)
    where
        F: FnOnce(HttpResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(HttpOperation::Execute(request))
                .await;
            context.update_app(make_event(result));
        });
    }
}
