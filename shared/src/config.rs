//! Backend connection settings.

use thiserror::Error;
use url::Url;

use crate::capabilities::{HttpError, ValidatedUrl};
use crate::{
    AppError, ErrorKind, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_UPLOAD_TIMEOUT_MS, MAX_TIMEOUT_MS,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] HttpError),

    #[error("base URL must not carry a query or fragment: {url}")]
    UnexpectedUrlParts { url: String },

    #[error("timeout must be between 1 and {max}ms, got {value}ms")]
    InvalidTimeout { value: u64, max: u64 },
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

/// Where the backend lives and how long the shell may wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
    request_timeout_ms: u64,
    upload_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            upload_timeout_ms: DEFAULT_UPLOAD_TIMEOUT_MS,
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let validated = ValidatedUrl::new(base_url.trim())?;
        let parsed = Url::parse(validated.as_str())
            .map_err(|e| HttpError::InvalidUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(ConfigError::UnexpectedUrlParts {
                url: base_url.to_string(),
            });
        }

        Ok(Self {
            base_url: validated.as_str().trim_end_matches('/').to_string(),
            ..Self::default()
        })
    }

    /// Applies the shell's timeout overrides; `None` keeps the current value.
    pub fn with_timeouts(
        mut self,
        request_ms: Option<u64>,
        upload_ms: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if let Some(ms) = request_ms {
            self.request_timeout_ms = Self::check_timeout(ms)?;
        }
        if let Some(ms) = upload_ms {
            self.upload_timeout_ms = Self::check_timeout(ms)?;
        }
        Ok(self)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn request_timeout_ms(&self) -> u64 {
        self.request_timeout_ms
    }

    #[must_use]
    pub fn upload_timeout_ms(&self) -> u64 {
        self.upload_timeout_ms
    }

    /// Absolute URL for `path` (which starts with `/`) plus query pairs.
    /// A base URL with its own path prefix keeps it.
    pub fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<ValidatedUrl, HttpError> {
        let joined = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&joined).map_err(|e| HttpError::InvalidUrl {
            url: joined.clone(),
            reason: e.to_string(),
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        ValidatedUrl::new(url.as_str())
    }

    fn check_timeout(value: u64) -> Result<u64, ConfigError> {
        if value == 0 || value > MAX_TIMEOUT_MS {
            return Err(ConfigError::InvalidTimeout {
                value,
                max: MAX_TIMEOUT_MS,
            });
        }
        Ok(value)
    }
}
