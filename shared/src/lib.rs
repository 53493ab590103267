//! Shared core of the campus facility-complaint client.
//!
//! Users report maintenance issues against a block/floor/room, administrators
//! triage them and a super admin watches aggregate numbers. All of the client
//! logic runs here as a Crux app; the platform shells only render the
//! [`ViewModel`] and execute the effects this crate asks for.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]

/// Declares a numeric backend identifier with a transparent wire format.
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub mod api;
pub mod app;
pub mod capabilities;
pub mod complaint;
pub mod config;
pub mod event;
pub mod location;
pub mod model;
pub mod multipart;
pub mod roles;
pub mod router;
pub mod screens;
pub mod session;
pub mod user;
pub mod view;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::App as CruxApp;
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const DEFAULT_API_BASE_URL: &str = "http://10.0.2.2:8080";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_UPLOAD_TIMEOUT_MS: u64 = 120_000;
pub const MAX_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_FEEDBACK_RATING: i32 = 5;
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const DESCRIPTION_PREVIEW_LENGTH: usize = 80;
pub const IMAGE_FORM_FIELD: &str = "image";

/// Broad failure classes. Screens pick their alert text from these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Conflict,
    Storage,
    Serialization,
    ImageTooLarge,
    ImageFormatUnsupported,
    Configuration,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    /// Stable label for log fields.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Authentication => "unauthenticated",
            Self::Authorization => "forbidden",
            Self::Validation => "invalid_input",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Storage => "device_storage",
            Self::Serialization => "unreadable_reply",
            Self::ImageTooLarge => "photo_too_large",
            Self::ImageFormatUnsupported => "photo_format",
            Self::Configuration => "config",
            Self::InvalidState => "invalid_state",
            Self::Internal => "server",
            Self::Unknown => "unknown",
        }
    }

    /// Failures that may succeed if the user simply tries again. Nothing is
    /// retried automatically.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::Storage | Self::Conflict
        )
    }

    /// 401 and 403 both mean the current credentials are not good enough.
    #[must_use]
    pub const fn is_auth_failure(self) -> bool {
        matches!(self, Self::Authentication | Self::Authorization)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    /// The `message` field of the backend's error body, when it sent one.
    pub server_message: Option<String>,
    /// Status of the reply this error was built from; `None` for failures
    /// raised on the device.
    pub http_status: Option<u16>,
    /// Detail for logs only.
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            server_message: None,
            http_status: None,
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// What a screen shows for a failed call: the backend's own message if
    /// there was one, the screen's generic fallback otherwise. Client-side
    /// validation messages are always shown as-is.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        if self.kind == ErrorKind::Validation && self.http_status.is_none() {
            return self.message.clone();
        }
        match self.server_message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Text for places with no screen-specific fallback.
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        if let Some(message) = self.server_message.as_deref().filter(|m| !m.trim().is_empty()) {
            return message.to_string();
        }
        let text = match self.kind {
            ErrorKind::Validation | ErrorKind::Configuration => return self.message.clone(),
            ErrorKind::ImageTooLarge => {
                return format!(
                    "Photos must be under {} MB",
                    MAX_IMAGE_BYTES / (1024 * 1024)
                )
            }
            ErrorKind::Network => "Could not reach the server. Check your connection",
            ErrorKind::Timeout => "The server took too long to answer",
            ErrorKind::Authentication => "Your session has expired. Please log in again.",
            ErrorKind::Authorization => "Your account is not allowed to do that",
            ErrorKind::NotFound => "That item no longer exists",
            ErrorKind::Conflict => "Someone else changed this first. Refresh and retry",
            ErrorKind::Storage => "Could not use this device's secure storage",
            ErrorKind::Serialization => "The server's reply could not be read",
            ErrorKind::ImageFormatUnsupported => "Attach a JPEG, PNG or WebP photo",
            ErrorKind::InvalidState | ErrorKind::Internal | ErrorKind::Unknown => {
                "Something went wrong"
            }
        };
        text.to_string()
    }

    /// Classifies a non-2xx reply and lifts the `message` out of its JSON
    /// body when present.
    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 | 422 => ErrorKind::Validation,
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            500..=599 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        };
        let server_message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .and_then(|e| e.message)
            .filter(|m| !m.trim().is_empty());

        Self {
            kind,
            message: server_message
                .clone()
                .unwrap_or_else(|| format!("server replied {status}")),
            server_message,
            http_status: Some(status),
            internal_message: None,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())?;
        if let Some(status) = self.http_status {
            write!(f, " ({status})")?;
        }
        write!(f, ": {}", self.message)?;
        match &self.internal_message {
            Some(detail) => write!(f, " [{detail}]"),
            None => Ok(()),
        }
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Client-side "empty precondition" failures. Checked before any request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter both mobile number and password")]
    MissingCredentials,

    #[error("Please fill in all required fields")]
    MissingSignupFields,

    #[error("Please fill in all fields")]
    IncompleteComplaint,

    #[error("Please enter a comment")]
    MissingComment,

    #[error("Block name is required")]
    MissingBlockName,

    #[error("Please select a block and enter a floor number")]
    MissingFloorFields,

    #[error("Floor number must be a whole number, got '{0}'")]
    InvalidFloorNumber(String),

    #[error("Please select a floor and enter a room number")]
    MissingRoomFields,

    #[error("Name is required")]
    MissingName,
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Success,
    Error,
    Info,
}

/// Modal alert shown by the shell until the user dismisses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
}

impl Alert {
    #[must_use]
    pub fn new(kind: AlertKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(AlertKind::Success, "Success", message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(AlertKind::Error, "Error", message)
    }

    /// Error alert that prefers the backend's message over `fallback`.
    #[must_use]
    pub fn from_error(title: &str, error: &AppError, fallback: &str) -> Self {
        Self::new(AlertKind::Error, title, error.message_or(fallback))
    }
}
