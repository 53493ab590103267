//! Backend endpoints, request builders and response decoders.
//!
//! Nothing here retries, caches or de-duplicates: a request is built, handed
//! to the shell once, and its reply decoded into an [`AppResult`].

use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::capabilities::{HttpMethod, HttpRequest, HttpResult};
use crate::complaint::{ComplaintId, ComplaintStatus};
use crate::config::ApiConfig;
use crate::location::{BlockId, FloorId};
use crate::multipart::{encode_image, ImageAttachment};
use crate::user::UserId;
use crate::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Signup,
    UpdateRole,
    Profile,
    ListUsers,
    EditProfile,
    DeleteUser(UserId),
    ListBlocks,
    CreateBlock,
    FloorsByBlock(BlockId),
    CreateFloor,
    RoomsByFloor(FloorId),
    CreateRoom,
    CreateComplaint,
    ListComplaints,
    MyComplaints,
    UpdateStatus {
        id: ComplaintId,
        status: ComplaintStatus,
    },
    UploadImage(ComplaintId),
    SubmitFeedback(ComplaintId),
}

impl Endpoint {
    #[must_use]
    pub const fn method(self) -> HttpMethod {
        match self {
            Self::Login
            | Self::Signup
            | Self::UpdateRole
            | Self::CreateBlock
            | Self::CreateFloor
            | Self::CreateRoom
            | Self::CreateComplaint
            | Self::UploadImage(_)
            | Self::SubmitFeedback(_) => HttpMethod::Post,
            Self::EditProfile | Self::UpdateStatus { .. } => HttpMethod::Put,
            Self::DeleteUser(_) => HttpMethod::Delete,
            Self::Profile
            | Self::ListUsers
            | Self::ListBlocks
            | Self::FloorsByBlock(_)
            | Self::RoomsByFloor(_)
            | Self::ListComplaints
            | Self::MyComplaints => HttpMethod::Get,
        }
    }

    #[must_use]
    pub fn path(self) -> String {
        match self {
            Self::Login => "/auth/login".into(),
            Self::Signup => "/auth/signup".into(),
            Self::UpdateRole => "/auth/update-role".into(),
            Self::Profile => "/api/users/profile".into(),
            Self::ListUsers => "/api/users".into(),
            Self::EditProfile => "/api/users/edit".into(),
            Self::DeleteUser(id) => format!("/api/users/{id}"),
            Self::ListBlocks | Self::CreateBlock => "/api/blocks".into(),
            Self::FloorsByBlock(id) => format!("/api/floors/block/{id}"),
            Self::CreateFloor => "/api/floors".into(),
            Self::RoomsByFloor(id) => format!("/api/rooms/floor/{id}"),
            Self::CreateRoom => "/api/rooms".into(),
            Self::CreateComplaint | Self::ListComplaints => "/api/complaints".into(),
            Self::MyComplaints => "/api/complaints/my".into(),
            Self::UpdateStatus { id, .. } => format!("/api/complaints/{id}/status"),
            Self::UploadImage(id) => format!("/api/complaints/{id}/image"),
            Self::SubmitFeedback(id) => format!("/api/feedback/{id}"),
        }
    }

    #[must_use]
    pub fn query(self) -> Vec<(&'static str, String)> {
        match self {
            Self::UpdateStatus { status, .. } => vec![("status", status.as_str().to_string())],
            _ => Vec::new(),
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
            Self::UpdateRole => "update_role",
            Self::Profile => "profile",
            Self::ListUsers => "list_users",
            Self::EditProfile => "edit_profile",
            Self::DeleteUser(_) => "delete_user",
            Self::ListBlocks => "list_blocks",
            Self::CreateBlock => "create_block",
            Self::FloorsByBlock(_) => "floors_by_block",
            Self::CreateFloor => "create_floor",
            Self::RoomsByFloor(_) => "rooms_by_floor",
            Self::CreateRoom => "create_room",
            Self::CreateComplaint => "create_complaint",
            Self::ListComplaints => "list_complaints",
            Self::MyComplaints => "my_complaints",
            Self::UpdateStatus { .. } => "update_status",
            Self::UploadImage(_) => "upload_image",
            Self::SubmitFeedback(_) => "submit_feedback",
        }
    }

    /// Whether the backend expects the session's bearer token.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        !matches!(self, Self::Login | Self::Signup)
    }
}

/// Builds requests against the configured backend, attaching the access
/// token where one is held.
#[derive(Debug, Clone, Copy)]
pub struct ApiClient<'a> {
    config: &'a ApiConfig,
    bearer: Option<&'a SecretString>,
}

impl<'a> ApiClient<'a> {
    #[must_use]
    pub fn new(config: &'a ApiConfig, bearer: Option<&'a SecretString>) -> Self {
        Self { config, bearer }
    }

    /// A body-less request using the normal timeout.
    pub fn request(&self, endpoint: Endpoint) -> AppResult<HttpRequest> {
        self.build(endpoint, self.config.request_timeout_ms())
    }

    pub fn json<T: Serialize>(&self, endpoint: Endpoint, body: &T) -> AppResult<HttpRequest> {
        Ok(self.request(endpoint)?.with_json(body)?)
    }

    /// The photo upload for `complaint`, on the longer upload timeout.
    pub fn upload(&self, complaint: ComplaintId, image: &ImageAttachment) -> AppResult<HttpRequest> {
        let form = encode_image(complaint, image);
        let request = self.build(
            Endpoint::UploadImage(complaint),
            self.config.upload_timeout_ms(),
        )?;
        Ok(request.with_body(&form.content_type, form.body)?)
    }

    fn build(&self, endpoint: Endpoint, timeout_ms: u64) -> AppResult<HttpRequest> {
        let url = self.config.endpoint(&endpoint.path(), &endpoint.query())?;
        let request = HttpRequest::new(endpoint.method(), url, timeout_ms)
            .with_header("Accept", "application/json")?;
        match self.bearer {
            Some(token) if endpoint.is_authenticated() => Ok(request.with_bearer(token)?),
            _ => Ok(request),
        }
    }
}

/// Non-2xx replies become an [`AppError`] carrying the body's `message`.
pub fn expect_success(result: &HttpResult) -> AppResult<()> {
    match result {
        Ok(response) if response.is_success() => Ok(()),
        Ok(response) => Err(AppError::from_http_status(
            response.status(),
            Some(response.body()),
        )),
        Err(e) => Err(e.clone().into()),
    }
}

pub fn decode<T: DeserializeOwned>(result: &HttpResult) -> AppResult<T> {
    expect_success(result)?;
    match result {
        Ok(response) => Ok(response.json()?),
        Err(e) => Err(e.clone().into()),
    }
}
