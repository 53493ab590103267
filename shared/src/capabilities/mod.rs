//! Shell-facing capabilities: HTTP to the backend, the persisted session
//! store and rendering.

mod http;
mod kv;

pub use self::http::{
    Api, HttpError, HttpHeaders, HttpMethod, HttpOperation, HttpRequest, HttpResponse,
    HttpResult, ValidatedUrl,
};
pub use self::kv::{
    decode_session_values, KvError, KvKey, KvOperation, KvOutput, KvResult, SessionKey,
    SessionStore,
};

// Crux's built-in Render covers view updates, so it is re-exported as is.
pub use crux_core::render::Render;

use crate::event::Event;

/// Everything the core can ask the shell to do.
#[derive(crux_core::macros::Effect)]
#[effect(app = "crate::app::App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub api: Api<Event>,
    pub session_store: SessionStore<Event>,
}
