use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AppError, ErrorKind, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Upper bound on a stored token. Real JWTs sit well below this.
pub const MAX_VALUE_SIZE: usize = 64 * 1024;

/// A key in the device's persisted key/value store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KvKey(String);

impl KvKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The two fixed keys the session persists under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    AccessToken,
    RefreshToken,
}

impl SessionKey {
    pub const ALL: [SessionKey; 2] = [SessionKey::AccessToken, SessionKey::RefreshToken];

    pub const fn as_str(self) -> &'static str {
        match self {
            SessionKey::AccessToken => ACCESS_TOKEN_KEY,
            SessionKey::RefreshToken => REFRESH_TOKEN_KEY,
        }
    }

    fn all_keys() -> Vec<KvKey> {
        Self::ALL.into_iter().map(KvKey::from).collect()
    }
}

impl From<SessionKey> for KvKey {
    fn from(key: SessionKey) -> Self {
        KvKey(key.as_str().to_owned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvOperation {
    GetMulti {
        keys: Vec<KvKey>,
    },
    Set {
        key: KvKey,
        #[serde(with = "serde_bytes")]
        value: Vec<u8>,
    },
    DeleteMulti {
        keys: Vec<KvKey>,
    },
}

impl KvOperation {
    pub fn set(key: KvKey, value: Vec<u8>) -> Result<Self, KvError> {
        match value.len() {
            len if len > MAX_VALUE_SIZE => Err(KvError::ValueTooLarge { len }),
            _ => Ok(Self::Set { key, value }),
        }
    }
}

impl Operation for KvOperation {
    type Output = KvResult;
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvError {
    #[error("refusing to store {len} bytes under one key")]
    ValueTooLarge { len: usize },

    #[error("shell store failed: {message}")]
    Storage { message: String, retryable: bool },

    #[error("{key} holds bytes that are not UTF-8")]
    Corrupted { key: String },

    #[error("store answered with {0}")]
    UnexpectedOutput(String),
}

impl KvError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, KvError::Storage { retryable, .. } if *retryable)
    }
}

impl From<KvError> for AppError {
    fn from(e: KvError) -> Self {
        AppError::new(ErrorKind::Storage, "Device storage failed").with_internal(e.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvOutput {
    /// One entry per requested key, in request order.
    Multi(Vec<Option<Vec<u8>>>),
    Written,
    DeletedMulti { deleted_count: usize },
}

pub type KvResult = Result<KvOutput, KvError>;

/// Decodes the reply to a `GetMulti` of [`SessionKey::ALL`] into
/// `(access, refresh)`. Empty values count as absent.
pub fn decode_session_values(output: KvOutput) -> Result<(Option<String>, Option<String>), KvError> {
    let KvOutput::Multi(values) = output else {
        return Err(KvError::UnexpectedOutput(format!("{output:?}")));
    };

    let mut decoded = Vec::with_capacity(SessionKey::ALL.len());
    for (index, key) in SessionKey::ALL.iter().enumerate() {
        let value = match values.get(index).cloned().flatten() {
            Some(bytes) => Some(String::from_utf8(bytes).map_err(|_| KvError::Corrupted {
                key: key.as_str().to_string(),
            })?),
            None => None,
        };
        decoded.push(value.filter(|v| !v.is_empty()));
    }

    let refresh = decoded.pop().flatten();
    let access = decoded.pop().flatten();
    Ok((access, refresh))
}

/// Capability over the device-local store holding the session tokens.
#[derive(crux_core::macros::Capability)]
pub struct SessionStore<Ev> {
    context: CapabilityContext<KvOperation, Ev>,
}

impl<Ev> SessionStore<Ev> {
    pub fn new(context: CapabilityContext<KvOperation, Ev>) -> Self {
        Self { context }
    }
}

impl<Ev> SessionStore<Ev>
where
    Ev: 'static,
{
    pub fn execute<F>(&self, operation: KvOperation, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }

    pub fn load_session<F>(&self, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        let keys = SessionKey::all_keys();
        self.execute(KvOperation::GetMulti { keys }, make_event);
    }

    pub fn save<F>(&self, key: SessionKey, value: &str, make_event: F) -> Result<(), KvError>
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        let operation = KvOperation::set(key.into(), value.as_bytes().to_vec())?;
        self.execute(operation, make_event);
        Ok(())
    }

    pub fn clear_session<F>(&self, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        let keys = SessionKey::all_keys();
        self.execute(KvOperation::DeleteMulti { keys }, make_event);
    }
}
