//! Session lifecycle.
//!
//! ```text
//! Unloaded ──restore──▶ Loading ──no token──────────▶ Anonymous
//!                          │                             ▲   │
//!                          └─token + profile─▶ Authenticated  │ login (tokens pending)
//!                                                  ▲          ▼
//!                                                  └──profile── Anonymous{pending}
//! ```
//!
//! `Authenticated` always holds both the tokens and the profile; a token
//! without a user cannot be represented. `logout` is valid from every state and
//! bumps the epoch so replies to requests made under the old session can be
//! recognised and dropped.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::roles::RoleSet;
use crate::user::UserProfile;
use crate::{AppError, ErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("the server did not return an access token")]
    MissingAccessToken,

    #[error("cannot {action} while the session is {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: Lifecycle,
    },
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        let kind = match e {
            SessionError::MissingAccessToken => ErrorKind::Authentication,
            SessionError::InvalidTransition { .. } => ErrorKind::InvalidState,
        };
        AppError::new(kind, e.to_string())
    }
}

/// Coarse lifecycle for routing and the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Unloaded,
    Loading,
    Anonymous,
    Authenticated,
}

impl Lifecycle {
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Anonymous | Self::Authenticated)
    }
}

/// Why the profile was fetched; decides what a failure does to the tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilePurpose {
    Restore,
    Login,
}

/// Access and refresh token. `Debug` output is redacted.
#[derive(Debug)]
pub struct SessionTokens {
    access: SecretString,
    refresh: Option<SecretString>,
}

impl SessionTokens {
    /// Blank tokens count as missing.
    pub fn new(access: Option<String>, refresh: Option<String>) -> Result<Self, SessionError> {
        let access = access
            .filter(|t| !t.trim().is_empty())
            .ok_or(SessionError::MissingAccessToken)?;
        Ok(Self {
            access: SecretString::new(access),
            refresh: refresh
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::new),
        })
    }

    pub fn access(&self) -> &SecretString {
        &self.access
    }

    /// Stored and restored, never sent: the backend offers no refresh call
    /// this client uses.
    pub fn refresh(&self) -> Option<&SecretString> {
        self.refresh.as_ref()
    }

    pub fn has_refresh(&self) -> bool {
        self.refresh.is_some()
    }

    pub(crate) fn access_value(&self) -> &str {
        self.access.expose_secret()
    }

    pub(crate) fn refresh_value(&self) -> Option<&str> {
        self.refresh.as_ref().map(|r| r.expose_secret().as_str())
    }
}

#[derive(Debug)]
enum State {
    Unloaded,
    Loading { tokens: Option<SessionTokens> },
    Anonymous { pending: Option<SessionTokens> },
    Authenticated {
        tokens: SessionTokens,
        user: UserProfile,
        roles: RoleSet,
    },
}

#[derive(Debug)]
pub struct Session {
    state: State,
    epoch: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: State::Unloaded,
            epoch: 0,
        }
    }
}

impl Session {
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        match self.state {
            State::Unloaded => Lifecycle::Unloaded,
            State::Loading { .. } => Lifecycle::Loading,
            State::Anonymous { .. } => Lifecycle::Anonymous,
            State::Authenticated { .. } => Lifecycle::Authenticated,
        }
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Tokens of the session or of a login / restore waiting on its profile.
    #[must_use]
    pub fn tokens(&self) -> Option<&SessionTokens> {
        match &self.state {
            State::Loading { tokens } => tokens.as_ref(),
            State::Anonymous { pending } => pending.as_ref(),
            State::Authenticated { tokens, .. } => Some(tokens),
            State::Unloaded => None,
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&SecretString> {
        self.tokens().map(SessionTokens::access)
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        match &self.state {
            State::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub fn roles(&self) -> Option<&RoleSet> {
        match &self.state {
            State::Authenticated { roles, .. } => Some(roles),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, State::Authenticated { .. })
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles().is_some_and(RoleSet::is_admin)
    }

    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.roles().is_some_and(RoleSet::is_super_admin)
    }

    #[must_use]
    pub fn can_manage(&self) -> bool {
        self.roles().is_some_and(RoleSet::can_manage)
    }

    /// App start, or a retry after a restore that could not reach the
    /// server. Not allowed once signed in.
    pub fn begin_restore(&mut self) -> Result<(), SessionError> {
        match self.state {
            State::Unloaded | State::Anonymous { pending: None } => {
                self.state = State::Loading { tokens: None };
                Ok(())
            }
            _ => Err(self.invalid("restore")),
        }
    }

    /// Records what the store held. Returns `true` when a profile fetch
    /// should follow.
    pub fn restored(&mut self, tokens: Option<SessionTokens>) -> Result<bool, SessionError> {
        if !matches!(self.state, State::Loading { tokens: None }) {
            return Err(self.invalid("finish restoring"));
        }
        let needs_profile = tokens.is_some();
        self.state = match tokens {
            Some(tokens) => State::Loading {
                tokens: Some(tokens),
            },
            None => State::Anonymous { pending: None },
        };
        Ok(needs_profile)
    }

    /// Holds freshly issued tokens until the profile confirms them.
    pub fn begin_login(&mut self, tokens: SessionTokens) -> Result<(), SessionError> {
        match self.state {
            State::Anonymous { .. } => {
                self.state = State::Anonymous {
                    pending: Some(tokens),
                };
                Ok(())
            }
            _ => Err(self.invalid("log in")),
        }
    }

    pub fn authenticate(&mut self, user: UserProfile) -> Result<(), SessionError> {
        let state = std::mem::replace(&mut self.state, State::Unloaded);
        let tokens = match state {
            State::Loading {
                tokens: Some(tokens),
            }
            | State::Anonymous {
                pending: Some(tokens),
            } => tokens,
            other => {
                self.state = other;
                return Err(self.invalid("authenticate"));
            }
        };
        let roles = user.role_set();
        self.state = State::Authenticated {
            tokens,
            user,
            roles,
        };
        Ok(())
    }

    /// Drops tokens waiting on a profile and settles as anonymous. The epoch
    /// is kept; nothing issued before is stale.
    pub fn abandon_pending(&mut self) {
        if !self.is_authenticated() {
            self.state = State::Anonymous { pending: None };
        }
    }

    pub fn replace_user(&mut self, profile: UserProfile) -> Result<(), SessionError> {
        match &mut self.state {
            State::Authenticated { user, roles, .. } => {
                *roles = profile.role_set();
                *user = profile;
                Ok(())
            }
            _ => Err(self.invalid("update the profile")),
        }
    }

    /// Forgets everything about the current session.
    pub fn logout(&mut self) {
        self.state = State::Anonymous { pending: None };
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.lifecycle(),
        }
    }
}
