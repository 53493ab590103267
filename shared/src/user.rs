//! Users, credentials and the auth payloads exchanged with the backend.

use serde::{Deserialize, Deserializer, Serialize};

use crate::roles::{Role, RoleSet};
use crate::ValidationError;

numeric_id!(
    /// Backend identifier of a user account.
    UserId
);

/// A user as returned by `/api/users/profile` and `/api/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Raw role value as the backend sent it. A JSON array arrives here
    /// comma-joined.
    #[serde(default, deserialize_with = "role_text")]
    pub roles: String,
}

/// Some backends send `roles` as `"ROLE_ADMIN"`, others as `["ROLE_ADMIN"]`.
fn role_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        List(Vec<String>),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::List(items)) => items.join(","),
        None => String::new(),
    })
}

impl UserProfile {
    #[must_use]
    pub fn role_set(&self) -> RoleSet {
        RoleSet::parse(&self.roles)
    }

    /// Avatar label: the first two characters of the name, upper-cased.
    #[must_use]
    pub fn initials(&self) -> String {
        let initials: String = self
            .name
            .trim()
            .chars()
            .take(2)
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials
        }
    }

    #[must_use]
    pub fn email_label(&self) -> String {
        match self.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => "Not provided".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub mobile_number: &'a str,
    pub password: &'a str,
}

impl<'a> LoginRequest<'a> {
    pub fn new(mobile_number: &'a str, password: &'a str) -> Result<Self, ValidationError> {
        if mobile_number.trim().is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        Ok(Self {
            mobile_number: mobile_number.trim(),
            password,
        })
    }
}

/// Reply to `/auth/login`. Either token may be missing on a malformed reply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest<'a> {
    pub name: &'a str,
    pub mobile_number: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> SignupRequest<'a> {
    /// Name, mobile number and password are required; email is optional and
    /// sent as an empty string when left blank.
    pub fn new(
        name: &'a str,
        mobile_number: &'a str,
        email: &'a str,
        password: &'a str,
    ) -> Result<Self, ValidationError> {
        if name.trim().is_empty() || mobile_number.trim().is_empty() || password.is_empty() {
            return Err(ValidationError::MissingSignupFields);
        }
        Ok(Self {
            name: name.trim(),
            mobile_number: mobile_number.trim(),
            email: email.trim(),
            password,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest<'a> {
    pub mobile_number: &'a str,
    pub roles: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProfileRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

impl<'a> EditProfileRequest<'a> {
    pub fn new(name: &'a str, email: &'a str) -> Result<Self, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        Ok(Self {
            name: name.trim(),
            email: email.trim(),
        })
    }
}
