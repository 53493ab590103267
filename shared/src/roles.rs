//! Role model.
//!
//! The backend sends a user's roles as one loose string (`"ROLE_USER"`,
//! `"ROLE_ADMIN"`, `"SUPERADMIN"`, sometimes a comma separated list). It is
//! parsed once into a [`RoleSet`] of closed [`Role`] variants, and everything
//! else asks the set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "SUPERADMIN")]
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::SuperAdmin];

    /// Exact, case-sensitive match of a single role token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == token)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "ROLE_USER",
            Self::Admin => "ROLE_ADMIN",
            Self::SuperAdmin => "SUPERADMIN",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Admin => "Admin",
            Self::SuperAdmin => "Super Admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet {
    roles: BTreeSet<Role>,
    unrecognized: Vec<String>,
}

impl RoleSet {
    /// Splits on commas, whitespace, brackets and quotes so that both
    /// `"ROLE_USER,ROLE_ADMIN"` and `["ROLE_ADMIN"]` parse. Tokens that are not
    /// a known role are remembered for display but grant nothing.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut set = Self::default();
        for token in raw
            .split(|c: char| c == ',' || c == '[' || c == ']' || c == '"' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            match Role::from_token(token) {
                Some(role) => {
                    set.roles.insert(role);
                }
                None => set.unrecognized.push(token.to_string()),
            }
        }
        set
    }

    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.contains(Role::Admin)
    }

    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.contains(Role::SuperAdmin)
    }

    /// Admin screens are open to admins and super admins alike.
    #[must_use]
    pub fn can_manage(&self) -> bool {
        self.is_admin() || self.is_super_admin()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.iter().copied()
    }

    #[must_use]
    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }

    /// The role an admin's toggle button would assign: admins are demoted to
    /// `ROLE_USER`, everyone else is promoted to `ROLE_ADMIN`.
    #[must_use]
    pub fn toggled(&self) -> Role {
        if self.is_admin() {
            Role::User
        } else {
            Role::Admin
        }
    }
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self
            .roles
            .iter()
            .map(|r| r.as_str())
            .chain(self.unrecognized.iter().map(String::as_str))
            .collect();
        f.write_str(&names.join(","))
    }
}

/// The flag checks as the backend's first web client computed them. Kept so
/// that behaviour can be compared against [`RoleSet`].
pub mod legacy {
    #[must_use]
    pub fn is_super_admin(raw: &str) -> bool {
        raw == "SUPERADMIN"
    }

    #[must_use]
    pub fn is_admin(raw: &str) -> bool {
        raw.contains("ROLE_ADMIN")
    }
}
