//! Account domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authorization role of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full authority over all records and accounts
    Admin,
    /// A conducting team; owns records where `team_code` matches its username
    User,
    /// Short-lived data-entry account scoped under a parent user
    Subuser,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Subuser => "subuser",
        }
    }

    /// Parse a stored role string. Unknown strings are rejected rather than
    /// defaulted: a row with a role outside the known set must not silently
    /// gain `user` permissions.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            "subuser" => Some(Role::Subuser),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account in the custody system
///
/// Regular accounts (admin/user) carry a `password_expiry` deadline set 90
/// days out on creation or reset. Subusers instead carry `valid_till`, a
/// hard 7-day validity window, and always reference a `parent_user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub approved: bool,
    /// Subuser validity deadline (subusers only)
    pub valid_till: Option<DateTime<Utc>>,
    /// Password expiry deadline (admin/user accounts)
    pub password_expiry: Option<DateTime<Utc>>,
    /// Owning user account (subusers only)
    pub parent_user: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl Account {
    /// True when the password-expiry deadline has passed
    pub fn password_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.password_expiry, Some(deadline) if deadline < now)
    }

    /// True when a subuser's validity window has closed
    pub fn validity_expired(&self, now: DateTime<Utc>) -> bool {
        self.role == Role::Subuser
            && matches!(self.valid_till, Some(deadline) if deadline < now)
    }

    /// Validate account data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username cannot be empty");
        }
        if self.role == Role::Subuser && self.parent_user.is_none() {
            return Err("subuser must have a parent user");
        }
        Ok(())
    }
}
