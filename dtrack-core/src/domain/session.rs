//! Authenticated session context
//!
//! Every core operation takes a `Session` naming the caller and their role.
//! There is no ambient current-user state; the caller obtains a session from
//! `AuthService::login` and passes it explicitly.

use serde::{Deserialize, Serialize};

use super::account::{Account, Role};

/// Role-scoped caller identity for core operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub role: Role,
    /// Parent team, present for subuser sessions
    pub parent_user: Option<String>,
}

impl Session {
    pub fn for_account(account: &Account) -> Self {
        Self {
            username: account.username.clone(),
            role: account.role,
            parent_user: account.parent_user.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
