//! Auth service - login and team registration
//!
//! Login checks run in a fixed order and mutate nothing on any failure
//! path: unknown user, approval gate, password, password expiry, subuser
//! validity. The approval gate comes before password verification so an
//! unapproved account can never authenticate, even with correct
//! credentials.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::credential::{
    hash_password, verify_password, MIN_PASSWORD_LEN, PASSWORD_EXPIRY_DAYS,
};
use crate::domain::result::{Error, Result};
use crate::domain::{Account, Role, Session};

use super::AuditService;

/// Service for authentication and self-service registration
pub struct AuthService {
    repository: Arc<DuckDbRepository>,
    audit: AuditService,
}

impl AuthService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        let audit = AuditService::new(Arc::clone(&repository));
        Self { repository, audit }
    }

    /// Authenticate and return a role-scoped session
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        if username.is_empty() || password.is_empty() {
            return Err(Error::validation("username and password are required"));
        }

        let Some(account) = self.repository.get_account(username)? else {
            self.audit.record(username, "login_failed_no_user");
            return Err(Error::not_found(format!("user {}", username)));
        };

        if !account.approved {
            return Err(Error::unauthorized("account is pending admin approval"));
        }

        if !verify_password(password, &account.password_hash) {
            self.audit.record(username, "login_failed_wrong_password");
            return Err(Error::unauthorized("invalid password"));
        }

        let now = Utc::now();
        if account.password_expired(now) {
            return Err(Error::PasswordExpired);
        }
        if account.validity_expired(now) {
            return Err(Error::AccountExpired);
        }

        self.audit.record(username, "login_success");
        Ok(Session::for_account(&account))
    }

    /// Self-service team registration. The account stays unusable until an
    /// admin approves it.
    pub fn register(&self, username: &str, password: &str, confirm: &str) -> Result<()> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(Error::validation("username and password are required"));
        }
        if password != confirm {
            return Err(Error::validation("passwords do not match"));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(Error::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let account = Account {
            username: username.to_string(),
            password_hash: hash_password(password),
            role: Role::User,
            approved: false,
            valid_till: None,
            password_expiry: Some(Utc::now() + Duration::days(PASSWORD_EXPIRY_DAYS)),
            parent_user: None,
            created_on: Utc::now(),
        };
        self.repository
            .insert_account(&account)
            .map_err(|e| match e {
                Error::Conflict(_) => Error::conflict(format!("username {} already taken", username)),
                other => other,
            })?;

        self.audit.record(username, "registered");
        Ok(())
    }

    /// Record a logout. Sessions are caller-held, so this is log-only.
    pub fn logout(&self, session: &Session) {
        self.audit.record(&session.username, "logout");
    }
}
