//! Account service - account lifecycle and role management
//!
//! Admin-created accounts are approved immediately; self-registered teams
//! wait for approval (see `AuthService::register`). Subusers are created by
//! their parent team (or by an admin naming the parent) and expire 7 days
//! after creation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::credential::{
    hash_password, MIN_PASSWORD_LEN, PASSWORD_EXPIRY_DAYS, SUBUSER_VALIDITY_DAYS,
};
use crate::domain::result::{Error, Result};
use crate::domain::{Account, Role, Session};

use super::AuditService;

/// Assignment availability of a holder account.
///
/// This is the flag the presentation layer renders as a busy/free marker;
/// the core exposes it as a plain boolean, never as a decorated label.
#[derive(Debug, Clone, Serialize)]
pub struct HolderStatus {
    pub username: String,
    pub has_active_custody: bool,
}

/// Summary row for account listings (password hash withheld)
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub username: String,
    pub role: Role,
    pub approved: bool,
    pub valid_till: Option<DateTime<Utc>>,
    pub password_expiry: Option<DateTime<Utc>>,
    pub parent_user: Option<String>,
}

impl From<Account> for AccountSummary {
    fn from(a: Account) -> Self {
        Self {
            username: a.username,
            role: a.role,
            approved: a.approved,
            valid_till: a.valid_till,
            password_expiry: a.password_expiry,
            parent_user: a.parent_user,
        }
    }
}

/// Service for account lifecycle management
pub struct AccountService {
    repository: Arc<DuckDbRepository>,
    audit: AuditService,
}

impl AccountService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        let audit = AuditService::new(Arc::clone(&repository));
        Self { repository, audit }
    }

    /// Create an approved user or admin account. Admin only.
    pub fn create_account(
        &self,
        session: &Session,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<()> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may create accounts"));
        }
        if role == Role::Subuser {
            return Err(Error::validation(
                "subusers are created through create_subuser",
            ));
        }
        let username = validate_new_credentials(username, password)?;

        let account = Account {
            username: username.to_string(),
            password_hash: hash_password(password),
            role,
            approved: true,
            valid_till: None,
            password_expiry: Some(Utc::now() + Duration::days(PASSWORD_EXPIRY_DAYS)),
            parent_user: None,
            created_on: Utc::now(),
        };
        self.repository.insert_account(&account)?;

        self.audit
            .record(&session.username, &format!("create_user:{}", username));
        Ok(())
    }

    /// Create a subuser under a parent team.
    ///
    /// A user session creates subusers under itself; an admin must name the
    /// parent. The subuser is approved immediately but expires after 7 days.
    pub fn create_subuser(
        &self,
        session: &Session,
        username: &str,
        password: &str,
        parent: Option<&str>,
    ) -> Result<Account> {
        let parent = match session.role {
            Role::User => session.username.as_str(),
            Role::Admin => parent.ok_or_else(|| {
                Error::validation("admin must name the parent team for a subuser")
            })?,
            Role::Subuser => {
                return Err(Error::unauthorized("subusers may not create accounts"));
            }
        };
        let username = validate_new_credentials(username, password)?;

        // The parent must be a real, approved conducting team.
        let parent_account = self
            .repository
            .get_account(parent)?
            .ok_or_else(|| Error::not_found(format!("parent user {}", parent)))?;
        if parent_account.role != Role::User || !parent_account.approved {
            return Err(Error::validation(format!(
                "{} is not an approved conducting team",
                parent
            )));
        }

        let account = Account {
            username: username.to_string(),
            password_hash: hash_password(password),
            role: Role::Subuser,
            approved: true,
            valid_till: Some(Utc::now() + Duration::days(SUBUSER_VALIDITY_DAYS)),
            password_expiry: None,
            parent_user: Some(parent.to_string()),
            created_on: Utc::now(),
        };
        self.repository.insert_account(&account)?;

        self.audit.record(
            &session.username,
            &format!("create_subuser:{}:{}", username, parent),
        );
        Ok(account)
    }

    /// Approve or disapprove an account. Admin only.
    pub fn set_approval(&self, session: &Session, username: &str, approved: bool) -> Result<()> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may change approval"));
        }
        if !self.repository.set_approval(username, approved)? {
            return Err(Error::not_found(format!("user {}", username)));
        }
        let verb = if approved { "approve_user" } else { "disapprove_user" };
        self.audit
            .record(&session.username, &format!("{}:{}", verb, username));
        Ok(())
    }

    /// Reset a password and refresh its 90-day expiry. Admin only.
    pub fn reset_password(
        &self,
        session: &Session,
        username: &str,
        new_password: &str,
    ) -> Result<()> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may reset passwords"));
        }
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(Error::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let expiry = Utc::now() + Duration::days(PASSWORD_EXPIRY_DAYS);
        if !self
            .repository
            .set_password(username, &hash_password(new_password), expiry)?
        {
            return Err(Error::not_found(format!("user {}", username)));
        }
        self.audit
            .record(&session.username, &format!("reset_password:{}", username));
        Ok(())
    }

    /// List every account. Admin only.
    pub fn list_accounts(&self, session: &Session) -> Result<Vec<AccountSummary>> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may list accounts"));
        }
        Ok(self
            .repository
            .list_accounts()?
            .into_iter()
            .map(AccountSummary::from)
            .collect())
    }

    /// List subusers: a user sees its own, an admin names any parent.
    pub fn list_subusers(&self, session: &Session, parent: Option<&str>) -> Result<Vec<AccountSummary>> {
        let parent = match session.role {
            Role::User => session.username.as_str(),
            Role::Admin => parent
                .ok_or_else(|| Error::validation("admin must name the parent team"))?,
            Role::Subuser => return Err(Error::unauthorized("subusers may not list accounts")),
        };
        Ok(self
            .repository
            .list_subusers_of(parent)?
            .into_iter()
            .map(AccountSummary::from)
            .collect())
    }

    /// Approved conducting teams with their current-custody flag. Admin only.
    pub fn holder_status(&self, session: &Session) -> Result<Vec<HolderStatus>> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may list holders"));
        }
        let busy = self.repository.teams_with_active_custody()?;
        Ok(self
            .repository
            .list_accounts_by_role(Role::User, true)?
            .into_iter()
            .map(|a| HolderStatus {
                has_active_custody: busy.contains(&a.username),
                username: a.username,
            })
            .collect())
    }

    /// A team's subusers with their current-assignment flag.
    pub fn subuser_status(&self, session: &Session, parent: Option<&str>) -> Result<Vec<HolderStatus>> {
        let parent = match session.role {
            Role::User => session.username.as_str(),
            Role::Admin => parent
                .ok_or_else(|| Error::validation("admin must name the parent team"))?,
            Role::Subuser => return Err(Error::unauthorized("subusers may not list accounts")),
        };
        let busy = self.repository.subusers_with_custody(parent)?;
        Ok(self
            .repository
            .list_subusers_of(parent)?
            .into_iter()
            .map(|a| HolderStatus {
                has_active_custody: busy.contains(&a.username),
                username: a.username,
            })
            .collect())
    }

    /// Create the default admin account if no admin exists yet.
    ///
    /// Called once at context construction so a fresh database is usable.
    pub fn ensure_default_admin(&self, initial_password: &str) -> Result<()> {
        if self.repository.get_account("admin")?.is_some() {
            return Ok(());
        }
        let account = Account {
            username: "admin".to_string(),
            password_hash: hash_password(initial_password),
            role: Role::Admin,
            approved: true,
            valid_till: None,
            password_expiry: None,
            parent_user: None,
            created_on: Utc::now(),
        };
        match self.repository.insert_account(&account) {
            Ok(()) => Ok(()),
            // Lost a race with another process bootstrapping the same DB
            Err(Error::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn validate_new_credentials<'a>(username: &'a str, password: &str) -> Result<&'a str> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::validation("username is required"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(username)
}
