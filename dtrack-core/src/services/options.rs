//! Options service - configurable unit and vendor name lists

use std::sync::Arc;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::Session;

use super::AuditService;

/// Kind of configurable option list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Unit,
    Vendor,
}

impl OptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Unit => "unit",
            OptionKind::Vendor => "vendor",
        }
    }
}

/// Service for the admin-editable lookup lists
pub struct OptionsService {
    repository: Arc<DuckDbRepository>,
    audit: AuditService,
}

impl OptionsService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        let audit = AuditService::new(Arc::clone(&repository));
        Self { repository, audit }
    }

    /// List option names, sorted. Available to any session.
    pub fn list(&self, kind: OptionKind) -> Result<Vec<String>> {
        self.repository.list_options(kind.as_str())
    }

    /// Add an option name. Admin only; duplicates are a conflict.
    pub fn add(&self, session: &Session, kind: OptionKind, name: &str) -> Result<()> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may manage options"));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("option name is required"));
        }
        self.repository.add_option(kind.as_str(), name)?;
        self.audit.record(
            &session.username,
            &format!("add_{}:{}", kind.as_str(), name),
        );
        Ok(())
    }

    /// Remove an option name. Admin only.
    pub fn remove(&self, session: &Session, kind: OptionKind, name: &str) -> Result<()> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may manage options"));
        }
        if !self.repository.remove_option(kind.as_str(), name)? {
            return Err(Error::not_found(format!("{} {}", kind.as_str(), name)));
        }
        self.audit.record(
            &session.username,
            &format!("remove_{}:{}", kind.as_str(), name),
        );
        Ok(())
    }
}
