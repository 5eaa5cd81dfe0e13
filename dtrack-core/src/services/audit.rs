//! Action log service - append-only audit trail
//!
//! Every mutating operation records a `verb:subject:detail` action string.
//! Logging is best-effort: a failed log write never fails the caller's
//! primary operation. Custody correctness depends on the primary tables,
//! not the log.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::Session;

/// A log entry as stored in the database
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub username: String,
    pub action: String,
    pub ts: String,
}

/// Service for the append-only action log
pub struct AuditService {
    repository: Arc<DuckDbRepository>,
}

impl AuditService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Record an action. Infallible for the caller: storage errors are
    /// swallowed.
    pub fn record(&self, username: &str, action: &str) {
        if let Err(e) = self.repository.insert_log(username, action, Utc::now()) {
            eprintln!("[dtrack] action log write failed: {}", e);
        }
    }

    /// List recent log entries, newest first. Admin only.
    pub fn list(
        &self,
        session: &Session,
        user_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LogEntry>> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may view the action log"));
        }
        let rows = self.repository.list_logs(user_filter, limit)?;
        Ok(rows
            .into_iter()
            .map(|(id, username, action, ts)| LogEntry {
                id,
                username,
                action,
                ts,
            })
            .collect())
    }
}
