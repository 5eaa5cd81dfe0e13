//! DTRACK Core - custody tracking for digital evidence storage devices
//!
//! This crate implements the core workflow logic following hexagonal
//! architecture:
//!
//! - **domain**: Core business entities (Account, CustodyRecord, the status
//!   state machine) and the error taxonomy
//! - **services**: Business logic orchestration, one service per feature area
//! - **adapters**: Concrete storage access (DuckDB)
//!
//! The presentation layer (CLI, UI) is a collaborator: it authenticates via
//! [`services::AuthService`], holds the returned [`domain::Session`], and
//! passes it to every role-scoped operation.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::DuckDbRepository;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use adapters::duckdb::{CustodyQuery, RecordOrder};
pub use domain::result::Error;
pub use domain::{
    Account, AnalysisRecord, AnalysisStatus, CustodyRecord, CustodyStatus, ExtractionRecord, Role,
    Session,
};

/// Main context for DTRACK operations
///
/// This is the primary entry point for all business logic. It holds the
/// database connection, configuration, and all services. Construction runs
/// pending migrations and bootstraps the default admin account.
pub struct DtrackContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub auth_service: AuthService,
    pub account_service: AccountService,
    pub custody_service: CustodyService,
    pub disbursement_service: DisbursementService,
    pub options_service: OptionsService,
    pub audit_service: AuditService,
}

impl DtrackContext {
    /// Create a new DTRACK context rooted at the given directory
    pub fn new(dtrack_dir: &Path) -> Result<Self> {
        let config = Config::load(dtrack_dir)?;
        let repository = Arc::new(DuckDbRepository::new(&config.db_path)?);

        // Initialize schema
        repository.ensure_schema()?;

        // Create services
        let auth_service = AuthService::new(Arc::clone(&repository));
        let account_service = AccountService::new(Arc::clone(&repository));
        let custody_service = CustodyService::new(Arc::clone(&repository));
        let disbursement_service = DisbursementService::new(Arc::clone(&repository));
        let options_service = OptionsService::new(Arc::clone(&repository));
        let audit_service = AuditService::new(Arc::clone(&repository));

        // A fresh database gets a usable admin account
        account_service.ensure_default_admin(&Config::initial_admin_password())?;

        Ok(Self {
            config,
            repository,
            auth_service,
            account_service,
            custody_service,
            disbursement_service,
            options_service,
            audit_service,
        })
    }
}
