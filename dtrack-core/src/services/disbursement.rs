//! Disbursement service - vendor extraction and analyst handoff
//!
//! Both operations are append-only: once an extraction or analysis record
//! exists it is never updated or deleted. The extraction step is the only
//! one that touches the custody record (sealed → in_extraction), and it
//! does so in the same transaction as the snapshot insert.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{AnalysisRecord, AnalysisStatus, CustodyStatus, ExtractionRecord, Role, Session};

use super::AuditService;

/// Request to hand a sealed device to an extraction vendor
#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    pub serial_no: String,
    pub vendor: String,
    pub date_extraction_start: Option<NaiveDate>,
    pub date_receiving: Option<NaiveDate>,
    /// Serial of the new medium carrying the extracted data
    pub extracted_serial_no: String,
    pub working_copies: Vec<String>,
    /// Optional team to route the extraction output to
    pub assigned_user: Option<String>,
}

/// Request to disburse extracted data to an analyst
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub extracted_serial_no: String,
    pub analyst_name: String,
    pub date_disburse: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Service for the extraction → analysis derivation chain
pub struct DisbursementService {
    repository: Arc<DuckDbRepository>,
    audit: AuditService,
}

impl DisbursementService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        let audit = AuditService::new(Arc::clone(&repository));
        Self { repository, audit }
    }

    /// sealed → in_extraction: snapshot the record and hand it to a vendor.
    pub fn send_to_extraction(
        &self,
        session: &Session,
        request: ExtractionRequest,
    ) -> Result<ExtractionRecord> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may send records to extraction"));
        }
        if request.vendor.trim().is_empty() {
            return Err(Error::validation("extraction vendor is required"));
        }
        if request.extracted_serial_no.trim().is_empty() {
            return Err(Error::validation("extracted serial number is required"));
        }

        let source = self
            .repository
            .get_custody_record(&request.serial_no)?
            .ok_or_else(|| Error::not_found(format!("serial {}", request.serial_no)))?;
        if source.status != CustodyStatus::Sealed {
            return Err(Error::conflict(format!(
                "{} is {}, not sealed",
                source.serial_no, source.status
            )));
        }

        let record = ExtractionRecord {
            id: 0, // assigned by the database
            original_serial_no: source.serial_no.clone(),
            unit: source.unit.clone(),
            unit_space: source.unit_space.clone(),
            team_code: source.team_code.clone(),
            data_details: Some(source.data_details.clone()),
            vendor: request.vendor.clone(),
            date_extraction_start: request.date_extraction_start,
            date_receiving: request.date_receiving,
            extracted_serial_no: request.extracted_serial_no.clone(),
            working_copy_sns: request.working_copies,
            assigned_user: request.assigned_user,
            created_by: Some(session.username.clone()),
            created_on: Utc::now(),
        };

        if !self.repository.insert_extraction_and_mark(&record)? {
            // Lost the seal between the read above and the guarded update.
            return Err(Error::conflict(format!(
                "{} changed concurrently",
                record.original_serial_no
            )));
        }

        self.audit.record(
            &session.username,
            &format!(
                "extraction_send:{}:{}",
                record.original_serial_no, record.vendor
            ),
        );
        Ok(record)
    }

    /// Disburse an extraction output to an analyst. Does not touch the
    /// custody record; the chain past extraction is purely additive.
    pub fn send_to_analysis(
        &self,
        session: &Session,
        request: AnalysisRequest,
    ) -> Result<AnalysisRecord> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may disburse to analysts"));
        }
        if request.analyst_name.trim().is_empty() {
            return Err(Error::validation("analyst name is required"));
        }

        if self
            .repository
            .get_extraction_by_output_serial(&request.extracted_serial_no)?
            .is_none()
        {
            return Err(Error::not_found(format!(
                "extraction output {}",
                request.extracted_serial_no
            )));
        }

        let record = AnalysisRecord {
            id: 0, // assigned by the database
            extracted_serial_no: request.extracted_serial_no.clone(),
            analyst_name: request.analyst_name.clone(),
            date_disburse: request.date_disburse,
            analysis_notes: request.notes,
            status: AnalysisStatus::InProgress,
            created_by: Some(session.username.clone()),
            created_on: Utc::now(),
        };
        self.repository.insert_analysis(&record)?;

        self.audit.record(
            &session.username,
            &format!(
                "analysis_disburse:{}:{}",
                record.extracted_serial_no, record.analyst_name
            ),
        );
        Ok(record)
    }

    /// List extraction records: admin sees all, a team sees its own chain.
    pub fn list_extractions(&self, session: &Session) -> Result<Vec<ExtractionRecord>> {
        match session.role {
            Role::Admin => self.repository.list_extractions(),
            Role::User => self.repository.list_extractions_for_team(&session.username),
            Role::Subuser => Err(Error::unauthorized(
                "subusers may not view extraction records",
            )),
        }
    }

    /// List analysis records: admin sees all, a team sees its own chain.
    pub fn list_analysis(&self, session: &Session) -> Result<Vec<AnalysisRecord>> {
        match session.role {
            Role::Admin => self.repository.list_analysis(),
            Role::User => self.repository.list_analysis_for_team(&session.username),
            Role::Subuser => Err(Error::unauthorized(
                "subusers may not view analysis records",
            )),
        }
    }
}
