//! Custody service - the chain-of-custody state machine
//!
//! Guarded transitions move a record forward through
//! available → issued → sealed → in_extraction, each triggered by a
//! specific role against a record it is scoped to. Preconditions are
//! checked before any write, and the write itself re-asserts them as a
//! conditional update so a racing caller cannot slip a transition through.
//!
//! The admin override (`admin_update`) is a separate, privileged operation
//! with no transition check; the guarded API never relaxes its own checks
//! to accommodate it.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::adapters::duckdb::{CustodyQuery, DuckDbRepository, RecordOrder};
use crate::domain::result::{Error, Result};
use crate::domain::{detail_entry, Account, CustodyRecord, CustodyStatus, Role, Session};

use super::AuditService;

/// Input for admin intake of a new device
#[derive(Debug, Clone, Default)]
pub struct NewCustodyRecord {
    pub serial_no: String,
    pub unit: Option<String>,
    pub unit_space: Option<String>,
    /// Optional initial holder; when set the record starts out issued
    pub holder: Option<String>,
}

/// Outcome of an operation that hands a record to a holder
#[derive(Debug, Clone, Serialize)]
pub struct AssignOutcome {
    pub record: CustodyRecord,
    /// Soft warning: the holder already had another issued record.
    /// Never a hard block.
    pub holder_already_active: bool,
}

/// Subuser data entry for an issued record
#[derive(Debug, Clone, Default)]
pub struct DataEntry {
    pub premise_name: String,
    pub date_search: Option<NaiveDate>,
    pub date_seized: Option<NaiveDate>,
    pub details: String,
}

/// Admin override edit. `None` leaves a field unchanged; setting a holder
/// field to an empty string clears it (the record counts as unassigned).
#[derive(Debug, Clone, Default)]
pub struct AdminUpdate {
    pub unit: Option<String>,
    pub unit_space: Option<String>,
    pub team_code: Option<String>,
    pub assigned_subuser: Option<String>,
    pub premise_name: Option<String>,
    pub date_search: Option<NaiveDate>,
    pub date_seized: Option<NaiveDate>,
    pub data_details: Option<String>,
    pub status: Option<CustodyStatus>,
}

/// Listing filter; role scoping is applied on top of it
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Exact holder match. Only honored for admin sessions; other roles are
    /// already pinned to their own scope.
    pub holder: Option<String>,
    pub status: Option<CustodyStatus>,
    /// Substring match over serial number and team code
    pub search: Option<String>,
    pub order: RecordOrder,
}

/// Service for custody record lifecycle
pub struct CustodyService {
    repository: Arc<DuckDbRepository>,
    audit: AuditService,
}

impl CustodyService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        let audit = AuditService::new(Arc::clone(&repository));
        Self { repository, audit }
    }

    /// Admin intake: create a record, optionally issuing it to a holder.
    pub fn intake(&self, session: &Session, input: NewCustodyRecord) -> Result<AssignOutcome> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may add custody records"));
        }

        let mut record = CustodyRecord::new(input.serial_no, session.username.clone());
        record.unit = input.unit;
        record.unit_space = input.unit_space;
        record
            .validate()
            .map_err(Error::validation)?;

        let mut holder_already_active = false;
        if let Some(holder) = &input.holder {
            self.require_approved_user(holder)?;
            holder_already_active = self
                .repository
                .teams_with_active_custody()?
                .contains(holder);
            record.team_code = Some(holder.clone());
            record.status = CustodyStatus::Issued;
        }

        self.repository.insert_custody_record(&record)?;

        let action = match &record.team_code {
            Some(team) => format!("add_assign_hdd:{}:{}", record.serial_no, team),
            None => format!("add_hdd:{}", record.serial_no),
        };
        self.audit.record(&session.username, &action);

        Ok(AssignOutcome {
            record,
            holder_already_active,
        })
    }

    /// available → issued: admin hands the device to a conducting team.
    pub fn assign_to_team(
        &self,
        session: &Session,
        serial_no: &str,
        team: &str,
    ) -> Result<AssignOutcome> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may assign custody records"));
        }
        self.require_approved_user(team)?;

        let record = self.require_record(serial_no)?;
        if record.is_assigned() {
            return Err(Error::conflict(format!(
                "{} already has a holder",
                serial_no
            )));
        }
        if !record.status.can_advance_to(&CustodyStatus::Issued) {
            return Err(Error::conflict(format!(
                "{} is {}, not available",
                serial_no, record.status
            )));
        }

        let holder_already_active = self
            .repository
            .teams_with_active_custody()?
            .contains(team);

        if !self.repository.assign_team(serial_no, team)? {
            return Err(Error::conflict(format!(
                "{} changed concurrently",
                serial_no
            )));
        }

        self.audit.record(
            &session.username,
            &format!("assign_hdd:{}:{}", serial_no, team),
        );
        Ok(AssignOutcome {
            record: self.require_record(serial_no)?,
            holder_already_active,
        })
    }

    /// issued → issued: the holder attaches one of its subusers for data
    /// entry. The record's subuser slot must be empty.
    pub fn assign_to_subuser(
        &self,
        session: &Session,
        serial_no: &str,
        subuser: &str,
        note: &str,
    ) -> Result<()> {
        if session.role != Role::User {
            return Err(Error::unauthorized(
                "only the holding team may assign a subuser",
            ));
        }

        let subuser_account = self
            .repository
            .get_account(subuser)?
            .ok_or_else(|| Error::not_found(format!("subuser {}", subuser)))?;
        if subuser_account.role != Role::Subuser
            || subuser_account.parent_user.as_deref() != Some(session.username.as_str())
        {
            return Err(Error::unauthorized(format!(
                "{} is not a subuser of {}",
                subuser, session.username
            )));
        }

        let record = self.require_record(serial_no)?;
        if record.team_code.as_deref() != Some(session.username.as_str()) {
            return Err(Error::unauthorized(format!(
                "{} is not held by {}",
                serial_no, session.username
            )));
        }
        if record.status != CustodyStatus::Issued {
            return Err(Error::conflict(format!(
                "{} is {}, not issued",
                serial_no, record.status
            )));
        }
        if record.is_assigned_to_subuser() {
            return Err(Error::conflict(format!(
                "{} is already assigned to a subuser",
                serial_no
            )));
        }

        let entry = detail_entry(
            "ASSIGNED TO SUBUSER",
            &session.username,
            &format!("to {}: {}", subuser, note),
        );
        if !self
            .repository
            .assign_subuser(serial_no, &session.username, subuser, &entry)?
        {
            return Err(Error::conflict(format!(
                "{} changed concurrently",
                serial_no
            )));
        }

        self.audit.record(
            &session.username,
            &format!("assign_subuser:{}:{}", serial_no, subuser),
        );
        Ok(())
    }

    /// Subuser data entry: descriptive fields only, status untouched.
    ///
    /// Allowed iff the record is issued, held by the subuser's parent team,
    /// and assigned to this subuser. Everything else is `Unauthorized`.
    pub fn enter_details(
        &self,
        session: &Session,
        serial_no: &str,
        entry: DataEntry,
    ) -> Result<()> {
        if session.role != Role::Subuser {
            return Err(Error::unauthorized("only a subuser may enter seizure data"));
        }
        let parent = session
            .parent_user
            .as_deref()
            .ok_or_else(|| Error::unauthorized("subuser session has no parent team"))?;

        if entry.premise_name.trim().is_empty() || entry.details.trim().is_empty() {
            return Err(Error::validation("premise name and data details are required"));
        }

        let record = self.require_record(serial_no)?;
        let scoped = record.team_code.as_deref() == Some(parent)
            && record.assigned_subuser.as_deref() == Some(session.username.as_str())
            && record.status == CustodyStatus::Issued;
        if !scoped {
            return Err(Error::unauthorized(format!(
                "{} is not open for data entry by {}",
                serial_no, session.username
            )));
        }

        let block = format!(
            "\nPremise: {}\nSearch Date: {}\nSeized Date: {}\n\nData Details:\n{}",
            entry.premise_name,
            entry.date_search.map(|d| d.to_string()).unwrap_or_default(),
            entry.date_seized.map(|d| d.to_string()).unwrap_or_default(),
            entry.details,
        );
        let detail = detail_entry("DATA ENTRY", &session.username, &block);

        if !self.repository.apply_data_entry(
            serial_no,
            parent,
            &session.username,
            &entry.premise_name,
            entry.date_search,
            entry.date_seized,
            &detail,
        )? {
            return Err(Error::conflict(format!(
                "{} changed concurrently",
                serial_no
            )));
        }

        self.audit
            .record(&session.username, &format!("enter_data:{}", serial_no));
        Ok(())
    }

    /// issued → sealed: the holding team marks data entry complete.
    pub fn seal(&self, session: &Session, serial_no: &str, note: &str) -> Result<()> {
        if session.role != Role::User {
            return Err(Error::unauthorized("only the holding team may seal a record"));
        }

        let record = self.require_record(serial_no)?;
        if record.team_code.as_deref() != Some(session.username.as_str()) {
            return Err(Error::unauthorized(format!(
                "{} is not held by {}",
                serial_no, session.username
            )));
        }
        if !record.status.can_advance_to(&CustodyStatus::Sealed) {
            return Err(Error::conflict(format!(
                "{} is {}, not issued",
                serial_no, record.status
            )));
        }

        let entry = detail_entry("SEALED", &session.username, note);
        if !self
            .repository
            .seal_record(serial_no, &session.username, &entry)?
        {
            return Err(Error::conflict(format!(
                "{} changed concurrently",
                serial_no
            )));
        }

        self.audit
            .record(&session.username, &format!("seal_hdd:{}", serial_no));
        Ok(())
    }

    /// Administrative override: rewrite any subset of fields, including
    /// status, with no transition check. Distinct from the guarded API.
    pub fn admin_update(
        &self,
        session: &Session,
        serial_no: &str,
        update: AdminUpdate,
    ) -> Result<CustodyRecord> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may edit records directly"));
        }

        let mut record = self.require_record(serial_no)?;
        if let Some(unit) = update.unit {
            record.unit = Some(unit);
        }
        if let Some(unit_space) = update.unit_space {
            record.unit_space = Some(unit_space);
        }
        if let Some(team_code) = update.team_code {
            record.team_code = Some(team_code);
        }
        if let Some(assigned_subuser) = update.assigned_subuser {
            record.assigned_subuser = Some(assigned_subuser);
        }
        if let Some(premise_name) = update.premise_name {
            record.premise_name = Some(premise_name);
        }
        if let Some(date_search) = update.date_search {
            record.date_search = Some(date_search);
        }
        if let Some(date_seized) = update.date_seized {
            record.date_seized = Some(date_seized);
        }
        if let Some(data_details) = update.data_details {
            record.data_details = data_details;
        }
        if let Some(status) = update.status {
            record.status = status;
        }

        if !self.repository.update_custody_record(&record)? {
            return Err(Error::not_found(format!("serial {}", serial_no)));
        }

        self.audit
            .record(&session.username, &format!("edit_record:{}", serial_no));
        Ok(record)
    }

    /// Fetch one record, scoped to the caller's role.
    pub fn get(&self, session: &Session, serial_no: &str) -> Result<CustodyRecord> {
        let record = self.require_record(serial_no)?;
        let visible = match session.role {
            Role::Admin => true,
            Role::User => record.team_code.as_deref() == Some(session.username.as_str()),
            Role::Subuser => {
                record.team_code.as_deref() == session.parent_user.as_deref()
                    && record.assigned_subuser.as_deref() == Some(session.username.as_str())
            }
        };
        if !visible {
            return Err(Error::unauthorized(format!(
                "{} is outside {}'s scope",
                serial_no, session.username
            )));
        }
        Ok(record)
    }

    /// List records, scoped to the caller's role on top of the filter.
    pub fn list(&self, session: &Session, filter: RecordFilter) -> Result<Vec<CustodyRecord>> {
        let mut query = CustodyQuery {
            status: filter.status.map(|s| s.as_str().to_string()),
            search: filter.search,
            order: filter.order,
            ..Default::default()
        };
        match session.role {
            Role::Admin => query.team_code = filter.holder,
            Role::User => query.team_code = Some(session.username.clone()),
            Role::Subuser => {
                query.team_code = session.parent_user.clone();
                query.assigned_subuser = Some(session.username.clone());
            }
        }
        self.repository.list_custody_records(&query)
    }

    /// Bulk export of the full custody table: all columns, all rows.
    /// Admin only; rendering is the caller's concern.
    pub fn export_all(&self, session: &Session) -> Result<Vec<CustodyRecord>> {
        if !session.is_admin() {
            return Err(Error::unauthorized("only admin may export records"));
        }
        self.repository.list_custody_records(&CustodyQuery {
            order: RecordOrder::NewestFirst,
            ..Default::default()
        })
    }

    fn require_record(&self, serial_no: &str) -> Result<CustodyRecord> {
        self.repository
            .get_custody_record(serial_no)?
            .ok_or_else(|| Error::not_found(format!("serial {}", serial_no)))
    }

    fn require_approved_user(&self, username: &str) -> Result<Account> {
        let account = self
            .repository
            .get_account(username)?
            .ok_or_else(|| Error::not_found(format!("user {}", username)))?;
        if account.role != Role::User || !account.approved {
            return Err(Error::validation(format!(
                "{} is not an approved conducting team",
                username
            )));
        }
        Ok(account)
    }
}
