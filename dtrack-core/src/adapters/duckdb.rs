//! DuckDB repository implementation
//!
//! All SQL lives here. Transition updates are status-guarded
//! (`UPDATE ... WHERE serial_no = ? AND status = ?` plus holder guards) so
//! two racing callers cannot both win the same transition; the loser sees
//! zero rows changed and gets a `Conflict`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use duckdb::{params, Connection, Row};

use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, AnalysisRecord, AnalysisStatus, CustodyRecord, CustodyStatus, ExtractionRecord, Role,
};
use crate::services::MigrationService;

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Check if a storage error is a unique/primary-key violation
fn is_unique_violation(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("duplicate key") || lower.contains("unique") || lower.contains("primary key")
}

/// Translate an insert failure, surfacing duplicates as `Conflict`
fn map_insert_err(e: duckdb::Error, what: &str) -> Error {
    let msg = e.to_string();
    if is_unique_violation(&msg) {
        Error::conflict(format!("duplicate identifier: {}", what))
    } else {
        Error::Database(msg)
    }
}

/// Filter and ordering for custody record listings
#[derive(Debug, Clone, Default)]
pub struct CustodyQuery {
    /// Restrict to a holder team
    pub team_code: Option<String>,
    /// Restrict to a data-entry subuser
    pub assigned_subuser: Option<String>,
    /// Exact status match
    pub status: Option<String>,
    /// Substring match over serial number and team code
    pub search: Option<String>,
    pub order: RecordOrder,
}

/// Listing order for custody records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    Serial,
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Create a new DuckDB repository
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which can occur when two processes open the same database file at once.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[dtrack] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(Error::Database(err_msg));
                }
            }
        }

        Err(last_error.map(|e| Error::Database(e.to_string())).unwrap_or_else(|| {
            Error::database(format!("failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Attempt to open a database connection (called by new() with retry logic)
    fn try_open_connection(db_path: &Path) -> std::result::Result<Connection, duckdb::Error> {
        // Disable extension autoloading; everything we need is statically linked
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<crate::services::MigrationResult> {
        let conn = self.conn.lock().unwrap();
        let migration_service = MigrationService::new(&conn);
        migration_service.run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    // === Account operations ===

    pub fn insert_account(&self, account: &Account) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO accounts (username, password_hash, role, approved,
                                   valid_till, password_expiry, parent_user, created_on)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                account.username,
                account.password_hash,
                account.role.as_str(),
                account.approved,
                account.valid_till.map(|t| t.to_rfc3339()),
                account.password_expiry.map(|t| t.to_rfc3339()),
                account.parent_user,
                account.created_on.to_rfc3339(),
            ],
        )
        .map_err(|e| map_insert_err(e, &account.username))?;
        Ok(())
    }

    pub fn get_account(&self, username: &str) -> Result<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT username, password_hash, role, approved, valid_till,
                    password_expiry, parent_user, created_on
             FROM accounts WHERE username = ?",
        )?;

        match stmt.query_row([username], |row| Ok(row_to_account(row))) {
            Ok(account) => Ok(Some(account)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Flip the approval flag. Returns false when the username does not exist.
    pub fn set_approval(&self, username: &str, approved: bool) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE accounts SET approved = ? WHERE username = ?",
            params![approved, username],
        )?;
        Ok(changed > 0)
    }

    /// Replace a password hash and refresh the expiry deadline.
    pub fn set_password(
        &self,
        username: &str,
        password_hash: &str,
        password_expiry: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE accounts SET password_hash = ?, password_expiry = ? WHERE username = ?",
            params![password_hash, password_expiry.to_rfc3339(), username],
        )?;
        Ok(changed > 0)
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        self.query_accounts(
            "SELECT username, password_hash, role, approved, valid_till,
                    password_expiry, parent_user, created_on
             FROM accounts ORDER BY username",
            &[],
        )
    }

    pub fn list_accounts_by_role(&self, role: Role, approved_only: bool) -> Result<Vec<Account>> {
        let sql = if approved_only {
            "SELECT username, password_hash, role, approved, valid_till,
                    password_expiry, parent_user, created_on
             FROM accounts WHERE role = ? AND approved ORDER BY username"
        } else {
            "SELECT username, password_hash, role, approved, valid_till,
                    password_expiry, parent_user, created_on
             FROM accounts WHERE role = ? ORDER BY username"
        };
        self.query_accounts(sql, &[role.as_str()])
    }

    pub fn list_subusers_of(&self, parent: &str) -> Result<Vec<Account>> {
        self.query_accounts(
            "SELECT username, password_hash, role, approved, valid_till,
                    password_expiry, parent_user, created_on
             FROM accounts WHERE role = 'subuser' AND parent_user = ?
             ORDER BY created_on DESC",
            &[parent],
        )
    }

    fn query_accounts(&self, sql: &str, args: &[&str]) -> Result<Vec<Account>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let accounts = stmt
            .query_map(duckdb::params_from_iter(args), |row| Ok(row_to_account(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(accounts)
    }

    /// Teams that currently hold an issued record
    pub fn teams_with_active_custody(&self) -> Result<HashSet<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT team_code FROM custody_records
             WHERE team_code IS NOT NULL AND team_code != '' AND status = 'issued'",
        )?;
        let teams = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(teams)
    }

    /// Subusers of `parent` that currently have a record assigned
    pub fn subusers_with_custody(&self, parent: &str) -> Result<HashSet<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT assigned_subuser FROM custody_records
             WHERE team_code = ? AND assigned_subuser IS NOT NULL AND assigned_subuser != ''",
        )?;
        let subusers = stmt
            .query_map([parent], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(subusers)
    }

    // === Custody record operations ===

    pub fn insert_custody_record(&self, record: &CustodyRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO custody_records
                 (serial_no, unit, unit_space, team_code, assigned_subuser,
                  premise_name, date_search, date_seized, data_details, status,
                  barcode_value, created_by, created_on)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.serial_no,
                record.unit,
                record.unit_space,
                record.team_code,
                record.assigned_subuser,
                record.premise_name,
                record.date_search.map(|d| d.to_string()),
                record.date_seized.map(|d| d.to_string()),
                record.data_details,
                record.status.as_str(),
                record.barcode_value,
                record.created_by,
                record.created_on.to_rfc3339(),
            ],
        )
        .map_err(|e| map_insert_err(e, &record.serial_no))?;
        Ok(())
    }

    pub fn get_custody_record(&self, serial_no: &str) -> Result<Option<CustodyRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM custody_records WHERE serial_no = ?",
            CUSTODY_COLUMNS
        ))?;

        match stmt.query_row([serial_no], |row| Ok(row_to_custody_record(row))) {
            Ok(record) => Ok(Some(record)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_custody_records(&self, query: &CustodyQuery) -> Result<Vec<CustodyRecord>> {
        let mut sql = format!("SELECT {} FROM custody_records WHERE 1=1", CUSTODY_COLUMNS);
        let mut args: Vec<String> = Vec::new();

        if let Some(team) = &query.team_code {
            sql.push_str(" AND team_code = ?");
            args.push(team.clone());
        }
        if let Some(subuser) = &query.assigned_subuser {
            sql.push_str(" AND assigned_subuser = ?");
            args.push(subuser.clone());
        }
        if let Some(status) = &query.status {
            sql.push_str(" AND status = ?");
            args.push(status.clone());
        }
        if let Some(search) = &query.search {
            sql.push_str(" AND (serial_no LIKE ? OR team_code LIKE ?)");
            let pattern = format!("%{}%", search);
            args.push(pattern.clone());
            args.push(pattern);
        }

        sql.push_str(match query.order {
            RecordOrder::NewestFirst => " ORDER BY created_on DESC",
            RecordOrder::OldestFirst => " ORDER BY created_on ASC",
            RecordOrder::Serial => " ORDER BY serial_no",
        });

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(duckdb::params_from_iter(args), |row| {
                Ok(row_to_custody_record(row))
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    /// available → issued: set the holder.
    ///
    /// Guarded on current status and on the record being unheld, so the
    /// single-custodian rule cannot be broken by a racing assignment.
    /// Returns false when no row matched the guards.
    pub fn assign_team(&self, serial_no: &str, team: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE custody_records
             SET team_code = ?, status = 'issued'
             WHERE serial_no = ? AND status = 'available'
               AND (team_code IS NULL OR team_code = '')",
            params![team, serial_no],
        )?;
        Ok(changed > 0)
    }

    /// issued → issued: attach a data-entry subuser and journal the handoff.
    pub fn assign_subuser(
        &self,
        serial_no: &str,
        team: &str,
        subuser: &str,
        detail: &str,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE custody_records
             SET assigned_subuser = ?, data_details = data_details || ?
             WHERE serial_no = ? AND team_code = ? AND status = 'issued'
               AND (assigned_subuser IS NULL OR assigned_subuser = '')",
            params![subuser, detail, serial_no, team],
        )?;
        Ok(changed > 0)
    }

    /// Subuser data entry: descriptive fields merged, detail log appended,
    /// status untouched.
    pub fn apply_data_entry(
        &self,
        serial_no: &str,
        team: &str,
        subuser: &str,
        premise_name: &str,
        date_search: Option<NaiveDate>,
        date_seized: Option<NaiveDate>,
        detail: &str,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE custody_records
             SET premise_name = ?, date_search = ?, date_seized = ?,
                 data_details = data_details || ?
             WHERE serial_no = ? AND team_code = ? AND assigned_subuser = ?
               AND status = 'issued'",
            params![
                premise_name,
                date_search.map(|d| d.to_string()),
                date_seized.map(|d| d.to_string()),
                detail,
                serial_no,
                team,
                subuser,
            ],
        )?;
        Ok(changed > 0)
    }

    /// issued → sealed, journaling the seal note.
    pub fn seal_record(&self, serial_no: &str, team: &str, detail: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE custody_records
             SET status = 'sealed', data_details = data_details || ?
             WHERE serial_no = ? AND team_code = ? AND status = 'issued'",
            params![detail, serial_no, team],
        )?;
        Ok(changed > 0)
    }

    /// Administrative override: full-row rewrite with no transition check.
    /// The service layer merges unchanged fields before calling this.
    pub fn update_custody_record(&self, record: &CustodyRecord) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE custody_records
             SET unit = ?, unit_space = ?, team_code = ?, assigned_subuser = ?,
                 premise_name = ?, date_search = ?, date_seized = ?,
                 data_details = ?, status = ?, barcode_value = ?
             WHERE serial_no = ?",
            params![
                record.unit,
                record.unit_space,
                record.team_code,
                record.assigned_subuser,
                record.premise_name,
                record.date_search.map(|d| d.to_string()),
                record.date_seized.map(|d| d.to_string()),
                record.data_details,
                record.status.as_str(),
                record.barcode_value,
                record.serial_no,
            ],
        )?;
        Ok(changed > 0)
    }

    // === Disbursement chain operations ===

    /// Insert the extraction snapshot and flip the source record
    /// sealed → in_extraction as one transaction. Either both happen or
    /// neither does.
    pub fn insert_extraction_and_mark(&self, record: &ExtractionRecord) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let claimed = tx.execute(
            "UPDATE custody_records SET status = 'in_extraction'
             WHERE serial_no = ? AND status = 'sealed'",
            params![record.original_serial_no],
        )?;
        if claimed == 0 {
            // Source was not sealed (or vanished); nothing is written.
            return Ok(false);
        }

        tx.execute(
            "INSERT INTO extraction_records
                 (original_serial_no, unit, unit_space, team_code, data_details,
                  vendor, date_extraction_start, date_receiving,
                  extracted_serial_no, working_copy_sns, assigned_user,
                  created_by, created_on)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.original_serial_no,
                record.unit,
                record.unit_space,
                record.team_code,
                record.data_details,
                record.vendor,
                record.date_extraction_start.map(|d| d.to_string()),
                record.date_receiving.map(|d| d.to_string()),
                record.extracted_serial_no,
                serde_json::to_string(&record.working_copy_sns)?,
                record.assigned_user,
                record.created_by,
                record.created_on.to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(true)
    }

    pub fn get_extraction_by_output_serial(
        &self,
        extracted_serial_no: &str,
    ) -> Result<Option<ExtractionRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM extraction_records WHERE extracted_serial_no = ?
             ORDER BY id DESC LIMIT 1",
            EXTRACTION_COLUMNS
        ))?;

        match stmt.query_row([extracted_serial_no], |row| Ok(row_to_extraction(row))) {
            Ok(record) => Ok(Some(record)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_extractions(&self) -> Result<Vec<ExtractionRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM extraction_records ORDER BY id DESC",
            EXTRACTION_COLUMNS
        ))?;
        let records = stmt
            .query_map([], |row| Ok(row_to_extraction(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    /// Extractions whose source record currently belongs to `team`
    pub fn list_extractions_for_team(&self, team: &str) -> Result<Vec<ExtractionRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM extraction_records e
             JOIN custody_records h ON e.original_serial_no = h.serial_no
             WHERE h.team_code = ?
             ORDER BY e.id DESC",
            EXTRACTION_COLUMNS_QUALIFIED
        ))?;
        let records = stmt
            .query_map([team], |row| Ok(row_to_extraction(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    pub fn insert_analysis(&self, record: &AnalysisRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO analysis_records
                 (extracted_serial_no, analyst_name, date_disburse,
                  analysis_notes, status, created_by, created_on)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                record.extracted_serial_no,
                record.analyst_name,
                record.date_disburse.map(|d| d.to_string()),
                record.analysis_notes,
                record.status.as_str(),
                record.created_by,
                record.created_on.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_analysis(&self) -> Result<Vec<AnalysisRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM analysis_records ORDER BY id DESC",
            ANALYSIS_COLUMNS
        ))?;
        let records = stmt
            .query_map([], |row| Ok(row_to_analysis(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    /// Analyses whose chain roots in a record currently held by `team`
    pub fn list_analysis_for_team(&self, team: &str) -> Result<Vec<AnalysisRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM analysis_records a
             JOIN extraction_records e ON a.extracted_serial_no = e.extracted_serial_no
             JOIN custody_records h ON e.original_serial_no = h.serial_no
             WHERE h.team_code = ?
             ORDER BY a.id DESC",
            ANALYSIS_COLUMNS_QUALIFIED
        ))?;
        let records = stmt
            .query_map([team], |row| Ok(row_to_analysis(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    // === Action log operations ===

    pub fn insert_log(&self, username: &str, action: &str, ts: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO logs (username, action, ts) VALUES (?, ?, ?)",
            params![username, action, ts.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn list_logs(
        &self,
        user_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(i64, String, String, String)>> {
        let mut sql = "SELECT id, username, action, ts FROM logs WHERE 1=1".to_string();
        let mut args: Vec<String> = Vec::new();

        if let Some(user) = user_filter {
            sql.push_str(" AND username LIKE ?");
            args.push(format!("%{}%", user));
        }
        sql.push_str(&format!(" ORDER BY id DESC LIMIT {}", limit));

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(duckdb::params_from_iter(args), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    // === Options operations ===

    pub fn list_options(&self, option_type: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT name FROM options WHERE option_type = ? ORDER BY name")?;
        let names = stmt
            .query_map([option_type], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(names)
    }

    pub fn add_option(&self, option_type: &str, name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO options (option_type, name) VALUES (?, ?)",
            params![option_type, name],
        )
        .map_err(|e| map_insert_err(e, name))?;
        Ok(())
    }

    pub fn remove_option(&self, option_type: &str, name: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "DELETE FROM options WHERE option_type = ? AND name = ?",
            params![option_type, name],
        )?;
        Ok(changed > 0)
    }
}

const CUSTODY_COLUMNS: &str = "serial_no, unit, unit_space, team_code, assigned_subuser,
     premise_name, date_search, date_seized, data_details, status,
     barcode_value, created_by, created_on";

const EXTRACTION_COLUMNS: &str = "id, original_serial_no, unit, unit_space, team_code,
     data_details, vendor, date_extraction_start, date_receiving,
     extracted_serial_no, working_copy_sns, assigned_user, created_by, created_on";

const EXTRACTION_COLUMNS_QUALIFIED: &str = "e.id, e.original_serial_no, e.unit, e.unit_space,
     e.team_code, e.data_details, e.vendor, e.date_extraction_start, e.date_receiving,
     e.extracted_serial_no, e.working_copy_sns, e.assigned_user, e.created_by, e.created_on";

const ANALYSIS_COLUMNS: &str = "id, extracted_serial_no, analyst_name, date_disburse,
     analysis_notes, status, created_by, created_on";

const ANALYSIS_COLUMNS_QUALIFIED: &str = "a.id, a.extracted_serial_no, a.analyst_name,
     a.date_disburse, a.analysis_notes, a.status, a.created_by, a.created_on";

fn row_to_account(row: &Row) -> Account {
    // Columns: 0 username, 1 password_hash, 2 role, 3 approved, 4 valid_till,
    // 5 password_expiry, 6 parent_user, 7 created_on
    let role_str: String = row.get(2).unwrap_or_default();
    Account {
        username: row.get(0).unwrap_or_default(),
        password_hash: row.get(1).unwrap_or_default(),
        // Unknown roles collapse to the least-privileged one
        role: Role::parse(&role_str).unwrap_or(Role::Subuser),
        approved: row.get(3).unwrap_or(false),
        valid_till: row.get::<_, Option<String>>(4).ok().flatten().map(|s| parse_timestamp(&s)),
        password_expiry: row
            .get::<_, Option<String>>(5)
            .ok()
            .flatten()
            .map(|s| parse_timestamp(&s)),
        parent_user: row.get(6).ok().flatten(),
        created_on: parse_timestamp(&row.get::<_, String>(7).unwrap_or_default()),
    }
}

fn row_to_custody_record(row: &Row) -> CustodyRecord {
    // Columns: 0 serial_no, 1 unit, 2 unit_space, 3 team_code,
    // 4 assigned_subuser, 5 premise_name, 6 date_search, 7 date_seized,
    // 8 data_details, 9 status, 10 barcode_value, 11 created_by, 12 created_on
    let status_str: String = row.get(9).unwrap_or_default();
    CustodyRecord {
        serial_no: row.get(0).unwrap_or_default(),
        unit: row.get(1).ok().flatten(),
        unit_space: row.get(2).ok().flatten(),
        team_code: row.get(3).ok().flatten(),
        assigned_subuser: row.get(4).ok().flatten(),
        premise_name: row.get(5).ok().flatten(),
        date_search: row.get::<_, Option<String>>(6).ok().flatten().and_then(|s| parse_date(&s)),
        date_seized: row.get::<_, Option<String>>(7).ok().flatten().and_then(|s| parse_date(&s)),
        data_details: row.get(8).unwrap_or_default(),
        status: CustodyStatus::parse(&status_str),
        barcode_value: row.get(10).ok().flatten(),
        created_by: row.get(11).ok().flatten(),
        created_on: parse_timestamp(&row.get::<_, String>(12).unwrap_or_default()),
    }
}

fn row_to_extraction(row: &Row) -> ExtractionRecord {
    // Columns: 0 id, 1 original_serial_no, 2 unit, 3 unit_space, 4 team_code,
    // 5 data_details, 6 vendor, 7 date_extraction_start, 8 date_receiving,
    // 9 extracted_serial_no, 10 working_copy_sns, 11 assigned_user,
    // 12 created_by, 13 created_on
    let working_json: String = row.get(10).unwrap_or_else(|_| "[]".to_string());
    ExtractionRecord {
        id: row.get(0).unwrap_or_default(),
        original_serial_no: row.get(1).unwrap_or_default(),
        unit: row.get(2).ok().flatten(),
        unit_space: row.get(3).ok().flatten(),
        team_code: row.get(4).ok().flatten(),
        data_details: row.get(5).ok().flatten(),
        vendor: row.get(6).unwrap_or_default(),
        date_extraction_start: row
            .get::<_, Option<String>>(7)
            .ok()
            .flatten()
            .and_then(|s| parse_date(&s)),
        date_receiving: row
            .get::<_, Option<String>>(8)
            .ok()
            .flatten()
            .and_then(|s| parse_date(&s)),
        extracted_serial_no: row.get(9).unwrap_or_default(),
        working_copy_sns: serde_json::from_str(&working_json).unwrap_or_default(),
        assigned_user: row.get(11).ok().flatten(),
        created_by: row.get(12).ok().flatten(),
        created_on: parse_timestamp(&row.get::<_, String>(13).unwrap_or_default()),
    }
}

fn row_to_analysis(row: &Row) -> AnalysisRecord {
    // Columns: 0 id, 1 extracted_serial_no, 2 analyst_name, 3 date_disburse,
    // 4 analysis_notes, 5 status, 6 created_by, 7 created_on
    let status_str: String = row.get(5).unwrap_or_default();
    AnalysisRecord {
        id: row.get(0).unwrap_or_default(),
        extracted_serial_no: row.get(1).unwrap_or_default(),
        analyst_name: row.get(2).unwrap_or_default(),
        date_disburse: row
            .get::<_, Option<String>>(3)
            .ok()
            .flatten()
            .and_then(|s| parse_date(&s)),
        analysis_notes: row.get(4).ok().flatten(),
        status: AnalysisStatus::parse(&status_str),
        created_by: row.get(6).ok().flatten(),
        created_on: parse_timestamp(&row.get::<_, String>(7).unwrap_or_default()),
    }
}

/// Parse an RFC 3339 timestamp, falling back to the epoch on garbage
fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH)
}

/// Parse an ISO 8601 date
fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
