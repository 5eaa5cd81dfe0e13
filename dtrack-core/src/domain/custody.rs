//! Custody record domain model
//!
//! A custody record tracks one physical storage device and its position in
//! the chain-of-custody workflow. Status moves forward through a fixed
//! linear chain; each guarded transition requires a named responsible party
//! and appends to the record's own detail log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Workflow status of a custody record
///
/// Stored values outside the known set round-trip through `Other` and are
/// displayed as-is, never coerced back to a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustodyStatus {
    Available,
    Issued,
    Sealed,
    Returned,
    InExtraction,
    #[serde(untagged)]
    Other(String),
}

impl CustodyStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CustodyStatus::Available => "available",
            CustodyStatus::Issued => "issued",
            CustodyStatus::Sealed => "sealed",
            CustodyStatus::Returned => "returned",
            CustodyStatus::InExtraction => "in_extraction",
            CustodyStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "available" => CustodyStatus::Available,
            "issued" => CustodyStatus::Issued,
            "sealed" => CustodyStatus::Sealed,
            "returned" => CustodyStatus::Returned,
            "in_extraction" => CustodyStatus::InExtraction,
            other => CustodyStatus::Other(other.to_string()),
        }
    }

    /// Whether the guarded transition API may move a record from `self` to
    /// `next`. The chain is strictly linear:
    /// available → issued → sealed → in_extraction.
    ///
    /// `returned` is reachable only through the admin override, and unknown
    /// statuses never participate in guarded transitions.
    pub fn can_advance_to(&self, next: &CustodyStatus) -> bool {
        matches!(
            (self, next),
            (CustodyStatus::Available, CustodyStatus::Issued)
                | (CustodyStatus::Issued, CustodyStatus::Sealed)
                | (CustodyStatus::Sealed, CustodyStatus::InExtraction)
        )
    }
}

impl std::fmt::Display for CustodyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked storage device and its custody state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodyRecord {
    /// Device serial number, the natural key
    pub serial_no: String,
    /// Originating unit (admin-managed options list)
    pub unit: Option<String>,
    /// Capacity descriptor, e.g. "2TB SSD"
    pub unit_space: Option<String>,
    /// Current holder: the user account responsible for the device
    pub team_code: Option<String>,
    /// Optional data-entry subuser; must belong to `team_code` when set
    pub assigned_subuser: Option<String>,
    pub premise_name: Option<String>,
    pub date_search: Option<NaiveDate>,
    pub date_seized: Option<NaiveDate>,
    /// Accumulating detail log. Entries are concatenated, never replaced.
    pub data_details: String,
    pub status: CustodyStatus,
    pub barcode_value: Option<String>,
    pub created_by: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl CustodyRecord {
    /// Create a record at intake, before any holder is set
    pub fn new(serial_no: impl Into<String>, created_by: impl Into<String>) -> Self {
        let serial_no = serial_no.into();
        Self {
            barcode_value: Some(serial_no.clone()),
            serial_no,
            unit: None,
            unit_space: None,
            team_code: None,
            assigned_subuser: None,
            premise_name: None,
            date_search: None,
            date_seized: None,
            data_details: String::new(),
            status: CustodyStatus::Available,
            created_by: Some(created_by.into()),
            created_on: Utc::now(),
        }
    }

    /// True when a team currently holds the device
    pub fn is_assigned(&self) -> bool {
        self.team_code.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// True when a subuser is currently attached for data entry
    pub fn is_assigned_to_subuser(&self) -> bool {
        self.assigned_subuser
            .as_deref()
            .is_some_and(|s| !s.is_empty())
    }

    /// Validate record data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.serial_no.trim().is_empty() {
            return Err("serial number cannot be empty");
        }
        Ok(())
    }
}

/// A timestamped, attributed entry for the record's detail log.
///
/// Rendered as `\n[TAG <rfc3339> by <actor>]: <text>` and appended to
/// `data_details`; prior content is never rewritten.
pub fn detail_entry(tag: &str, actor: &str, text: &str) -> String {
    format!("\n[{} {} by {}]: {}", tag, Utc::now().to_rfc3339(), actor, text)
}
