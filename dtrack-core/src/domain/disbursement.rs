//! Disbursement chain domain models
//!
//! Extraction and analysis records form an append-only derivation chain off
//! a custody record: sealed device → vendor extraction output → analyst
//! disbursement. Once written they are never mutated.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a sealed device handed to a vendor for extraction
///
/// Carries copies of the source record's unit/holder/detail fields as they
/// stood at handoff, so later edits to the custody record cannot rewrite
/// the chain's history. Links back to the source by serial number value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub id: i64,
    /// Serial number of the source custody record
    pub original_serial_no: String,
    pub unit: Option<String>,
    pub unit_space: Option<String>,
    pub team_code: Option<String>,
    pub data_details: Option<String>,
    /// Extraction vendor name
    pub vendor: String,
    pub date_extraction_start: Option<NaiveDate>,
    pub date_receiving: Option<NaiveDate>,
    /// Serial number of the new medium holding the extracted data
    pub extracted_serial_no: String,
    /// Ordered working-copy serial numbers
    pub working_copy_sns: Vec<String>,
    pub assigned_user: Option<String>,
    pub created_by: Option<String>,
    pub created_on: DateTime<Utc>,
}

/// Status of an analysis record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    InProgress,
    #[serde(untagged)]
    Other(String),
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AnalysisStatus::InProgress => "in_progress",
            AnalysisStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "in_progress" => AnalysisStatus::InProgress,
            other => AnalysisStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Disbursement of extracted data to an analyst
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    /// Output serial of the extraction this analysis derives from
    pub extracted_serial_no: String,
    pub analyst_name: String,
    pub date_disburse: Option<NaiveDate>,
    pub analysis_notes: Option<String>,
    pub status: AnalysisStatus,
    pub created_by: Option<String>,
    pub created_on: DateTime<Utc>,
}
