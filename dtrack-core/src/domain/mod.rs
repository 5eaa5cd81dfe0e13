//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
pub mod credential;
mod custody;
mod disbursement;
pub mod result;
mod session;

pub use account::{Account, Role};
pub use custody::{detail_entry, CustodyRecord, CustodyStatus};
pub use disbursement::{AnalysisRecord, AnalysisStatus, ExtractionRecord};
pub use session::Session;
