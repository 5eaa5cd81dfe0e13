//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use dtrack_core::CustodyRecord;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Render custody records as a summary table
pub fn records_table(records: &[CustodyRecord]) -> Table {
    let mut table = create_table();
    table.set_header(vec![
        "Serial", "Unit", "Space", "Team", "Subuser", "Status", "Premise",
    ]);
    for r in records {
        table.add_row(vec![
            r.serial_no.clone(),
            r.unit.clone().unwrap_or_default(),
            r.unit_space.clone().unwrap_or_default(),
            r.team_code.clone().unwrap_or_default(),
            r.assigned_subuser.clone().unwrap_or_default(),
            r.status.to_string(),
            r.premise_name.clone().unwrap_or_default(),
        ]);
    }
    table
}
