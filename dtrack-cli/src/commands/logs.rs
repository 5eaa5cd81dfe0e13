//! Logs command - view the action log

use anyhow::Result;

use super::{authenticate, get_context};
use crate::output;

pub fn run(user: Option<&str>, user_filter: Option<&str>, limit: usize) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    let entries = ctx.audit_service.list(&session, user_filter, limit)?;
    if entries.is_empty() {
        output::info("No log entries");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "User", "Action"]);
    for e in entries {
        table.add_row(vec![e.ts, e.username, e.action]);
    }
    println!("{}", table);
    Ok(())
}
