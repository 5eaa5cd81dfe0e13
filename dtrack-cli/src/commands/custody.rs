//! Custody commands - intake, assignment, data entry, sealing, listings

use anyhow::Result;
use chrono::NaiveDate;
use dtrack_core::services::{AdminUpdate, DataEntry, NewCustodyRecord, RecordFilter};
use dtrack_core::CustodyStatus;

use super::{authenticate, get_context};
use crate::output;

pub fn intake(
    user: Option<&str>,
    serial_no: String,
    unit: Option<String>,
    space: Option<String>,
    assign_to: Option<String>,
) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    let outcome = ctx.custody_service.intake(
        &session,
        NewCustodyRecord {
            serial_no,
            unit,
            unit_space: space,
            holder: assign_to,
        },
    )?;

    match &outcome.record.team_code {
        Some(team) => output::success(&format!(
            "Added {} and issued to {}",
            outcome.record.serial_no, team
        )),
        None => output::success(&format!("Added {} to the pool", outcome.record.serial_no)),
    }
    if outcome.holder_already_active {
        output::warning("Note: this team already holds an issued device");
    }
    Ok(())
}

pub fn assign(user: Option<&str>, serial_no: &str, team: &str) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    let outcome = ctx.custody_service.assign_to_team(&session, serial_no, team)?;
    output::success(&format!("{} issued to {}", serial_no, team));
    if outcome.holder_already_active {
        output::warning("Note: this team already holds an issued device");
    }
    Ok(())
}

pub fn assign_subuser(
    user: Option<&str>,
    serial_no: &str,
    subuser: &str,
    note: &str,
) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    ctx.custody_service
        .assign_to_subuser(&session, serial_no, subuser, note)?;
    output::success(&format!("{} assigned to {}", serial_no, subuser));
    Ok(())
}

pub fn enter_data(
    user: Option<&str>,
    serial_no: &str,
    premise: String,
    details: String,
    search_date: Option<NaiveDate>,
    seized_date: Option<NaiveDate>,
) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    ctx.custody_service.enter_details(
        &session,
        serial_no,
        DataEntry {
            premise_name: premise,
            date_search: search_date,
            date_seized: seized_date,
            details,
        },
    )?;
    output::success(&format!("Data saved for {}", serial_no));
    Ok(())
}

pub fn seal(user: Option<&str>, serial_no: &str, note: &str) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    ctx.custody_service.seal(&session, serial_no, note)?;
    output::success(&format!("{} sealed", serial_no));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn edit(
    user: Option<&str>,
    serial_no: &str,
    unit: Option<String>,
    space: Option<String>,
    team: Option<String>,
    subuser: Option<String>,
    premise: Option<String>,
    search_date: Option<NaiveDate>,
    seized_date: Option<NaiveDate>,
    details: Option<String>,
    status: Option<String>,
) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    let record = ctx.custody_service.admin_update(
        &session,
        serial_no,
        AdminUpdate {
            unit,
            unit_space: space,
            team_code: team,
            assigned_subuser: subuser,
            premise_name: premise,
            date_search: search_date,
            date_seized: seized_date,
            data_details: details,
            status: status.as_deref().map(CustodyStatus::parse),
        },
    )?;
    output::success(&format!("Updated {} (status: {})", serial_no, record.status));
    Ok(())
}

pub fn records(
    user: Option<&str>,
    holder: Option<String>,
    status: Option<String>,
    search: Option<String>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    let records = ctx.custody_service.list(
        &session,
        RecordFilter {
            holder,
            status: status.as_deref().map(CustodyStatus::parse),
            search,
            ..Default::default()
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        output::info("No records found");
        return Ok(());
    }
    println!("{}", output::records_table(&records));
    output::info(&format!("Total: {}", records.len()));
    Ok(())
}

pub fn show(user: Option<&str>, serial_no: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    let record = ctx.custody_service.get(&session, serial_no)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.add_row(vec!["Serial", &record.serial_no]);
    table.add_row(vec!["Status", record.status.as_str()]);
    table.add_row(vec!["Unit", record.unit.as_deref().unwrap_or("")]);
    table.add_row(vec!["Space", record.unit_space.as_deref().unwrap_or("")]);
    table.add_row(vec!["Team", record.team_code.as_deref().unwrap_or("")]);
    table.add_row(vec!["Subuser", record.assigned_subuser.as_deref().unwrap_or("")]);
    table.add_row(vec!["Premise", record.premise_name.as_deref().unwrap_or("")]);
    table.add_row(vec![
        "Search date",
        &record
            .date_search
            .map(|d| d.to_string())
            .unwrap_or_default(),
    ]);
    table.add_row(vec![
        "Seized date",
        &record
            .date_seized
            .map(|d| d.to_string())
            .unwrap_or_default(),
    ]);
    println!("{}", table);

    if !record.data_details.is_empty() {
        println!("\nDetail log:{}", record.data_details);
    }
    Ok(())
}
