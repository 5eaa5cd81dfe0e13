//! Disbursement commands - vendor extraction and analyst handoff

use anyhow::Result;
use chrono::NaiveDate;
use dtrack_core::services::{AnalysisRequest, ExtractionRequest};

use super::{authenticate, get_context};
use crate::output;

#[allow(clippy::too_many_arguments)]
pub fn extract(
    user: Option<&str>,
    serial_no: String,
    vendor: String,
    output_serial: String,
    working_copies: Vec<String>,
    start_date: Option<NaiveDate>,
    receive_date: Option<NaiveDate>,
    assign_to: Option<String>,
) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    let record = ctx.disbursement_service.send_to_extraction(
        &session,
        ExtractionRequest {
            serial_no,
            vendor,
            date_extraction_start: start_date,
            date_receiving: receive_date,
            extracted_serial_no: output_serial,
            working_copies,
            assigned_user: assign_to,
        },
    )?;

    let mut msg = format!(
        "{} sent for extraction to {}",
        record.original_serial_no, record.vendor
    );
    if let Some(assignee) = &record.assigned_user {
        msg.push_str(&format!(" (assigned to {})", assignee));
    }
    output::success(&msg);
    Ok(())
}

pub fn analyze(
    user: Option<&str>,
    output_serial: String,
    analyst: String,
    date: Option<NaiveDate>,
    notes: Option<String>,
) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    let record = ctx.disbursement_service.send_to_analysis(
        &session,
        AnalysisRequest {
            extracted_serial_no: output_serial,
            analyst_name: analyst,
            date_disburse: date,
            notes,
        },
    )?;
    output::success(&format!(
        "{} disbursed to {}",
        record.extracted_serial_no, record.analyst_name
    ));
    Ok(())
}

pub fn list(user: Option<&str>, analysis: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    if analysis {
        let records = ctx.disbursement_service.list_analysis(&session)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }
        if records.is_empty() {
            output::info("No analysis records");
            return Ok(());
        }
        let mut table = output::create_table();
        table.set_header(vec!["Output Serial", "Analyst", "Disbursed", "Status"]);
        for r in records {
            table.add_row(vec![
                r.extracted_serial_no,
                r.analyst_name,
                r.date_disburse.map(|d| d.to_string()).unwrap_or_default(),
                r.status.to_string(),
            ]);
        }
        println!("{}", table);
    } else {
        let records = ctx.disbursement_service.list_extractions(&session)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }
        if records.is_empty() {
            output::info("No extraction records");
            return Ok(());
        }
        let mut table = output::create_table();
        table.set_header(vec![
            "Source Serial", "Vendor", "Output Serial", "Working Copies", "Team",
        ]);
        for r in records {
            table.add_row(vec![
                r.original_serial_no,
                r.vendor,
                r.extracted_serial_no,
                r.working_copy_sns.join(", "),
                r.team_code.unwrap_or_default(),
            ]);
        }
        println!("{}", table);
    }
    Ok(())
}
