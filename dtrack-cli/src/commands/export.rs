//! Export command - bulk dump of the custody table

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;

use super::{authenticate, get_context};
use crate::output;

pub fn run(user: Option<&str>, format: &str, out: Option<PathBuf>) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    let records = ctx.custody_service.export_all(&session)?;

    let rendered = match format {
        "json" => serde_json::to_string_pretty(&records)?,
        "csv" => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record([
                "serial_no", "unit", "unit_space", "team_code", "assigned_subuser",
                "premise_name", "date_search", "date_seized", "data_details",
                "status", "barcode_value", "created_by", "created_on",
            ])?;
            for r in &records {
                writer.write_record([
                    r.serial_no.as_str(),
                    r.unit.as_deref().unwrap_or(""),
                    r.unit_space.as_deref().unwrap_or(""),
                    r.team_code.as_deref().unwrap_or(""),
                    r.assigned_subuser.as_deref().unwrap_or(""),
                    r.premise_name.as_deref().unwrap_or(""),
                    &r.date_search.map(|d| d.to_string()).unwrap_or_default(),
                    &r.date_seized.map(|d| d.to_string()).unwrap_or_default(),
                    r.data_details.as_str(),
                    r.status.as_str(),
                    r.barcode_value.as_deref().unwrap_or(""),
                    r.created_by.as_deref().unwrap_or(""),
                    &r.created_on.to_rfc3339(),
                ])?;
            }
            String::from_utf8(writer.into_inner()?)?
        }
        other => anyhow::bail!("Unknown export format: {} (use csv or json)", other),
    };

    match out {
        Some(path) => {
            let mut file = std::fs::File::create(&path)?;
            file.write_all(rendered.as_bytes())?;
            output::success(&format!("Exported {} records to {:?}", records.len(), path));
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
