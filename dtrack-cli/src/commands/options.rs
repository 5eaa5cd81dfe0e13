//! Options commands - unit and vendor list management

use anyhow::Result;
use clap::Subcommand;
use dtrack_core::services::OptionKind;

use super::{authenticate, get_context};
use crate::output;

#[derive(Subcommand)]
pub enum OptionCommands {
    /// List option names
    List {
        /// Kind: unit or vendor
        kind: String,
    },
    /// Add an option name (admin)
    Add {
        kind: String,
        name: String,
    },
    /// Remove an option name (admin)
    Remove {
        kind: String,
        name: String,
    },
}

fn parse_kind(kind: &str) -> Result<OptionKind> {
    match kind {
        "unit" => Ok(OptionKind::Unit),
        "vendor" => Ok(OptionKind::Vendor),
        other => anyhow::bail!("Unknown option kind: {} (use unit or vendor)", other),
    }
}

pub fn run(user: Option<&str>, command: OptionCommands) -> Result<()> {
    let ctx = get_context()?;

    match command {
        OptionCommands::List { kind } => {
            let kind = parse_kind(&kind)?;
            for name in ctx.options_service.list(kind)? {
                println!("{}", name);
            }
        }
        OptionCommands::Add { kind, name } => {
            let kind = parse_kind(&kind)?;
            let session = authenticate(&ctx, user)?;
            ctx.options_service.add(&session, kind, &name)?;
            output::success(&format!("Added: {}", name));
        }
        OptionCommands::Remove { kind, name } => {
            let kind = parse_kind(&kind)?;
            let session = authenticate(&ctx, user)?;
            ctx.options_service.remove(&session, kind, &name)?;
            output::success(&format!("Removed: {}", name));
        }
    }
    Ok(())
}
