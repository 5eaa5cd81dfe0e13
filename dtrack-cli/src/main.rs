//! DTRACK CLI - digital evidence custody tracking in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{accounts, custody, disburse, export, logs, options, setup};

/// DTRACK - chain-of-custody tracking for seized storage devices
#[derive(Parser)]
#[command(name = "dtrack", version, about, long_about = None)]
struct Cli {
    /// Username to act as (password via DTRACK_PASSWORD or prompt)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new conducting team (admin approval required)
    Register {
        /// Team code / username
        username: String,
    },

    /// Manage accounts (admin) and subusers
    Accounts {
        #[command(subcommand)]
        command: accounts::AccountCommands,
    },

    /// Intake a new device record (admin)
    Intake {
        /// Device serial number
        serial_no: String,
        /// Originating unit (see `options list unit`)
        #[arg(long)]
        unit: Option<String>,
        /// Capacity descriptor, e.g. "2TB SSD"
        #[arg(long)]
        space: Option<String>,
        /// Issue directly to a team
        #[arg(long)]
        assign_to: Option<String>,
    },

    /// Assign an available device to a team (admin)
    Assign {
        serial_no: String,
        team: String,
    },

    /// Hand an issued device to one of your subusers
    AssignSubuser {
        serial_no: String,
        subuser: String,
        /// Instructions recorded in the detail log
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Enter seized-data details (subuser)
    EnterData {
        serial_no: String,
        /// Premise where the device was seized
        #[arg(long)]
        premise: String,
        /// Free-text description of the data
        #[arg(long)]
        details: String,
        /// Date of search (YYYY-MM-DD)
        #[arg(long)]
        search_date: Option<chrono::NaiveDate>,
        /// Date the device was seized (YYYY-MM-DD)
        #[arg(long)]
        seized_date: Option<chrono::NaiveDate>,
    },

    /// Mark a device sealed, ready for vendor handoff
    Seal {
        serial_no: String,
        /// Sealing note recorded in the detail log
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Edit any record field directly, bypassing transition checks (admin)
    Edit {
        serial_no: String,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        space: Option<String>,
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        subuser: Option<String>,
        #[arg(long)]
        premise: Option<String>,
        #[arg(long)]
        search_date: Option<chrono::NaiveDate>,
        #[arg(long)]
        seized_date: Option<chrono::NaiveDate>,
        /// Replace the detail log wholesale
        #[arg(long)]
        details: Option<String>,
        /// Set status directly, e.g. "returned"
        #[arg(long)]
        status: Option<String>,
    },

    /// List custody records visible to you
    Records {
        /// Filter by holder team (admin)
        #[arg(long)]
        holder: Option<String>,
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
        /// Substring search over serial and team
        #[arg(long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one record in full
    Show {
        serial_no: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send a sealed device to an extraction vendor (admin)
    Extract {
        serial_no: String,
        /// Extraction vendor (see `options list vendor`)
        #[arg(long)]
        vendor: String,
        /// Serial of the medium carrying the extracted data
        #[arg(long)]
        output_serial: String,
        /// Comma-separated working-copy serials
        #[arg(long, value_delimiter = ',')]
        working_copies: Vec<String>,
        #[arg(long)]
        start_date: Option<chrono::NaiveDate>,
        #[arg(long)]
        receive_date: Option<chrono::NaiveDate>,
        /// Route the extraction output to a team
        #[arg(long)]
        assign_to: Option<String>,
    },

    /// Disburse extracted data to an analyst (admin)
    Analyze {
        /// Extraction output serial
        output_serial: String,
        #[arg(long)]
        analyst: String,
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// List extraction and analysis records in your scope
    Disbursements {
        /// Show analysis records instead of extractions
        #[arg(long)]
        analysis: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the full custody table (admin)
    Export {
        /// Output format
        #[arg(long, default_value = "csv")]
        format: String,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// View the action log (admin)
    Logs {
        /// Filter by username substring
        #[arg(long)]
        user_filter: Option<String>,
        /// Maximum entries to show
        #[arg(long, default_value = "100")]
        limit: usize,
    },

    /// Manage unit and vendor option lists
    Options {
        #[command(subcommand)]
        command: options::OptionCommands,
    },

    /// Configure the dtrack directory
    Setup {
        /// Database file location
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let user = cli.user;
    match cli.command {
        Commands::Register { username } => accounts::register(&username),
        Commands::Accounts { command } => accounts::run(user.as_deref(), command),
        Commands::Intake { serial_no, unit, space, assign_to } => {
            custody::intake(user.as_deref(), serial_no, unit, space, assign_to)
        }
        Commands::Assign { serial_no, team } => {
            custody::assign(user.as_deref(), &serial_no, &team)
        }
        Commands::AssignSubuser { serial_no, subuser, note } => {
            custody::assign_subuser(user.as_deref(), &serial_no, &subuser, &note)
        }
        Commands::EnterData { serial_no, premise, details, search_date, seized_date } => {
            custody::enter_data(user.as_deref(), &serial_no, premise, details, search_date, seized_date)
        }
        Commands::Seal { serial_no, note } => custody::seal(user.as_deref(), &serial_no, &note),
        Commands::Edit { serial_no, unit, space, team, subuser, premise, search_date,
                         seized_date, details, status } => {
            custody::edit(user.as_deref(), &serial_no, unit, space, team, subuser, premise,
                          search_date, seized_date, details, status)
        }
        Commands::Records { holder, status, search, json } => {
            custody::records(user.as_deref(), holder, status, search, json)
        }
        Commands::Show { serial_no, json } => custody::show(user.as_deref(), &serial_no, json),
        Commands::Extract { serial_no, vendor, output_serial, working_copies,
                            start_date, receive_date, assign_to } => {
            disburse::extract(user.as_deref(), serial_no, vendor, output_serial,
                              working_copies, start_date, receive_date, assign_to)
        }
        Commands::Analyze { output_serial, analyst, date, notes } => {
            disburse::analyze(user.as_deref(), output_serial, analyst, date, notes)
        }
        Commands::Disbursements { analysis, json } => {
            disburse::list(user.as_deref(), analysis, json)
        }
        Commands::Export { format, out } => export::run(user.as_deref(), &format, out),
        Commands::Logs { user_filter, limit } => {
            logs::run(user.as_deref(), user_filter.as_deref(), limit)
        }
        Commands::Options { command } => options::run(user.as_deref(), command),
        Commands::Setup { db_path } => setup::run(db_path),
    }
}
