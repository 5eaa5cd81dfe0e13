//! Account commands - registration, approval, subusers, passwords

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dtrack_core::Role;

use super::{authenticate, get_context};
use crate::output;

#[derive(Subcommand)]
pub enum AccountCommands {
    /// List all accounts (admin)
    List,

    /// Create an approved user or admin account (admin)
    Create {
        username: String,
        /// Role: user or admin
        #[arg(long, default_value = "user")]
        role: String,
    },

    /// Create a subuser under your team (or --parent as admin)
    CreateSubuser {
        username: String,
        /// Parent team (admin only; defaults to your own team)
        #[arg(long)]
        parent: Option<String>,
    },

    /// Approve a pending registration (admin)
    Approve { username: String },

    /// Revoke approval (admin)
    Disapprove { username: String },

    /// Reset a password, refreshing its 90-day expiry (admin)
    ResetPassword { username: String },

    /// List your subusers with their assignment state
    Subusers {
        /// Parent team (admin only)
        #[arg(long)]
        parent: Option<String>,
    },

    /// List approved teams with their custody state (admin)
    Holders,
}

/// Self-service team registration. No session required.
pub fn register(username: &str) -> Result<()> {
    let ctx = get_context()?;

    let password = dialoguer::Password::new()
        .with_prompt("Password")
        .interact()?;
    let confirm = dialoguer::Password::new()
        .with_prompt("Confirm password")
        .interact()?;

    ctx.auth_service.register(username, &password, &confirm)?;
    output::success(&format!(
        "Registered {}. Await admin approval to login.",
        username
    ));
    Ok(())
}

pub fn run(user: Option<&str>, command: AccountCommands) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate(&ctx, user)?;

    match command {
        AccountCommands::List => {
            let accounts = ctx.account_service.list_accounts(&session)?;
            let mut table = output::create_table();
            table.set_header(vec!["Username", "Role", "Approved", "Valid Till", "Parent"]);
            for a in accounts {
                table.add_row(vec![
                    a.username,
                    a.role.to_string(),
                    if a.approved { "yes".to_string() } else { "no".to_string() },
                    a.valid_till.map(|t| t.to_rfc3339()).unwrap_or_default(),
                    a.parent_user.unwrap_or_default(),
                ]);
            }
            println!("{}", table);
        }

        AccountCommands::Create { username, role } => {
            let role = Role::parse(&role)
                .ok_or_else(|| anyhow::anyhow!("Unknown role: {}", role))?;
            let password = dialoguer::Password::new()
                .with_prompt(format!("Password for {}", username))
                .interact()?;
            ctx.account_service
                .create_account(&session, &username, &password, role)?;
            output::success(&format!("Created {} ({})", username, role));
        }

        AccountCommands::CreateSubuser { username, parent } => {
            let password = dialoguer::Password::new()
                .with_prompt(format!("Password for {}", username))
                .interact()?;
            let account = ctx.account_service.create_subuser(
                &session,
                &username,
                &password,
                parent.as_deref(),
            )?;
            let expires = account
                .valid_till
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            output::success(&format!("Created subuser {} (expires {})", username, expires));
        }

        AccountCommands::Approve { username } => {
            ctx.account_service.set_approval(&session, &username, true)?;
            output::success(&format!("Approved {}", username));
        }

        AccountCommands::Disapprove { username } => {
            ctx.account_service.set_approval(&session, &username, false)?;
            output::warning(&format!("Disapproved {}", username));
        }

        AccountCommands::ResetPassword { username } => {
            let password = dialoguer::Password::new()
                .with_prompt(format!("New password for {}", username))
                .interact()?;
            ctx.account_service
                .reset_password(&session, &username, &password)?;
            output::success(&format!("Password reset for {}", username));
        }

        AccountCommands::Subusers { parent } => {
            let subusers = ctx.account_service.subuser_status(&session, parent.as_deref())?;
            print_holder_table(&subusers, "Subuser");
        }

        AccountCommands::Holders => {
            let holders = ctx.account_service.holder_status(&session)?;
            print_holder_table(&holders, "Team");
        }
    }
    Ok(())
}

fn print_holder_table(rows: &[dtrack_core::services::HolderStatus], label: &str) {
    let mut table = output::create_table();
    table.set_header(vec![label, "Custody"]);
    for h in rows {
        let state = if h.has_active_custody {
            "has device".red().to_string()
        } else {
            "free".green().to_string()
        };
        table.add_row(vec![h.username.clone(), state]);
    }
    println!("{}", table);
}
