//! CLI command implementations

pub mod accounts;
pub mod custody;
pub mod disburse;
pub mod export;
pub mod logs;
pub mod options;
pub mod setup;

use std::path::PathBuf;

use anyhow::{Context, Result};
use dtrack_core::{DtrackContext, Session};

/// Get the dtrack directory from environment or default
pub fn get_dtrack_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DTRACK_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".dtrack")
    }
}

/// Get or create the dtrack context
pub fn get_context() -> Result<DtrackContext> {
    let dtrack_dir = get_dtrack_dir();

    std::fs::create_dir_all(&dtrack_dir)
        .with_context(|| format!("Failed to create dtrack directory: {:?}", dtrack_dir))?;

    DtrackContext::new(&dtrack_dir).context("Failed to initialize dtrack context")
}

/// Authenticate the acting user and return a session.
///
/// The username comes from `--user` or `DTRACK_USER`; the password from
/// `DTRACK_PASSWORD` or an interactive prompt.
pub fn authenticate(ctx: &DtrackContext, user: Option<&str>) -> Result<Session> {
    let username = match user {
        Some(u) => u.to_string(),
        None => std::env::var("DTRACK_USER")
            .context("No acting user: pass --user or set DTRACK_USER")?,
    };

    let password = match std::env::var("DTRACK_PASSWORD") {
        Ok(p) => p,
        Err(_) => dialoguer::Password::new()
            .with_prompt(format!("Password for {}", username))
            .interact()?,
    };

    let session = ctx.auth_service.login(&username, &password)?;
    Ok(session)
}
