//! Setup command - configure the dtrack directory

use std::path::PathBuf;

use anyhow::Result;
use dtrack_core::config::Config;

use super::get_dtrack_dir;
use crate::output;

pub fn run(db_path: Option<PathBuf>) -> Result<()> {
    let dtrack_dir = get_dtrack_dir();
    std::fs::create_dir_all(&dtrack_dir)?;

    let mut config = Config::load(&dtrack_dir)?;
    if let Some(path) = db_path {
        config.db_path = path;
        config.save(&dtrack_dir)?;
        output::success(&format!("Database path set to {:?}", config.db_path));
    } else {
        output::info(&format!("dtrack directory: {:?}", dtrack_dir));
        output::info(&format!("database: {:?}", config.db_path));
    }
    Ok(())
}
