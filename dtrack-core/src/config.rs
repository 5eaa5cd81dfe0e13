//! Configuration management
//!
//! One setting matters to the core: where the database lives. It resolves
//! in priority order:
//! 1. `DTRACK_DB_PATH` environment variable (CI/testing override)
//! 2. `dbPath` in `settings.json` inside the dtrack directory
//! 3. `dtrack.duckdb` inside the dtrack directory

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Default filename for the database inside the dtrack directory
const DEFAULT_DB_FILENAME: &str = "dtrack.duckdb";

/// Initial password for the bootstrapped admin account when
/// `DTRACK_ADMIN_PASSWORD` is not set. Meant to be reset on first login.
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    db_path: Option<String>,
}

/// DTRACK configuration (resolved view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Load config from the dtrack directory
    pub fn load(dtrack_dir: &Path) -> Result<Self> {
        let settings_path = dtrack_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let db_path = if let Ok(path) = std::env::var("DTRACK_DB_PATH") {
            PathBuf::from(path)
        } else if let Some(path) = raw.db_path {
            PathBuf::from(path)
        } else {
            dtrack_dir.join(DEFAULT_DB_FILENAME)
        };

        Ok(Self { db_path })
    }

    /// Persist the database path to settings.json
    pub fn save(&self, dtrack_dir: &Path) -> Result<()> {
        let settings_path = dtrack_dir.join("settings.json");
        let settings = SettingsFile {
            db_path: Some(self.db_path.display().to_string()),
        };
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Password for the bootstrapped admin account on a fresh database
    pub fn initial_admin_password() -> String {
        std::env::var("DTRACK_ADMIN_PASSWORD")
            .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string())
    }
}
