use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Ledger collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "databaseUpdates";

/// Directory, relative to the working directory, scanned for update scripts.
pub const DEFAULT_UPDATE_DIR: &str = "updates";

/// Script extension recognized when none is configured.
pub const DEFAULT_EXTENSION: &str = "sql";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// SQLite database the command line runner opens.
    pub database: Option<PathBuf>,
    /// Directory holding the update scripts. `None` means `./updates`.
    pub update_path: Option<PathBuf>,
    /// Collection the execution ledger is written to.
    pub collection: String,
    /// File extensions treated as runnable update scripts.
    pub extensions: Vec<String>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            database: None,
            update_path: None,
            collection: DEFAULT_COLLECTION.to_string(),
            extensions: vec![DEFAULT_EXTENSION.to_string()],
        }
    }
}

impl UpdaterConfig {
    /// Extensions without their leading dot, lowercased, empty entries dropped.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }
}
