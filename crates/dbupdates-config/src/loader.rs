use std::path::Path;

use dbupdates_common::{Error, Result};
use tracing::{debug, info};

use crate::model::UpdaterConfig;

/// Reads [`UpdaterConfig`] from YAML or TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a config file. The format is picked from the extension.
    pub fn load(path: &Path) -> Result<UpdaterConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = Self::parse(&contents, ext)?;
        info!("config loaded from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<UpdaterConfig> {
        match path {
            Some(path) => Self::load(path),
            None => {
                debug!("no config file given, using defaults");
                Ok(UpdaterConfig::default())
            }
        }
    }

    fn parse(contents: &str, ext: &str) -> Result<UpdaterConfig> {
        match ext {
            "yml" | "yaml" => serde_yaml::from_str(contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}"))),
            "toml" => {
                toml::from_str(contents).map_err(|e| Error::Config(format!("TOML parse error: {e}")))
            }
            other => Err(Error::Config(format!(
                "unsupported config extension: {other}"
            ))),
        }
    }
}
