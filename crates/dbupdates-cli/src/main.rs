mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dbupdates_config::{ConfigLoader, UpdaterConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dbupdates", version, about = "Apply versioned database update scripts")]
struct Cli {
    /// Config file (.yml, .yaml or .toml)
    #[arg(short, long, env = "DBUPDATES_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// SQLite database to update
    #[arg(short, long, env = "DBUPDATES_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Directory containing the update scripts [default: ./updates]
    #[arg(short, long, env = "DBUPDATES_UPDATE_PATH", global = true)]
    update_path: Option<PathBuf>,

    /// Collection recording applied updates
    #[arg(long, env = "DBUPDATES_COLLECTION", global = true)]
    collection: Option<String>,

    /// Comma-separated script extensions
    #[arg(long, value_delimiter = ',', global = true)]
    extensions: Vec<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply all pending updates in version order
    Run,
    /// List pending updates without running them
    Status,
}

impl Cli {
    /// Load the config file (if any) and layer command-line values on top.
    fn resolve_config(&self) -> Result<UpdaterConfig> {
        let mut config = ConfigLoader::load_or_default(self.config.as_deref())?;
        if let Some(database) = &self.database {
            config.database = Some(database.clone());
        }
        if let Some(update_path) = &self.update_path {
            config.update_path = Some(update_path.clone());
        }
        if let Some(collection) = &self.collection {
            config.collection = collection.clone();
        }
        if !self.extensions.is_empty() {
            config.extensions = self.extensions.clone();
        }
        Ok(config)
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = cli.resolve_config()?;
    match cli.command {
        Command::Run => commands::run(&config).await,
        Command::Status => commands::status(&config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbupdates.yml");
        std::fs::write(
            &path,
            "database: from-file.db\ncollection: fileUpdates\nextensions: [sql]\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "dbupdates",
            "--config",
            path.to_str().unwrap(),
            "--database",
            "cli.db",
            "--extensions",
            "sql,ddl",
            "run",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.database, Some(PathBuf::from("cli.db")));
        assert_eq!(config.collection, "fileUpdates");
        assert_eq!(config.extensions, vec!["sql", "ddl"]);
    }

    #[test]
    fn defaults_without_config_file() {
        let cli = Cli::parse_from(["dbupdates", "status", "--database", "x.db"]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.collection, "databaseUpdates");
        assert!(config.update_path.is_none());
        assert!(matches!(cli.command, Command::Status));
    }
}
