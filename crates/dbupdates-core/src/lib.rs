pub mod discovery;
pub mod ledger;
pub mod migration;
pub mod sql;
pub mod updater;
pub mod version;

pub use discovery::{MigrationFile, discover};
pub use ledger::{ExecutionLedger, LedgerEntry};
pub use migration::{Migration, MigrationLoader, MigrationRegistry};
pub use sql::{SqlFileLoader, SqlScript};
pub use updater::{RunEvent, Updater, UpdaterBuilder};
pub use version::{UpdateVersion, parse_file_name};
