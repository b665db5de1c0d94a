use std::sync::Arc;

use async_trait::async_trait;
use dbupdates_common::{Error, Result};
use dbupdates_db::SqliteStore;
use tracing::debug;

use crate::discovery::MigrationFile;
use crate::migration::{Migration, MigrationLoader};

/// An update script made of plain SQL statements.
pub struct SqlScript {
    file: String,
    sql: String,
}

impl SqlScript {
    pub fn new(file: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            sql: sql.into(),
        }
    }
}

#[async_trait]
impl Migration<SqliteStore> for SqlScript {
    async fn up(&self, db: &SqliteStore) -> Result<()> {
        if self.sql.trim().is_empty() {
            debug!("update {} has no statements", self.file);
            return Ok(());
        }
        db.execute_batch(&self.sql)
    }
}

/// Loads `.sql` update files from disk as [`SqlScript`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlFileLoader;

impl MigrationLoader<SqliteStore> for SqlFileLoader {
    fn load(&self, file: &MigrationFile) -> Result<Arc<dyn Migration<SqliteStore>>> {
        let sql = std::fs::read_to_string(&file.path).map_err(|e| Error::Loader {
            file: file.id.clone(),
            message: e.to_string(),
        })?;
        Ok(Arc::new(SqlScript::new(file.id.clone(), sql)))
    }
}
