use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dbupdates_common::{Error, Result};

use crate::discovery::MigrationFile;

/// A single irreversible update applied to a database handle of type `D`.
///
/// The update performs its own work against `db` (creating indexes,
/// rewriting documents, ...) and reports success or failure. A failure's
/// message is surfaced to the caller unchanged.
#[async_trait]
pub trait Migration<D: Sync>: Send + Sync {
    async fn up(&self, db: &D) -> Result<()>;
}

/// Supplies the executable unit for a discovered update file.
pub trait MigrationLoader<D: Sync>: Send + Sync {
    fn load(&self, file: &MigrationFile) -> Result<Arc<dyn Migration<D>>>;
}

/// In-code registry mapping update file names to their implementation.
///
/// Discovery still decides which files run and in what order; the registry
/// only provides the code behind each file name.
pub struct MigrationRegistry<D: Sync> {
    migrations: HashMap<String, Arc<dyn Migration<D>>>,
}

impl<D: Sync> MigrationRegistry<D> {
    pub fn new() -> Self {
        Self {
            migrations: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        file: impl Into<String>,
        migration: impl Migration<D> + 'static,
    ) -> &mut Self {
        self.migrations.insert(file.into(), Arc::new(migration));
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, file: impl Into<String>, migration: impl Migration<D> + 'static) -> Self {
        self.register(file, migration);
        self
    }

    pub fn contains(&self, file: &str) -> bool {
        self.migrations.contains_key(file)
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl<D: Sync> Default for MigrationRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Sync> MigrationLoader<D> for MigrationRegistry<D> {
    fn load(&self, file: &MigrationFile) -> Result<Arc<dyn Migration<D>>> {
        self.migrations
            .get(&file.id)
            .cloned()
            .ok_or_else(|| Error::Loader {
                file: file.id.clone(),
                message: "no migration registered for this file".into(),
            })
    }
}
