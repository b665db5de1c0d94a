use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use dbupdates_common::{Error, Result};
use dbupdates_config::{
    DEFAULT_COLLECTION, DEFAULT_EXTENSION, DEFAULT_UPDATE_DIR, UpdaterConfig,
};
use dbupdates_db::DocumentStore;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::discovery::{MigrationFile, discover};
use crate::ledger::ExecutionLedger;
use crate::migration::{Migration, MigrationLoader};

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// An update is about to be executed.
    File(String),
    /// The run finished; carries the newly applied files in order.
    Done(Vec<String>),
    /// The run stopped at the first failure.
    Failed {
        file: Option<String>,
        message: String,
    },
}

/// Terminal state of a single update within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Skipped,
    Recorded,
}

/// Collects and validates everything an [`Updater`] needs.
pub struct UpdaterBuilder<S: DocumentStore + 'static> {
    db: Option<Arc<S>>,
    loader: Option<Arc<dyn MigrationLoader<S>>>,
    update_path: Option<PathBuf>,
    collection: String,
    extensions: Vec<String>,
    progress: Option<UnboundedSender<RunEvent>>,
}

impl<S: DocumentStore + 'static> Default for UpdaterBuilder<S> {
    fn default() -> Self {
        Self {
            db: None,
            loader: None,
            update_path: None,
            collection: DEFAULT_COLLECTION.to_string(),
            extensions: vec![DEFAULT_EXTENSION.to_string()],
            progress: None,
        }
    }
}

impl<S: DocumentStore + 'static> UpdaterBuilder<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from file/env configuration. The database handle and loader
    /// still have to be supplied.
    pub fn from_config(config: &UpdaterConfig) -> Self {
        Self {
            update_path: config.update_path.clone(),
            collection: config.collection.clone(),
            extensions: config.normalized_extensions(),
            ..Self::default()
        }
    }

    pub fn db(mut self, db: Arc<S>) -> Self {
        self.db = Some(db);
        self
    }

    pub fn loader(mut self, loader: impl MigrationLoader<S> + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    pub fn update_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.update_path = Some(path.into());
        self
    }

    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = name.into();
        self
    }

    pub fn extensions<I, T>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn progress(mut self, tx: UnboundedSender<RunEvent>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Validate the configuration. Nothing is read from disk or the
    /// database here.
    pub fn build(self) -> Result<Updater<S>> {
        let db = self
            .db
            .ok_or_else(|| Error::Config("`db` must be provided".into()))?;
        let loader = self
            .loader
            .ok_or_else(|| Error::Config("`loader` must be provided".into()))?;

        let collection = self.collection.trim().to_string();
        if collection.is_empty() {
            return Err(Error::Config("ledger collection name cannot be empty".into()));
        }

        let extensions = UpdaterConfig {
            extensions: self.extensions,
            ..Default::default()
        }
        .normalized_extensions();
        if extensions.is_empty() {
            return Err(Error::Config(
                "at least one script extension must be configured".into(),
            ));
        }

        let update_path = match self.update_path {
            Some(path) => path,
            None => std::env::current_dir()
                .map_err(|e| Error::Config(format!("cannot resolve working directory: {e}")))?
                .join(DEFAULT_UPDATE_DIR),
        };

        Ok(Updater {
            db,
            loader,
            update_path,
            collection,
            extensions,
            progress: self.progress,
        })
    }
}

/// Applies pending update scripts in version order and records each one in
/// the execution ledger.
///
/// Updates run strictly one after another; the first failure stops the run
/// and files applied before it stay recorded.
pub struct Updater<S: DocumentStore + 'static> {
    db: Arc<S>,
    loader: Arc<dyn MigrationLoader<S>>,
    update_path: PathBuf,
    collection: String,
    extensions: Vec<String>,
    progress: Option<UnboundedSender<RunEvent>>,
}

impl<S: DocumentStore + 'static> Updater<S> {
    pub fn builder() -> UpdaterBuilder<S> {
        UpdaterBuilder::new()
    }

    pub fn update_path(&self) -> &Path {
        &self.update_path
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Runnable update files in execution order. An unreadable update
    /// directory is logged and treated as empty.
    pub fn discover(&self) -> Vec<MigrationFile> {
        match discover(&self.update_path, &self.extensions) {
            Ok(files) => {
                debug!(
                    "found {} update file(s) in {}",
                    files.len(),
                    self.update_path.display()
                );
                files
            }
            Err(e) => {
                error!("{e}");
                Vec::new()
            }
        }
    }

    /// Discovered files that have no ledger entry yet.
    pub async fn pending(&self) -> Result<Vec<MigrationFile>> {
        let ledger = self.ledger();
        let mut pending = Vec::new();
        for file in self.discover() {
            if !ledger.exists(&file.id).await? {
                pending.push(file);
            }
        }
        Ok(pending)
    }

    /// Apply every pending update. Returns the files applied by this call,
    /// in the order they ran.
    pub async fn run(&self) -> Result<Vec<String>> {
        let files = self.discover();
        match self.run_files(&files).await {
            Ok(applied) => {
                info!("{} update(s) applied", applied.len());
                self.emit(RunEvent::Done(applied.clone()));
                Ok(applied)
            }
            Err(e) => {
                error!("error running updates: {e}");
                self.emit(RunEvent::Failed {
                    file: e.file().map(str::to_string),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_files(&self, files: &[MigrationFile]) -> Result<Vec<String>> {
        let ledger = self.ledger();
        let mut applied = Vec::new();
        for file in files {
            if self.run_file(&ledger, file).await? == Outcome::Recorded {
                applied.push(file.id.clone());
            }
        }
        Ok(applied)
    }

    async fn run_file(
        &self,
        ledger: &ExecutionLedger<'_, S>,
        file: &MigrationFile,
    ) -> Result<Outcome> {
        if ledger.exists(&file.id).await? {
            debug!("update already applied: {}", file.id);
            return Ok(Outcome::Skipped);
        }

        self.emit(RunEvent::File(file.id.clone()));
        info!("running update: {}", file.id);

        let migration = self.loader.load(file)?;
        if let Err(e) = migration.up(&*self.db).await {
            error!("error running update: {}", file.id);
            return Err(Error::Script {
                file: file.id.clone(),
                message: script_message(e),
            });
        }

        info!("persisting update: {}", file.id);
        if let Err(e) = ledger.record(&file.id, Utc::now()).await {
            error!("error persisting update: {}", file.id);
            return Err(e);
        }

        Ok(Outcome::Recorded)
    }

    fn ledger(&self) -> ExecutionLedger<'_, S> {
        ExecutionLedger::new(&*self.db, &self.collection)
    }

    fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.progress {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(event);
        }
    }
}

/// The message an update reported, without extra wrapping.
fn script_message(err: Error) -> String {
    match err {
        Error::Script { message, .. } | Error::Database(message) | Error::Other(message) => {
            message
        }
        other => other.to_string(),
    }
}
