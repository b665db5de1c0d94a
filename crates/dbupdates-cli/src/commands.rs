use std::sync::Arc;

use anyhow::{Context, Result};
use dbupdates_config::UpdaterConfig;
use dbupdates_core::{RunEvent, SqlFileLoader, Updater, UpdaterBuilder};
use dbupdates_db::SqliteStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Apply pending updates and print each one as it starts.
pub async fn run(config: &UpdaterConfig) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let updater = updater(config, Some(tx))?;

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let RunEvent::File(file) = event {
                println!("  applying {file}");
            }
        }
    });

    let result = updater.run().await;
    // Dropping the updater closes the channel so the printer can finish.
    drop(updater);
    join_printer(printer).await;

    let applied = result.context("update run failed")?;
    if applied.is_empty() {
        println!("No pending updates.");
    } else {
        println!("{} update(s) applied.", applied.len());
    }
    Ok(())
}

/// Print the updates that would run next, in order.
pub async fn status(config: &UpdaterConfig) -> Result<()> {
    let updater = updater(config, None)?;
    let pending = updater
        .pending()
        .await
        .context("failed to read update ledger")?;

    println!("Update path: {}", updater.update_path().display());
    if pending.is_empty() {
        println!("No pending updates.");
        return Ok(());
    }

    println!("Pending updates:");
    for file in &pending {
        println!("  {} ({})", file.id, file.version);
    }
    Ok(())
}

/// Wait for the progress printer. Its failure never changes the run result.
async fn join_printer(printer: JoinHandle<()>) {
    if let Err(e) = printer.await {
        warn!("progress printer task failed: {e}");
    }
}

fn updater(
    config: &UpdaterConfig,
    progress: Option<mpsc::UnboundedSender<RunEvent>>,
) -> Result<Updater<SqliteStore>> {
    let db_path = config
        .database
        .as_deref()
        .context("no database configured (use --database or DBUPDATES_DATABASE)")?;
    let store = SqliteStore::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    let mut builder = UpdaterBuilder::from_config(config)
        .db(Arc::new(store))
        .loader(SqlFileLoader);
    if let Some(tx) = progress {
        builder = builder.progress(tx);
    }
    Ok(builder.build()?)
}
