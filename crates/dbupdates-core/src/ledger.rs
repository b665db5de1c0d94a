use chrono::{DateTime, Utc};
use dbupdates_common::{Error, Result};
use dbupdates_db::{Collection, Document, DocumentStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One applied update, as persisted in the ledger collection.
///
/// `file` is the update identifier and `created` is when it was applied.
/// The field names match ledgers written by earlier releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub file: String,
    pub created: DateTime<Utc>,
}

impl LedgerEntry {
    fn into_document(self) -> Result<Document> {
        match serde_json::to_value(self)? {
            Value::Object(document) => Ok(document),
            other => Err(Error::Other(format!(
                "ledger entry serialized to non-object: {other}"
            ))),
        }
    }
}

/// Append-only record of the update files that completed successfully.
///
/// Entries are only ever looked up by file name and inserted; uniqueness
/// relies on checking [`exists`](Self::exists) before [`record`](Self::record).
pub struct ExecutionLedger<'a, S> {
    collection: Collection<'a, S>,
}

impl<'a, S: DocumentStore> ExecutionLedger<'a, S> {
    pub fn new(store: &'a S, collection: &str) -> Self {
        Self {
            collection: store.collection(collection),
        }
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// Whether `file` has already been applied. A failed lookup is reported
    /// as a ledger error for `file`.
    pub async fn exists(&self, file: &str) -> Result<bool> {
        self.collection
            .exists(&file_filter(file))
            .await
            .map_err(|e| Error::Ledger {
                file: file.to_string(),
                message: e.to_string(),
            })
    }

    /// Persist a completed update. Any storage failure is reported as a
    /// persistence error for `file`.
    pub async fn record(&self, file: &str, applied_at: DateTime<Utc>) -> Result<()> {
        let entry = LedgerEntry {
            file: file.to_string(),
            created: applied_at,
        };
        let persistence = |message: String| Error::Persistence {
            file: file.to_string(),
            message,
        };

        let document = entry.into_document().map_err(|e| persistence(e.to_string()))?;
        self.collection
            .insert(document)
            .await
            .map_err(|e| persistence(e.to_string()))
    }
}

fn file_filter(file: &str) -> Document {
    let mut filter = Document::new();
    filter.insert("file".into(), Value::String(file.to_string()));
    filter
}
