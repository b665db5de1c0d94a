use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use dbupdates_common::{Error, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params, params_from_iter};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::store::{Document, DocumentStore};

/// SQLite-backed document store. Documents are stored as JSON text and
/// filtered with `json_extract`, so any collection name can be used without
/// creating tables up front.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening document store at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("document store lock poisoned".into()))
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection
                ON documents(collection);",
        )
        .map_err(|e| Error::Database(format!("store setup failed: {e}")))?;

        Ok(())
    }

    /// Run raw SQL against the underlying connection. Update scripts use this
    /// to create tables, indexes and transform data.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(sql)
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Whether a table or index with the given name exists in the schema.
    pub fn schema_object_exists(&self, name: &str) -> Result<bool> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT count(*) > 0 FROM sqlite_master WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .map_err(|e| Error::Database(format!("failed to inspect schema: {e}")))
    }

    /// Return every document in `collection` matching `filter`, oldest first.
    pub fn find(&self, collection: &str, filter: &Document) -> Result<Vec<Document>> {
        let (clause, values) = filter_clause(collection, filter)?;
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT body FROM documents WHERE {clause} ORDER BY created_at ASC, rowid ASC"
            ))
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))
            .map_err(|e| Error::Database(format!("failed to query documents: {e}")))?;

        let mut documents = Vec::new();
        for row in rows {
            let body =
                row.map_err(|e| Error::Database(format!("failed to read document row: {e}")))?;
            documents.push(serde_json::from_str(&body)?);
        }
        Ok(documents)
    }

    fn count_matching(&self, collection: &str, filter: &Document) -> Result<u64> {
        let (clause, values) = filter_clause(collection, filter)?;
        let conn = self.connection()?;
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM documents WHERE {clause}"),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )
            .map_err(|e| Error::Database(format!("failed to count documents: {e}")))?;
        Ok(count as u64)
    }

    fn insert_document(&self, collection: &str, document: &Document) -> Result<()> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(document)?;
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO documents (id, collection, body) VALUES (?1, ?2, ?3)",
            params![id, collection, body],
        )
        .map_err(|e| Error::Database(format!("failed to insert document: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn count(&self, collection: &str, filter: &Document) -> Result<u64> {
        self.count_matching(collection, filter)
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<()> {
        self.insert_document(collection, &document)
    }
}

/// Build the `WHERE` clause and its bound values for a collection + filter.
fn filter_clause(collection: &str, filter: &Document) -> Result<(String, Vec<SqlValue>)> {
    let mut clause = String::from("collection = ?1");
    let mut values = vec![SqlValue::Text(collection.to_string())];

    for (key, value) in filter {
        if key.is_empty() || key.contains('"') {
            return Err(Error::Database(format!("unsupported filter field: {key:?}")));
        }
        let bound = match value {
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => SqlValue::Real(n.as_f64().unwrap_or_default()),
            },
            Value::Null | Value::Array(_) | Value::Object(_) => {
                return Err(Error::Database(format!(
                    "filter field {key:?} must be a string, number or boolean"
                )));
            }
        };

        let path_idx = values.len() + 1;
        clause.push_str(&format!(
            " AND json_extract(body, ?{path_idx}) = ?{}",
            path_idx + 1
        ));
        values.push(SqlValue::Text(format!("$.\"{key}\"")));
        values.push(bound);
    }

    Ok((clause, values))
}
