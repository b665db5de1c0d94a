use async_trait::async_trait;
use dbupdates_common::Result;

/// A schemaless document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// The database handle an update run operates against.
///
/// Connections are owned by the caller; implementations only need to answer
/// existence queries and append documents to named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Count documents in `collection` whose top-level fields equal every
    /// entry of `filter`. An empty filter counts the whole collection.
    async fn count(&self, collection: &str, filter: &Document) -> Result<u64>;

    async fn insert(&self, collection: &str, document: Document) -> Result<()>;

    /// Look up a collection handle by name.
    fn collection(&self, name: &str) -> Collection<'_, Self>
    where
        Self: Sized,
    {
        Collection {
            store: self,
            name: name.to_string(),
        }
    }
}

/// A named collection borrowed from a [`DocumentStore`].
pub struct Collection<'a, S> {
    store: &'a S,
    name: String,
}

impl<S: DocumentStore> Collection<'_, S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn count(&self, filter: &Document) -> Result<u64> {
        self.store.count(&self.name, filter).await
    }

    pub async fn exists(&self, filter: &Document) -> Result<bool> {
        Ok(self.count(filter).await? != 0)
    }

    pub async fn insert(&self, document: Document) -> Result<()> {
        self.store.insert(&self.name, document).await
    }
}
