//! In-memory document store.

use std::{collections::BTreeMap, sync::RwLock};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::store::{
    Document, DocumentStore, DocumentUpdate, StoreError, StoredDocument, WhereClause,
};

type Collection = BTreeMap<String, Document>;

/// A [`DocumentStore`] held in process memory.
///
/// Documents within a collection are returned in id order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<FxHashMap<String, Collection>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if the lock is poisoned.
    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_err| StoreError::Poisoned)?;

        Ok(collections.get(collection).map_or(0, BTreeMap::len))
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_err| StoreError::Poisoned)?;

        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: Document,
    ) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_err| StoreError::Poisoned)?;

        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);

        debug!(collection, id, "set document");

        Ok(())
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        update: DocumentUpdate,
    ) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_err| StoreError::Poisoned)?;

        let document = collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        // Apply to a copy so a failed field leaves the document untouched.
        let mut updated = document.clone();
        update.apply_to(&mut updated)?;
        *document = updated;

        debug!(collection, id, "updated document");

        Ok(())
    }

    async fn query_documents(
        &self,
        collection: &str,
        clauses: Vec<WhereClause>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_err| StoreError::Poisoned)?;

        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(documents
            .iter()
            .filter(|(_, data)| clauses.iter().all(|clause| clause.matches(data)))
            .map(|(id, data)| StoredDocument {
                id: id.clone(),
                data: data.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use testresult::TestResult;

    use super::*;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => Document::new(),
        }
    }

    #[tokio::test]
    async fn set_then_get_returns_document() -> TestResult {
        let store = InMemoryStore::new();

        store
            .set_document("users", "u1", document(json!({ "points": 0 })))
            .await?;

        let doc = store.get_document("users", "u1").await?;

        assert_eq!(doc, Some(document(json!({ "points": 0 }))));
        assert_eq!(store.get_document("users", "u2").await?, None);
        assert_eq!(store.count("users")?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn update_missing_document_is_not_found() {
        let store = InMemoryStore::new();

        let result = store
            .update_document("users", "ghost", DocumentUpdate::new().increment("points", 1))
            .await;

        assert_eq!(
            result,
            Err(StoreError::NotFound {
                collection: "users".to_string(),
                id: "ghost".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn failed_update_leaves_document_unchanged() -> TestResult {
        let store = InMemoryStore::new();

        store
            .set_document("users", "u1", document(json!({ "points": "lots" })))
            .await?;

        let result = store
            .update_document(
                "users",
                "u1",
                DocumentUpdate::new()
                    .set("isMember", true)
                    .increment("points", 1),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(
            store.get_document("users", "u1").await?,
            Some(document(json!({ "points": "lots" })))
        );

        Ok(())
    }

    #[tokio::test]
    async fn query_filters_on_every_clause() -> TestResult {
        let store = InMemoryStore::new();

        store
            .set_document("orders", "o1", document(json!({ "userId": "u1", "status": "paid" })))
            .await?;
        store
            .set_document("orders", "o2", document(json!({ "userId": "u2", "status": "paid" })))
            .await?;
        store
            .set_document("orders", "o3", document(json!({ "userId": "u1", "status": "refunded" })))
            .await?;

        let paid = store
            .query_documents(
                "orders",
                vec![WhereClause::eq("userId", "u1"), WhereClause::eq("status", "paid")],
            )
            .await?;

        assert_eq!(
            paid.iter().map(|doc| doc.id.as_str()).collect::<Vec<_>>(),
            ["o1"]
        );
        assert!(store.query_documents("missing", Vec::new()).await?.is_empty());

        Ok(())
    }
}
