//! Document Store
//!
//! The seam to the hosted document database. Services only talk to the backend
//! through [`DocumentStore`], so any backend (or the in-memory store) can sit behind it.

use async_trait::async_trait;
use mockall::automock;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use thiserror::Error;

pub mod memory;

pub use memory::InMemoryStore;

/// A stored document.
pub type Document = Map<String, Value>;

/// Document store errors.
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    /// The document does not exist.
    #[error("document {collection}/{id} not found")]
    NotFound {
        /// Collection name
        collection: String,
        /// Document id
        id: String,
    },

    /// An increment targeted a field that is not an integer.
    #[error("field {0} is not an integer")]
    NotNumeric(String),

    /// An increment overflowed.
    #[error("increment of field {0} overflowed")]
    Overflow(String),

    /// The in-memory store lock was poisoned.
    #[error("store lock poisoned")]
    Poisoned,

    /// Error reported by the backend.
    #[error("backend error: {0}")]
    Backend(String),
}

/// A change to a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Replace the field value.
    Set(Value),

    /// Add to an integer field, treating a missing field as zero.
    Increment(i64),
}

/// A partial update applied to an existing document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentUpdate {
    fields: SmallVec<[(String, FieldUpdate); 4]>,
}

impl DocumentUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .push((field.into(), FieldUpdate::Set(value.into())));
        self
    }

    /// Increment an integer field.
    #[must_use]
    pub fn increment(mut self, field: impl Into<String>, delta: i64) -> Self {
        self.fields
            .push((field.into(), FieldUpdate::Increment(delta)));
        self
    }

    /// Field changes in the order they were added.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldUpdate)> {
        self.fields
            .iter()
            .map(|(field, update)| (field.as_str(), update))
    }

    /// Apply this update to a document in place.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotNumeric`]: an increment targets a non-integer field.
    /// - [`StoreError::Overflow`]: an increment overflows.
    pub fn apply_to(&self, document: &mut Document) -> Result<(), StoreError> {
        for (field, update) in self.fields() {
            let value = match update {
                FieldUpdate::Set(value) => value.clone(),
                FieldUpdate::Increment(delta) => {
                    let current = match document.get(field) {
                        None | Some(Value::Null) => 0,
                        Some(value) => value
                            .as_i64()
                            .ok_or_else(|| StoreError::NotNumeric(field.to_string()))?,
                    };

                    let next = current
                        .checked_add(*delta)
                        .ok_or_else(|| StoreError::Overflow(field.to_string()))?;

                    Value::from(next)
                }
            };

            document.insert(field.to_string(), value);
        }

        Ok(())
    }
}

/// Equality filter used by queries.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    field: String,
    value: Value,
}

impl WhereClause {
    /// Match documents whose `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether `document` satisfies this clause.
    pub fn matches(&self, document: &Document) -> bool {
        document.get(&self.field) == Some(&self.value)
    }
}

/// A document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Document id
    pub id: String,

    /// Document contents
    pub data: Document,
}

/// Access to the hosted document database.
#[automock]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document, returning `None` if it does not exist.
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Create or replace a document.
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: Document,
    ) -> Result<(), StoreError>;

    /// Apply a partial update to an existing document.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        update: DocumentUpdate,
    ) -> Result<(), StoreError>;

    /// Documents in a collection matching every clause.
    async fn query_documents(
        &self,
        collection: &str,
        clauses: Vec<WhereClause>,
    ) -> Result<Vec<StoredDocument>, StoreError>;
}
