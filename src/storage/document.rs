use super::constraint::DocumentConstraint;
use super::predicate::{Predicate, lookup_path};
use crate::core::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Stored body of a document. The primary key lives beside it, not inside it.
pub type Document = Map<String, Value>;

/// Path of the logical clock that arbitrates concurrent writes.
pub const SEQUENCE_PATH: &str = "persistenceDetails.sequenceNumber";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub key: String,
    pub document: Document,
}

impl StoredDocument {
    pub fn new(key: impl Into<String>, document: Document) -> Self {
        Self {
            key: key.into(),
            document,
        }
    }

    pub fn sequence_number(&self) -> u64 {
        sequence_of(&self.document)
    }
}

pub fn sequence_of(document: &Document) -> u64 {
    lookup_path(document, SEQUENCE_PATH)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// How a conditional write finds the document it competes with.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// The caller already holds a primary key. A missing document is an error.
    Key(String),
    /// New entity: match on the natural key, insert when nothing matches.
    NaturalKey(Predicate),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalWrite {
    pub selector: Selector,
    pub document: Document,
    /// Natural key the written document must not share with any other document.
    pub unique: Option<Predicate>,
}

impl ConditionalWrite {
    pub fn new(selector: Selector, document: Document) -> Self {
        Self {
            selector,
            document,
            unique: None,
        }
    }

    pub fn unique_on(mut self, natural_key: Predicate) -> Self {
        self.unique = Some(natural_key);
        self
    }

    pub fn incoming_sequence(&self) -> u64 {
        sequence_of(&self.document)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Inserted(StoredDocument),
    Updated(StoredDocument),
    /// The stored sequence number was not older; the store was left untouched.
    Stale(StoredDocument),
}

impl WriteOutcome {
    pub fn document(&self) -> &StoredDocument {
        match self {
            Self::Inserted(doc) | Self::Updated(doc) | Self::Stale(doc) => doc,
        }
    }

    pub fn into_document(self) -> StoredDocument {
        match self {
            Self::Inserted(doc) | Self::Updated(doc) | Self::Stale(doc) => doc,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }
}

/// Collection-scoped document store.
///
/// `conditional_write` is the only write the reconciling adapters use: lookup, sequence
/// comparison and the insert or update happen as one atomic step.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, collection: &str, predicate: &Predicate) -> Result<Option<StoredDocument>>;

    /// Matching documents in insertion order.
    async fn find(&self, collection: &str, predicate: &Predicate) -> Result<Vec<StoredDocument>>;

    async fn insert(&self, collection: &str, document: Document) -> Result<StoredDocument>;

    async fn update(&self, collection: &str, key: &str, document: Document) -> Result<StoredDocument>;

    async fn conditional_write(&self, collection: &str, write: ConditionalWrite) -> Result<WriteOutcome>;

    async fn attach_constraint(
        &self,
        collection: &str,
        constraint: Arc<dyn DocumentConstraint>,
    ) -> Result<()>;

    async fn count(&self, collection: &str) -> Result<usize>;
}
