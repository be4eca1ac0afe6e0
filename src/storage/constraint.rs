use super::document::Document;
use crate::core::Result;
use std::fmt;

/// Read-only view of primary keys, handed to constraints while a write is in flight.
pub trait KeyLookup {
    fn contains_key(&self, collection: &str, key: &str) -> bool;
}

/// Document-level check run synchronously on every insert and update of a collection.
/// An error aborts the write and is returned to the writer unchanged.
pub trait DocumentConstraint: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn check(&self, document: &Document, keys: &dyn KeyLookup) -> Result<()>;
}
