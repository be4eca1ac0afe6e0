//! Document-store collaborator: the interface the reconciling adapters write through,
//! and an in-memory engine implementing it.

pub mod constraint;
pub mod document;
pub mod memory;
pub mod predicate;

pub use constraint::{DocumentConstraint, KeyLookup};
pub use document::{
    ConditionalWrite, Document, DocumentStore, SEQUENCE_PATH, Selector, StoredDocument, WriteOutcome,
    sequence_of,
};
pub use memory::InMemoryDocumentStore;
pub use predicate::{Predicate, lookup_path};
