// ============================================================================
// fitcoach: persistence and reconciliation for a fitness-coaching service
// ============================================================================

pub mod codec;
pub mod config;
pub mod core;
pub mod domain;
pub mod memento;
pub mod persist;
pub mod prelude;
pub mod storage;
pub mod web;

pub use config::{CollectionNames, ReadRetryPolicy, ServerConfig, StoreConfig};
pub use core::{CoachError, FormatError, Result};
pub use persist::{
    BusinessStore, CoachStores, CohortStore, Deadline, EntityStore, MeasurementStore, PersonStore,
    SaveOutcome, SaveReport,
};
pub use storage::{DocumentStore, InMemoryDocumentStore, Predicate};
pub use web::build_router;
