//! Everything an application needs to build entities and save them.

pub use crate::codec::{BusinessCodec, Codec, CohortCodec, MeasurementCodec, PersonCodec};
pub use crate::config::{ReadRetryPolicy, StoreConfig};
pub use crate::core::{CoachError, Result};
pub use crate::domain::{
    Business, Cohort, CohortType, EmailAddress, ImageUrl, LoginContext, Measurement,
    MeasurementCatalog, MeasurementType, Name, PersistenceDetails, Persistent, Person, Persona,
    Quantity, Role, Roles, Unit,
};
pub use crate::persist::{CoachStores, Deadline, EntityStore, SaveOutcome, SaveReport};
pub use crate::storage::{DocumentStore, InMemoryDocumentStore, Predicate};
