pub mod business;
pub mod catalog;
pub mod cohort;
pub mod measurement;
pub mod persistence;
pub mod persona;
pub mod person;
pub mod quantity;
pub mod roles;
pub mod values;

pub use business::Business;
pub use catalog::{MeasurementCatalog, MeasurementSpec, MeasurementType, Trend};
pub use cohort::{Cohort, CohortType};
pub use measurement::{Measurement, personal_best};
pub use persistence::{DEFAULT_SCHEMA_VERSION, PersistenceDetails};
pub use persona::Persona;
pub use person::Person;
pub use quantity::{Dimension, Quantity, Range, Unit};
pub use roles::{Role, Roles};
pub use values::{EmailAddress, ImageUrl, LoginContext, Name};

/// Anything carrying a storage envelope.
pub trait Persistent {
    fn persistence_details(&self) -> &PersistenceDetails;

    fn key(&self) -> Option<&str> {
        self.persistence_details().valid_key()
    }
}

impl Persistent for Person {
    fn persistence_details(&self) -> &PersistenceDetails {
        &self.persona.persistence_details
    }
}

impl Persistent for Business {
    fn persistence_details(&self) -> &PersistenceDetails {
        &self.persona.persistence_details
    }
}

impl Persistent for Cohort {
    fn persistence_details(&self) -> &PersistenceDetails {
        &self.persona.persistence_details
    }
}

impl Persistent for Measurement {
    fn persistence_details(&self) -> &PersistenceDetails {
        &self.persistence_details
    }
}
