//! Validating transformers between wire data, mementos and domain objects.
//!
//! - `decode` checks shape and field-level rules (required fields, enum membership) and
//!   fails with a `FormatError`; it never looks at other entities.
//! - `build` constructs the domain object, so domain invariants surface as
//!   `CoachError::DomainInvariant`.
//! - `try_create_from` is the two composed.

mod business;
mod cohort;
mod measurement;
mod person;
pub mod schema;

pub use business::BusinessCodec;
pub use cohort::CohortCodec;
pub use measurement::MeasurementCodec;
pub use person::PersonCodec;
pub use schema::{FieldContract, FieldType, MementoSchema};

use crate::core::{CoachError, FormatError, Result};
use crate::domain::{DEFAULT_SCHEMA_VERSION, ImageUrl, Name, PersistenceDetails, Persona};
use crate::memento::{Memento, PersistenceDetailsMemento, PersonaMemento};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

pub trait Codec: Send + Sync {
    type Entity: Clone + Send + Sync + 'static;
    type Memento: Memento;

    /// Entity family name used in errors and logs.
    fn family(&self) -> &'static str;

    fn schema(&self) -> &MementoSchema;

    fn encode(&self, entity: &Self::Entity) -> Self::Memento;

    fn build(&self, memento: Self::Memento) -> Result<Self::Entity>;

    fn decode(&self, wire: &Value) -> std::result::Result<Self::Memento, FormatError> {
        let violations = self.schema().validate(wire);
        if !violations.is_empty() {
            return Err(FormatError::new(self.family(), violations));
        }
        serde_json::from_value(wire.clone())
            .map_err(|err| FormatError::single(self.family(), err.to_string()))
    }

    fn try_create_from(&self, wire: &Value) -> Result<Self::Entity> {
        let memento = self.decode(wire)?;
        self.build(memento)
    }

    fn to_wire(&self, entity: &Self::Entity) -> Result<Value> {
        Ok(serde_json::to_value(self.encode(entity))?)
    }

    fn encode_many(&self, entities: &[Self::Entity]) -> Vec<Self::Memento> {
        entities.iter().map(|entity| self.encode(entity)).collect()
    }

    /// Decodes an ordered array of mementos. Order is kept and nothing is deduplicated.
    fn decode_many(&self, wire: &Value) -> std::result::Result<Vec<Self::Memento>, FormatError> {
        let Some(items) = wire.as_array() else {
            return Err(FormatError::single(
                self.family(),
                format!("<root>: expected array, got {}", schema::json_type_name(wire)),
            ));
        };

        let mut mementos = Vec::with_capacity(items.len());
        let mut violations = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match self.decode(item) {
                Ok(memento) => mementos.push(memento),
                Err(err) => violations.extend(
                    err.violations
                        .into_iter()
                        .map(|violation| format!("[{index}].{violation}")),
                ),
            }
        }

        if violations.is_empty() {
            Ok(mementos)
        } else {
            Err(FormatError::new(self.family(), violations))
        }
    }

    fn try_create_many(&self, wire: &Value) -> Result<Vec<Self::Entity>> {
        self.decode_many(wire)?
            .into_iter()
            .map(|memento| self.build(memento))
            .collect()
    }
}

pub(crate) fn persistence_schema() -> MementoSchema {
    MementoSchema::object()
        .optional("key", FieldType::Text)
        .optional("schemaVersion", FieldType::Integer)
        .require("sequenceNumber", FieldType::Integer)
}

pub(crate) fn persona_schema() -> MementoSchema {
    MementoSchema::object()
        .require(
            "persistenceDetails",
            FieldType::Object(Box::new(persistence_schema())),
        )
        .require("name", FieldType::Text)
        .require("thumbnailUrl", FieldType::Text)
        .optional("bio", FieldType::Text)
}

pub(crate) fn encode_details(details: &PersistenceDetails) -> PersistenceDetailsMemento {
    PersistenceDetailsMemento {
        key: details.key.clone(),
        schema_version: Some(details.schema_version),
        sequence_number: details.sequence_number,
    }
}

pub(crate) fn build_details(memento: PersistenceDetailsMemento) -> PersistenceDetails {
    PersistenceDetails {
        key: memento.key.filter(|key| !key.is_empty()),
        schema_version: memento.schema_version.unwrap_or(DEFAULT_SCHEMA_VERSION),
        sequence_number: memento.sequence_number,
    }
}

pub(crate) fn encode_persona(persona: &Persona) -> PersonaMemento {
    PersonaMemento {
        persistence_details: encode_details(&persona.persistence_details),
        name: persona.name.as_str().to_string(),
        thumbnail_url: persona.thumbnail_url.as_str().to_string(),
        bio: persona.bio.clone(),
    }
}

pub(crate) fn build_persona(memento: PersonaMemento) -> Result<Persona> {
    Ok(Persona::new(
        build_details(memento.persistence_details),
        Name::new(&memento.name)?,
        ImageUrl::new(&memento.thumbnail_url)?,
        memento.bio,
    ))
}

pub(crate) fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| CoachError::invariant(format!("{field}: '{raw}' is not a timestamp: {err}")))
}
