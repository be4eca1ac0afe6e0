//! Cross-collection existence checks, attached to the store as document constraints so
//! they fire inside the same atomic step as the write they guard.

use crate::config::CollectionNames;
use crate::core::{CoachError, Result};
use crate::storage::{Document, DocumentConstraint, DocumentStore, KeyLookup, lookup_path};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// A single required key held as text.
    One,
    /// An array of keys; empty is allowed.
    Many,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyConstraint {
    name: String,
    field: String,
    target_collection: String,
    cardinality: Cardinality,
}

impl ForeignKeyConstraint {
    pub fn one(field: impl Into<String>, target_collection: impl Into<String>) -> Self {
        Self::new(field.into(), target_collection.into(), Cardinality::One)
    }

    pub fn many(field: impl Into<String>, target_collection: impl Into<String>) -> Self {
        Self::new(field.into(), target_collection.into(), Cardinality::Many)
    }

    fn new(field: String, target_collection: String, cardinality: Cardinality) -> Self {
        Self {
            name: format!("fk_{field}_{target_collection}"),
            field,
            target_collection,
            cardinality,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn target_collection(&self) -> &str {
        &self.target_collection
    }

    fn violation(&self, key: impl Into<String>) -> CoachError {
        CoachError::ReferentialIntegrity {
            field: self.field.clone(),
            key: key.into(),
        }
    }

    fn referenced_keys<'a>(&self, document: &'a Document) -> Result<Vec<&'a str>> {
        let value = lookup_path(document, &self.field);
        match (self.cardinality, value) {
            (Cardinality::One, Some(Value::String(key))) => Ok(vec![key.as_str()]),
            (Cardinality::One, None | Some(Value::Null)) => Err(self.violation("")),
            (Cardinality::Many, None | Some(Value::Null)) => Ok(Vec::new()),
            (Cardinality::Many, Some(Value::Array(items))) => items
                .iter()
                .map(|item| item.as_str().ok_or_else(|| self.violation(item.to_string())))
                .collect(),
            (_, Some(other)) => Err(self.violation(other.to_string())),
        }
    }
}

impl DocumentConstraint for ForeignKeyConstraint {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, document: &Document, keys: &dyn KeyLookup) -> Result<()> {
        for key in self.referenced_keys(document)? {
            if !keys.contains_key(&self.target_collection, key) {
                return Err(self.violation(key));
            }
        }
        Ok(())
    }
}

/// Attaches every foreign-key check between the four collections.
pub async fn install_referential_integrity(
    store: &dyn DocumentStore,
    names: &CollectionNames,
) -> Result<()> {
    let rules = [
        (&names.businesses, ForeignKeyConstraint::many("administratorIds", &names.people)),
        (&names.businesses, ForeignKeyConstraint::many("memberIds", &names.people)),
        (&names.cohorts, ForeignKeyConstraint::one("businessId", &names.businesses)),
        (&names.measurements, ForeignKeyConstraint::one("subjectKey", &names.people)),
        (&names.measurements, ForeignKeyConstraint::one("cohortKey", &names.cohorts)),
    ];

    for (collection, constraint) in rules {
        debug!(
            collection = collection.as_str(),
            constraint = constraint.name(),
            "attaching foreign key"
        );
        store.attach_constraint(collection, Arc::new(constraint)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Keys(&'static [(&'static str, &'static str)]);

    impl KeyLookup for Keys {
        fn contains_key(&self, collection: &str, key: &str) -> bool {
            self.0.iter().any(|(c, k)| *c == collection && *k == key)
        }
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    const KEYS: Keys = Keys(&[("people", "p-1"), ("people", "p-2"), ("cohorts", "c-1")]);

    #[test]
    fn single_key_must_exist() {
        let subject = ForeignKeyConstraint::one("subjectKey", "people");
        assert!(subject.check(&doc(json!({"subjectKey": "p-1"})), &KEYS).is_ok());

        let err = subject
            .check(&doc(json!({"subjectKey": "ForceRIError"})), &KEYS)
            .unwrap_err();
        assert_eq!(
            err,
            CoachError::ReferentialIntegrity {
                field: "subjectKey".into(),
                key: "ForceRIError".into()
            }
        );
        assert!(subject.check(&doc(json!({})), &KEYS).is_err());
    }

    #[test]
    fn every_listed_key_must_exist() {
        let members = ForeignKeyConstraint::many("memberIds", "people");
        assert!(members.check(&doc(json!({"memberIds": []})), &KEYS).is_ok());
        assert!(members.check(&doc(json!({"memberIds": ["p-1", "p-2"]})), &KEYS).is_ok());

        let err = members
            .check(&doc(json!({"memberIds": ["p-1", "p-9"]})), &KEYS)
            .unwrap_err();
        assert!(matches!(err, CoachError::ReferentialIntegrity { key, .. } if key == "p-9"));
    }

    #[test]
    fn keys_are_looked_up_in_the_target_collection_only() {
        let cohort = ForeignKeyConstraint::one("cohortKey", "cohorts");
        assert!(cohort.check(&doc(json!({"cohortKey": "p-1"})), &KEYS).is_err());
        assert!(cohort.check(&doc(json!({"cohortKey": 7})), &KEYS).is_err());
    }
}
