use super::{Deadline, EntityStore, FamilyCollection, SaveOutcome, SaveReport};
use crate::codec::{Codec, MeasurementCodec};
use crate::config::StoreConfig;
use crate::core::Result;
use crate::domain::{Measurement, MeasurementCatalog, MeasurementType, personal_best};
use crate::memento::MeasurementMemento;
use crate::storage::{DocumentStore, Predicate, StoredDocument};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Measurements hold their subject and cohort as plain keys. The store checks both exist
/// on every write; loads do not expand them.
pub struct MeasurementStore {
    measurements: FamilyCollection<MeasurementCodec>,
}

impl MeasurementStore {
    pub fn new(store: Arc<dyn DocumentStore>, config: &StoreConfig, catalog: Arc<MeasurementCatalog>) -> Self {
        Self {
            measurements: FamilyCollection::new(
                store,
                &config.collections.measurements,
                MeasurementCodec::new(catalog),
                config,
            ),
        }
    }

    pub fn catalog(&self) -> &Arc<MeasurementCatalog> {
        self.measurements.codec().catalog()
    }

    /// Natural key: one result per subject, cohort, type and instant.
    fn natural_key(memento: &MeasurementMemento) -> Predicate {
        Predicate::eq("subjectKey", memento.subject_key.as_str())
            .and(Predicate::eq("cohortKey", memento.cohort_key.as_str()))
            .and(Predicate::eq("measurementType", memento.measurement_type.as_str()))
            .and(Predicate::eq("timestamp", memento.timestamp.as_str()))
    }

    fn hydrate(&self, stored: StoredDocument) -> Result<Measurement> {
        let memento = self.measurements.memento_from(stored)?;
        self.measurements.codec().build(memento)
    }

    pub async fn load_for_subject(&self, subject_key: &str) -> Result<Vec<Measurement>> {
        self.load_where(&Predicate::eq("subjectKey", subject_key))
            .await
    }

    pub async fn load_for_cohort(&self, cohort_key: &str) -> Result<Vec<Measurement>> {
        self.load_where(&Predicate::eq("cohortKey", cohort_key))
            .await
    }

    /// Best stored result of one type for a subject, judged by the catalog trend.
    pub async fn personal_best(
        &self,
        subject_key: &str,
        measurement_type: MeasurementType,
    ) -> Result<Option<Measurement>> {
        let predicate = Predicate::eq("subjectKey", subject_key)
            .and(Predicate::eq("measurementType", measurement_type.as_str()));
        let measurements = self.load_where(&predicate).await?;
        Ok(personal_best(&measurements, measurement_type, self.catalog()).cloned())
    }
}

#[async_trait]
impl EntityStore for MeasurementStore {
    type Entity = Measurement;
    type Codec = MeasurementCodec;

    fn family(&self) -> &'static str {
        self.measurements.family()
    }

    fn codec(&self) -> &MeasurementCodec {
        self.measurements.codec()
    }

    fn default_deadline(&self) -> Deadline {
        self.measurements.default_deadline()
    }

    async fn load_one(&self, key: &str) -> Result<Option<Measurement>> {
        let result: Result<Option<Measurement>> = async {
            match self.measurements.fetch_one(key).await? {
                Some(stored) => Ok(Some(self.hydrate(stored)?)),
                None => Ok(None),
            }
        }
        .await;
        self.measurements.observe("load_one", result)
    }

    async fn load_many(&self, keys: &[String]) -> Result<Vec<Measurement>> {
        let result: Result<Vec<Measurement>> = async {
            self.measurements
                .fetch_many(keys)
                .await?
                .into_iter()
                .map(|stored| self.hydrate(stored))
                .collect()
        }
        .await;
        self.measurements.observe("load_many", result)
    }

    async fn load_where(&self, predicate: &Predicate) -> Result<Vec<Measurement>> {
        let result: Result<Vec<Measurement>> = async {
            self.measurements
                .fetch_where(predicate)
                .await?
                .into_iter()
                .map(|stored| self.hydrate(stored))
                .collect()
        }
        .await;
        self.measurements.observe("load_where", result)
    }

    async fn save_reported(&self, measurement: &Measurement, deadline: Deadline) -> Result<SaveReport<Measurement>> {
        let result: Result<SaveReport<Measurement>> = async {
            let memento = self.measurements.codec().encode(measurement);
            let outcome = self
                .measurements
                .write(&memento, Self::natural_key(&memento), deadline)
                .await?;
            Ok(SaveReport {
                outcome: SaveOutcome::from(&outcome),
                entity: self.hydrate(outcome.into_document())?,
            })
        }
        .await;
        self.measurements.observe("save", result)
    }

    async fn materialize(&self, wire: &Value) -> Result<Measurement> {
        self.measurements.codec().try_create_from(wire)
    }
}
