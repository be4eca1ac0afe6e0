use super::{BusinessStore, Deadline, EntityStore, FamilyCollection, SaveOutcome, SaveReport};
use crate::codec::{CohortCodec, Codec};
use crate::config::StoreConfig;
use crate::core::{CoachError, Result};
use crate::domain::{Business, Cohort, Persistent};
use crate::memento::CohortMemento;
use crate::storage::{DocumentStore, Predicate, StoredDocument};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Cohorts reference exactly one business through `businessId`.
pub struct CohortStore {
    cohorts: FamilyCollection<CohortCodec>,
    businesses: Arc<BusinessStore>,
}

impl CohortStore {
    pub fn new(store: Arc<dyn DocumentStore>, config: &StoreConfig, businesses: Arc<BusinessStore>) -> Self {
        Self {
            cohorts: FamilyCollection::new(store, &config.collections.cohorts, CohortCodec::new(), config),
            businesses,
        }
    }

    pub fn businesses(&self) -> &Arc<BusinessStore> {
        &self.businesses
    }

    /// Natural key: `(businessId, name, cohortType)`. The memento is flattened by now,
    /// so `businessId` is the stored foreign key, the same field the document carries.
    fn natural_key(memento: &CohortMemento) -> Predicate {
        let business = match &memento.business_id {
            Some(key) => Value::String(key.clone()),
            None => Value::Null,
        };
        Predicate::Eq("businessId".to_string(), business)
            .and(Predicate::eq("name", memento.persona.name.as_str()))
            .and(Predicate::eq("cohortType", memento.cohort_type.as_str()))
    }

    async fn resolve_business(&self, business_id: Option<&str>, known: Option<&Business>) -> Result<Business> {
        let Some(key) = business_id else {
            return Err(CoachError::ReferentialIntegrity {
                field: "businessId".to_string(),
                key: String::new(),
            });
        };
        if let Some(business) = known.filter(|business| business.key() == Some(key)) {
            return Ok(business.clone());
        }
        self.businesses
            .load_one(key)
            .await?
            .ok_or_else(|| CoachError::ReferentialIntegrity {
                field: "businessId".to_string(),
                key: key.to_string(),
            })
    }

    async fn rehydrate(&self, stored: StoredDocument, known: Option<&Business>) -> Result<Cohort> {
        let mut memento = self.cohorts.memento_from(stored)?;
        let business = self
            .resolve_business(memento.business_id.as_deref(), known)
            .await?;
        memento.business = Some(Box::new(self.businesses.codec().encode(&business)));
        self.cohorts.codec().build(memento)
    }

    async fn hydrate_all(&self, stored: Vec<StoredDocument>) -> Result<Vec<Cohort>> {
        let mut cohorts = Vec::with_capacity(stored.len());
        for document in stored {
            cohorts.push(self.rehydrate(document, None).await?);
        }
        Ok(cohorts)
    }

    pub async fn load_for_business(&self, business_key: &str) -> Result<Vec<Cohort>> {
        self.load_where(&Predicate::eq("businessId", business_key))
            .await
    }
}

#[async_trait]
impl EntityStore for CohortStore {
    type Entity = Cohort;
    type Codec = CohortCodec;

    fn family(&self) -> &'static str {
        self.cohorts.family()
    }

    fn codec(&self) -> &CohortCodec {
        self.cohorts.codec()
    }

    fn default_deadline(&self) -> Deadline {
        self.cohorts.default_deadline()
    }

    async fn load_one(&self, key: &str) -> Result<Option<Cohort>> {
        let result: Result<Option<Cohort>> = async {
            match self.cohorts.fetch_one(key).await? {
                Some(stored) => Ok(Some(self.rehydrate(stored, None).await?)),
                None => Ok(None),
            }
        }
        .await;
        self.cohorts.observe("load_one", result)
    }

    async fn load_many(&self, keys: &[String]) -> Result<Vec<Cohort>> {
        let result: Result<Vec<Cohort>> = async {
            let stored = self.cohorts.fetch_many(keys).await?;
            self.hydrate_all(stored).await
        }
        .await;
        self.cohorts.observe("load_many", result)
    }

    async fn load_where(&self, predicate: &Predicate) -> Result<Vec<Cohort>> {
        let result: Result<Vec<Cohort>> = async {
            let stored = self.cohorts.fetch_where(predicate).await?;
            self.hydrate_all(stored).await
        }
        .await;
        self.cohorts.observe("load_where", result)
    }

    async fn save_reported(&self, cohort: &Cohort, deadline: Deadline) -> Result<SaveReport<Cohort>> {
        let result: Result<SaveReport<Cohort>> = async {
            let business = if cohort.business.persistence_details().has_valid_key() {
                cohort.business.clone()
            } else {
                deadline.check(self.family(), "cascade")?;
                self.businesses
                    .save_with_deadline(&cohort.business, deadline)
                    .await?
            };

            let mut resolved = cohort.clone();
            resolved.business = business;
            let mut memento = self.cohorts.codec().encode(&resolved);
            memento.flatten();
            let outcome = self
                .cohorts
                .write(&memento, Self::natural_key(&memento), deadline)
                .await?;

            Ok(SaveReport {
                outcome: SaveOutcome::from(&outcome),
                entity: self
                    .rehydrate(outcome.into_document(), Some(&resolved.business))
                    .await?,
            })
        }
        .await;
        self.cohorts.observe("save", result)
    }

    async fn materialize(&self, wire: &Value) -> Result<Cohort> {
        let result: Result<Cohort> = async {
            let mut memento = self.cohorts.codec().decode(wire)?;
            let business = match wire.get("business").filter(|value| !value.is_null()) {
                Some(expanded) => self.businesses.materialize(expanded).await?,
                None => {
                    self.resolve_business(memento.business_id.as_deref(), None)
                        .await?
                }
            };
            memento.business = Some(Box::new(self.businesses.codec().encode(&business)));
            self.cohorts.codec().build(memento)
        }
        .await;
        self.cohorts.observe("materialize", result)
    }
}
