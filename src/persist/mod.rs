//! Reconciling store adapters, one per entity family.
//!
//! Saving an entity cascades unsaved references first, flattens the object graph into
//! foreign keys, reconciles against the store with one conditional write and rehydrates
//! the result. Loading resolves foreign keys back into objects through the owning family.

mod business;
mod cohort;
mod collection;
pub mod integrity;
mod measurement;
mod person;

pub use business::BusinessStore;
pub use cohort::CohortStore;
pub use collection::FamilyCollection;
pub use integrity::{Cardinality, ForeignKeyConstraint, install_referential_integrity};
pub use measurement::MeasurementStore;
pub use person::PersonStore;

use crate::codec::Codec;
use crate::config::StoreConfig;
use crate::core::{CoachError, Result};
use crate::domain::MeasurementCatalog;
use crate::storage::{DocumentStore, InMemoryDocumentStore, Predicate, WriteOutcome};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Point in time after which a save stops cascading.
///
/// Checked before every child save and before the parent write. Expiry stops the save with
/// `Cancelled`; children stored before that point stay stored and are not reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    pub fn after(timeout: Duration) -> Self {
        Self::at(Instant::now() + timeout)
    }

    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map(Self::after).unwrap_or_default()
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|instant| Instant::now() >= instant)
    }

    pub fn check(&self, family: &str, operation: &str) -> Result<()> {
        if self.is_expired() {
            return Err(CoachError::Cancelled(format!(
                "{family} {operation} passed its deadline"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Updated,
    /// The store already held a version at least as new; it was returned unchanged.
    Stale,
}

impl From<&WriteOutcome> for SaveOutcome {
    fn from(outcome: &WriteOutcome) -> Self {
        match outcome {
            WriteOutcome::Inserted(_) => Self::Inserted,
            WriteOutcome::Updated(_) => Self::Updated,
            WriteOutcome::Stale(_) => Self::Stale,
        }
    }
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
            Self::Stale => "stale",
        };
        f.write_str(name)
    }
}

/// What a save stored, and how it got there.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport<E> {
    pub entity: E,
    pub outcome: SaveOutcome,
}

/// Load and save operations of one entity family.
///
/// `Ok(None)` from a load means not found; any failure is an `Err`.
#[async_trait]
pub trait EntityStore: Send + Sync {
    type Entity: Clone + Send + Sync + 'static;
    type Codec: Codec<Entity = Self::Entity>;

    fn family(&self) -> &'static str;

    fn codec(&self) -> &Self::Codec;

    fn default_deadline(&self) -> Deadline;

    async fn load_one(&self, key: &str) -> Result<Option<Self::Entity>>;

    /// Entities for the given keys in request order; unknown keys are left out.
    async fn load_many(&self, keys: &[String]) -> Result<Vec<Self::Entity>>;

    async fn load_where(&self, predicate: &Predicate) -> Result<Vec<Self::Entity>>;

    async fn save_reported(&self, entity: &Self::Entity, deadline: Deadline) -> Result<SaveReport<Self::Entity>>;

    /// Builds an entity from wire data, resolving foreign keys that arrive without their
    /// expanded objects.
    async fn materialize(&self, wire: &Value) -> Result<Self::Entity>;

    async fn save(&self, entity: &Self::Entity) -> Result<Self::Entity> {
        self.save_with_deadline(entity, self.default_deadline()).await
    }

    async fn save_with_deadline(&self, entity: &Self::Entity, deadline: Deadline) -> Result<Self::Entity> {
        Ok(self.save_reported(entity, deadline).await?.entity)
    }
}

/// All four family stores over one document store, with integrity checks installed.
#[derive(Clone)]
pub struct CoachStores {
    pub people: Arc<PersonStore>,
    pub businesses: Arc<BusinessStore>,
    pub cohorts: Arc<CohortStore>,
    pub measurements: Arc<MeasurementStore>,
    store: Arc<dyn DocumentStore>,
    catalog: Arc<MeasurementCatalog>,
}

impl CoachStores {
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        config: StoreConfig,
        catalog: Arc<MeasurementCatalog>,
    ) -> Result<Self> {
        install_referential_integrity(store.as_ref(), &config.collections).await?;

        let people = Arc::new(PersonStore::new(store.clone(), &config));
        let businesses = Arc::new(BusinessStore::new(store.clone(), &config, people.clone()));
        let cohorts = Arc::new(CohortStore::new(store.clone(), &config, businesses.clone()));
        let measurements = Arc::new(MeasurementStore::new(store.clone(), &config, catalog.clone()));

        Ok(Self {
            people,
            businesses,
            cohorts,
            measurements,
            store,
            catalog,
        })
    }

    pub async fn in_memory() -> Result<Self> {
        Self::open(
            Arc::new(InMemoryDocumentStore::new()),
            StoreConfig::default(),
            Arc::new(MeasurementCatalog::standard()),
        )
        .await
    }

    pub fn catalog(&self) -> &Arc<MeasurementCatalog> {
        &self.catalog
    }

    pub fn document_store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

impl fmt::Debug for CoachStores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoachStores")
            .field("catalog_entries", &self.catalog.len())
            .finish_non_exhaustive()
    }
}
