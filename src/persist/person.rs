use super::{Deadline, EntityStore, FamilyCollection, SaveOutcome, SaveReport};
use crate::codec::{Codec, PersonCodec};
use crate::config::StoreConfig;
use crate::core::Result;
use crate::domain::Person;
use crate::memento::PersonMemento;
use crate::storage::{DocumentStore, Predicate, StoredDocument};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// People are leaves of the object graph: nothing to cascade, nothing to resolve.
pub struct PersonStore {
    people: FamilyCollection<PersonCodec>,
}

impl PersonStore {
    pub fn new(store: Arc<dyn DocumentStore>, config: &StoreConfig) -> Self {
        Self {
            people: FamilyCollection::new(store, &config.collections.people, PersonCodec::new(), config),
        }
    }

    /// Natural key: one person per email address.
    fn natural_key(memento: &PersonMemento) -> Predicate {
        Predicate::eq("email", memento.email.as_str())
    }

    fn hydrate(&self, stored: StoredDocument) -> Result<Person> {
        let memento = self.people.memento_from(stored)?;
        self.people.codec().build(memento)
    }

    pub async fn load_by_email(&self, email: &str) -> Result<Option<Person>> {
        let predicate = Predicate::eq("email", email.trim().to_lowercase());
        let result: Result<Option<Person>> = async {
            match self.people.fetch_first(&predicate).await? {
                Some(stored) => Ok(Some(self.hydrate(stored)?)),
                None => Ok(None),
            }
        }
        .await;
        self.people.observe("load_by_email", result)
    }
}

#[async_trait]
impl EntityStore for PersonStore {
    type Entity = Person;
    type Codec = PersonCodec;

    fn family(&self) -> &'static str {
        self.people.family()
    }

    fn codec(&self) -> &PersonCodec {
        self.people.codec()
    }

    fn default_deadline(&self) -> Deadline {
        self.people.default_deadline()
    }

    async fn load_one(&self, key: &str) -> Result<Option<Person>> {
        let result: Result<Option<Person>> = async {
            match self.people.fetch_one(key).await? {
                Some(stored) => Ok(Some(self.hydrate(stored)?)),
                None => Ok(None),
            }
        }
        .await;
        self.people.observe("load_one", result)
    }

    async fn load_many(&self, keys: &[String]) -> Result<Vec<Person>> {
        let result: Result<Vec<Person>> = async {
            self.people
                .fetch_many(keys)
                .await?
                .into_iter()
                .map(|stored| self.hydrate(stored))
                .collect()
        }
        .await;
        self.people.observe("load_many", result)
    }

    async fn load_where(&self, predicate: &Predicate) -> Result<Vec<Person>> {
        let result: Result<Vec<Person>> = async {
            self.people
                .fetch_where(predicate)
                .await?
                .into_iter()
                .map(|stored| self.hydrate(stored))
                .collect()
        }
        .await;
        self.people.observe("load_where", result)
    }

    async fn save_reported(&self, person: &Person, deadline: Deadline) -> Result<SaveReport<Person>> {
        let result: Result<SaveReport<Person>> = async {
            let memento = self.people.codec().encode(person);
            let outcome = self
                .people
                .write(&memento, Self::natural_key(&memento), deadline)
                .await?;
            Ok(SaveReport {
                outcome: SaveOutcome::from(&outcome),
                entity: self.hydrate(outcome.into_document())?,
            })
        }
        .await;
        self.people.observe("save", result)
    }

    async fn materialize(&self, wire: &Value) -> Result<Person> {
        self.people.codec().try_create_from(wire)
    }
}
