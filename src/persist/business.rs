use super::{Deadline, EntityStore, FamilyCollection, PersonStore, SaveOutcome, SaveReport};
use crate::codec::{BusinessCodec, Codec};
use crate::config::StoreConfig;
use crate::core::{CoachError, Result};
use crate::domain::{Business, Persistent, Person};
use crate::memento::BusinessMemento;
use crate::storage::{DocumentStore, Predicate, StoredDocument};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Businesses reference people as administrators and members.
pub struct BusinessStore {
    businesses: FamilyCollection<BusinessCodec>,
    people: Arc<PersonStore>,
}

type KnownPeople = HashMap<String, Person>;

impl BusinessStore {
    pub fn new(store: Arc<dyn DocumentStore>, config: &StoreConfig, people: Arc<PersonStore>) -> Self {
        Self {
            businesses: FamilyCollection::new(
                store,
                &config.collections.businesses,
                BusinessCodec::new(),
                config,
            ),
            people,
        }
    }

    pub fn people(&self) -> &Arc<PersonStore> {
        &self.people
    }

    /// Natural key: business names are unique.
    fn natural_key(memento: &BusinessMemento) -> Predicate {
        Predicate::eq("name", memento.persona.name.as_str())
    }

    fn index_people<'a>(people: impl IntoIterator<Item = &'a Person>) -> KnownPeople {
        people
            .into_iter()
            .filter_map(|person| person.key().map(|key| (key.to_string(), person.clone())))
            .collect()
    }

    /// Resolves `ids` in order, preferring `known` people and fetching the rest.
    async fn resolve_people(&self, field: &str, ids: &[String], known: &KnownPeople) -> Result<Vec<Person>> {
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !known.contains_key(id.as_str()))
            .cloned()
            .collect();
        let fetched = if missing.is_empty() {
            KnownPeople::new()
        } else {
            Self::index_people(&self.people.load_many(&missing).await?)
        };

        ids.iter()
            .map(|id| {
                known
                    .get(id)
                    .or_else(|| fetched.get(id))
                    .cloned()
                    .ok_or_else(|| CoachError::ReferentialIntegrity {
                        field: field.to_string(),
                        key: id.clone(),
                    })
            })
            .collect()
    }

    /// Fills the expanded people of a memento that only carries foreign keys.
    async fn expand(&self, memento: &mut BusinessMemento, known: &KnownPeople) -> Result<()> {
        let codec = self.people.codec();
        if memento.administrators.is_empty() {
            let administrators = self
                .resolve_people("administratorIds", &memento.administrator_ids, known)
                .await?;
            memento.administrators = codec.encode_many(&administrators);
        }
        if memento.members.is_empty() {
            let members = self
                .resolve_people("memberIds", &memento.member_ids, known)
                .await?;
            memento.members = codec.encode_many(&members);
        }
        Ok(())
    }

    async fn rehydrate(&self, stored: StoredDocument, known: &KnownPeople) -> Result<Business> {
        let mut memento = self.businesses.memento_from(stored)?;
        self.expand(&mut memento, known).await?;
        self.businesses.codec().build(memento)
    }

    async fn save_reference(&self, person: &Person, deadline: Deadline) -> Result<Person> {
        if person.persistence_details().has_valid_key() {
            return Ok(person.clone());
        }
        deadline.check(self.family(), "cascade")?;
        self.people.save_with_deadline(person, deadline).await
    }

    /// Saves every unkeyed administrator and member, in order, before the business itself.
    async fn cascade(&self, business: &Business, deadline: Deadline) -> Result<Business> {
        let mut administrators = Vec::with_capacity(business.administrators().len());
        for person in business.administrators() {
            administrators.push(self.save_reference(person, deadline).await?);
        }
        let mut members = Vec::with_capacity(business.members().len());
        for person in business.members() {
            members.push(self.save_reference(person, deadline).await?);
        }

        let mut resolved = business.clone();
        resolved.replace_people(administrators, members);
        Ok(resolved)
    }

    async fn hydrate_all(&self, stored: Vec<StoredDocument>) -> Result<Vec<Business>> {
        let mut businesses = Vec::with_capacity(stored.len());
        for document in stored {
            businesses.push(self.rehydrate(document, &KnownPeople::new()).await?);
        }
        Ok(businesses)
    }

    pub async fn load_by_name(&self, name: &str) -> Result<Option<Business>> {
        let predicate = Predicate::eq("name", name.trim());
        let result: Result<Option<Business>> = async {
            match self.businesses.fetch_first(&predicate).await? {
                Some(stored) => Ok(Some(self.rehydrate(stored, &KnownPeople::new()).await?)),
                None => Ok(None),
            }
        }
        .await;
        self.businesses.observe("load_by_name", result)
    }

    /// Businesses the given person administers.
    pub async fn load_administered_by(&self, person_key: &str) -> Result<Vec<Business>> {
        self.load_where(&Predicate::contains("administratorIds", person_key))
            .await
    }
}

#[async_trait]
impl EntityStore for BusinessStore {
    type Entity = Business;
    type Codec = BusinessCodec;

    fn family(&self) -> &'static str {
        self.businesses.family()
    }

    fn codec(&self) -> &BusinessCodec {
        self.businesses.codec()
    }

    fn default_deadline(&self) -> Deadline {
        self.businesses.default_deadline()
    }

    async fn load_one(&self, key: &str) -> Result<Option<Business>> {
        let result: Result<Option<Business>> = async {
            match self.businesses.fetch_one(key).await? {
                Some(stored) => Ok(Some(self.rehydrate(stored, &KnownPeople::new()).await?)),
                None => Ok(None),
            }
        }
        .await;
        self.businesses.observe("load_one", result)
    }

    async fn load_many(&self, keys: &[String]) -> Result<Vec<Business>> {
        let result: Result<Vec<Business>> = async {
            let stored = self.businesses.fetch_many(keys).await?;
            self.hydrate_all(stored).await
        }
        .await;
        self.businesses.observe("load_many", result)
    }

    async fn load_where(&self, predicate: &Predicate) -> Result<Vec<Business>> {
        let result: Result<Vec<Business>> = async {
            let stored = self.businesses.fetch_where(predicate).await?;
            self.hydrate_all(stored).await
        }
        .await;
        self.businesses.observe("load_where", result)
    }

    async fn save_reported(&self, business: &Business, deadline: Deadline) -> Result<SaveReport<Business>> {
        let result: Result<SaveReport<Business>> = async {
            let resolved = self.cascade(business, deadline).await?;

            let mut memento = self.businesses.codec().encode(&resolved);
            memento.flatten();
            let outcome = self
                .businesses
                .write(&memento, Self::natural_key(&memento), deadline)
                .await?;

            let known = Self::index_people(resolved.administrators().iter().chain(resolved.members()));
            Ok(SaveReport {
                outcome: SaveOutcome::from(&outcome),
                entity: self.rehydrate(outcome.into_document(), &known).await?,
            })
        }
        .await;
        self.businesses.observe("save", result)
    }

    async fn materialize(&self, wire: &Value) -> Result<Business> {
        let result: Result<Business> = async {
            let mut memento = self.businesses.codec().decode(wire)?;
            self.expand(&mut memento, &KnownPeople::new()).await?;
            self.businesses.codec().build(memento)
        }
        .await;
        self.businesses.observe("materialize", result)
    }
}
