use super::constraint::{DocumentConstraint, KeyLookup};
use super::document::{ConditionalWrite, Document, DocumentStore, Selector, StoredDocument, WriteOutcome};
use super::predicate::Predicate;
use crate::core::{CoachError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Rows of one collection, kept in insertion order with a primary-key index.
#[derive(Debug, Default)]
struct Collection {
    rows: BTreeMap<usize, StoredDocument>,
    next_row_id: usize,
    key_index: HashMap<String, usize>,
    constraints: Vec<Arc<dyn DocumentConstraint>>,
}

impl Collection {
    fn get(&self, key: &str) -> Option<&StoredDocument> {
        self.key_index.get(key).and_then(|id| self.rows.get(id))
    }

    fn find_first(&self, predicate: &Predicate) -> Option<&StoredDocument> {
        if let Predicate::Key(key) = predicate {
            return self.get(key);
        }
        self.rows
            .values()
            .find(|row| predicate.matches(&row.key, &row.document))
    }

    fn find(&self, predicate: &Predicate) -> Vec<StoredDocument> {
        if let Predicate::Key(key) = predicate {
            return self.get(key).cloned().into_iter().collect();
        }
        self.rows
            .values()
            .filter(|row| predicate.matches(&row.key, &row.document))
            .cloned()
            .collect()
    }

    fn push(&mut self, row: StoredDocument) {
        let id = self.next_row_id;
        self.next_row_id += 1;
        self.key_index.insert(row.key.clone(), id);
        self.rows.insert(id, row);
    }

    fn replace(&mut self, key: &str, document: Document) -> Option<StoredDocument> {
        let id = self.key_index.get(key)?;
        let row = self.rows.get_mut(id)?;
        row.document = document;
        Some(row.clone())
    }
}

#[derive(Debug, Default)]
struct Collections {
    by_name: HashMap<String, Collection>,
}

impl KeyLookup for Collections {
    fn contains_key(&self, collection: &str, key: &str) -> bool {
        self.by_name
            .get(collection)
            .is_some_and(|table| table.key_index.contains_key(key))
    }
}

impl Collections {
    fn table(&self, collection: &str) -> Option<&Collection> {
        self.by_name.get(collection)
    }

    fn validate(&self, collection: &str, document: &Document) -> Result<()> {
        if let Some(table) = self.table(collection) {
            for constraint in &table.constraints {
                constraint.check(document, self)?;
            }
        }
        Ok(())
    }

    fn insert(&mut self, collection: &str, document: Document) -> Result<StoredDocument> {
        self.validate(collection, &document)?;
        let row = StoredDocument::new(Uuid::new_v4().to_string(), document);
        self.by_name
            .entry(collection.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    fn update(&mut self, collection: &str, key: &str, document: Document) -> Result<StoredDocument> {
        let unknown = || CoachError::UnknownKey {
            collection: collection.to_string(),
            key: key.to_string(),
        };
        if !self.contains_key(collection, key) {
            return Err(unknown());
        }
        self.validate(collection, &document)?;
        self.by_name
            .get_mut(collection)
            .and_then(|table| table.replace(key, document))
            .ok_or_else(unknown)
    }

    fn conditional_write(&mut self, collection: &str, write: ConditionalWrite) -> Result<WriteOutcome> {
        let incoming = write.incoming_sequence();
        let existing = match &write.selector {
            Selector::Key(key) => Some(
                self.table(collection)
                    .and_then(|table| table.get(key))
                    .cloned()
                    .ok_or_else(|| CoachError::UnknownKey {
                        collection: collection.to_string(),
                        key: key.clone(),
                    })?,
            ),
            Selector::NaturalKey(predicate) => self
                .table(collection)
                .and_then(|table| table.find_first(predicate))
                .cloned(),
        };

        match existing {
            None => Ok(WriteOutcome::Inserted(self.insert(collection, write.document)?)),
            Some(existing) if existing.sequence_number() >= incoming => Ok(WriteOutcome::Stale(existing)),
            Some(existing) => {
                if let Some(natural_key) = &write.unique {
                    self.ensure_unique(collection, &existing.key, natural_key)?;
                }
                Ok(WriteOutcome::Updated(self.update(
                    collection,
                    &existing.key,
                    write.document,
                )?))
            }
        }
    }

    /// Fails when a document other than `key` already matches `natural_key`.
    fn ensure_unique(&self, collection: &str, key: &str, natural_key: &Predicate) -> Result<()> {
        let holder = self.table(collection).and_then(|table| {
            table
                .rows
                .values()
                .find(|row| row.key != key && natural_key.matches(&row.key, &row.document))
        });
        match holder {
            Some(holder) => Err(CoachError::NaturalKeyConflict {
                collection: collection.to_string(),
                key: key.to_string(),
                held_by: holder.key.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Document store held entirely in memory.
///
/// All collections sit behind one lock, so a conditional write and the constraint checks
/// it triggers observe a single consistent state.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_one(&self, collection: &str, predicate: &Predicate) -> Result<Option<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .table(collection)
            .and_then(|table| table.find_first(predicate))
            .cloned())
    }

    async fn find(&self, collection: &str, predicate: &Predicate) -> Result<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .table(collection)
            .map(|table| table.find(predicate))
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<StoredDocument> {
        self.collections.write().await.insert(collection, document)
    }

    async fn update(&self, collection: &str, key: &str, document: Document) -> Result<StoredDocument> {
        self.collections.write().await.update(collection, key, document)
    }

    async fn conditional_write(&self, collection: &str, write: ConditionalWrite) -> Result<WriteOutcome> {
        self.collections
            .write()
            .await
            .conditional_write(collection, write)
    }

    async fn attach_constraint(
        &self,
        collection: &str,
        constraint: Arc<dyn DocumentConstraint>,
    ) -> Result<()> {
        let mut collections = self.collections.write().await;
        let table = collections.by_name.entry(collection.to_string()).or_default();
        if table
            .constraints
            .iter()
            .all(|existing| existing.name() != constraint.name())
        {
            table.constraints.push(constraint);
        }
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections.table(collection).map_or(0, |table| table.rows.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn person(email: &str, sequence: u64) -> Document {
        doc(json!({
            "persistenceDetails": {"sequenceNumber": sequence},
            "email": email
        }))
    }

    fn by_email(email: &str) -> Selector {
        Selector::NaturalKey(Predicate::eq("email", email))
    }

    #[derive(Debug)]
    struct RejectAll;

    impl DocumentConstraint for RejectAll {
        fn name(&self) -> &str {
            "reject_all"
        }

        fn check(&self, _document: &Document, _keys: &dyn KeyLookup) -> Result<()> {
            Err(CoachError::ReferentialIntegrity {
                field: "anything".into(),
                key: "nothing".into(),
            })
        }
    }

    #[tokio::test]
    async fn insert_assigns_distinct_keys_and_keeps_order() {
        let store = InMemoryDocumentStore::new();
        let first = store.insert("people", person("a@x.io", 0)).await.unwrap();
        let second = store.insert("people", person("b@x.io", 0)).await.unwrap();
        assert_ne!(first.key, second.key);

        let all = store.find("people", &Predicate::All).await.unwrap();
        let keys: Vec<_> = all.iter().map(|row| row.key.as_str()).collect();
        assert_eq!(keys, vec![first.key.as_str(), second.key.as_str()]);
        assert_eq!(store.count("people").await.unwrap(), 2);
        assert_eq!(store.count("nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_of_unknown_key_fails() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .update("people", "missing", person("a@x.io", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoachError::UnknownKey { .. }));
    }

    #[tokio::test]
    async fn conditional_write_arbitrates_by_sequence_number() {
        let store = InMemoryDocumentStore::new();
        let inserted = store
            .conditional_write("people", ConditionalWrite::new(by_email("a@x.io"), person("a@x.io", 3)))
            .await
            .unwrap();
        assert!(matches!(inserted, WriteOutcome::Inserted(_)));
        let key = inserted.document().key.clone();

        let stale = store
            .conditional_write("people", ConditionalWrite::new(by_email("a@x.io"), person("a@x.io", 3)))
            .await
            .unwrap();
        assert!(stale.is_stale());
        assert_eq!(stale.document().key, key);

        let updated = store
            .conditional_write(
                "people",
                ConditionalWrite::new(Selector::Key(key.clone()), person("a@x.io", 4)),
            )
            .await
            .unwrap();
        assert!(matches!(updated, WriteOutcome::Updated(_)));
        assert_eq!(updated.document().sequence_number(), 4);
        assert_eq!(store.count("people").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn keyed_conditional_write_requires_an_existing_document() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .conditional_write(
                "people",
                ConditionalWrite::new(Selector::Key("ghost".into()), person("a@x.io", 1)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoachError::UnknownKey { .. }));
    }

    #[tokio::test]
    async fn keyed_update_cannot_take_another_documents_natural_key() {
        let store = InMemoryDocumentStore::new();
        let first = store.insert("people", person("a@x.io", 0)).await.unwrap();
        let second = store.insert("people", person("b@x.io", 0)).await.unwrap();

        let err = store
            .conditional_write(
                "people",
                ConditionalWrite::new(Selector::Key(first.key.clone()), person("b@x.io", 1))
                    .unique_on(Predicate::eq("email", "b@x.io")),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            CoachError::NaturalKeyConflict { key, held_by, .. } if *key == first.key && *held_by == second.key
        ));
        let unchanged = store.find_one("people", &Predicate::key(&first.key)).await.unwrap().unwrap();
        assert_eq!(unchanged.document, person("a@x.io", 0));

        // Re-saving under its own natural key is not a conflict.
        let updated = store
            .conditional_write(
                "people",
                ConditionalWrite::new(Selector::Key(first.key.clone()), person("a@x.io", 1))
                    .unique_on(Predicate::eq("email", "a@x.io")),
            )
            .await
            .unwrap();
        assert!(matches!(updated, WriteOutcome::Updated(_)));
    }

    #[tokio::test]
    async fn failing_constraint_aborts_the_write() {
        let store = InMemoryDocumentStore::new();
        store.attach_constraint("people", Arc::new(RejectAll)).await.unwrap();
        store.attach_constraint("people", Arc::new(RejectAll)).await.unwrap();

        let err = store.insert("people", person("a@x.io", 0)).await.unwrap_err();
        assert!(matches!(err, CoachError::ReferentialIntegrity { .. }));
        assert_eq!(store.count("people").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn racing_writers_produce_a_single_document() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let mut handles = Vec::new();
        for sequence in 0..16u64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .conditional_write(
                        "people",
                        ConditionalWrite::new(by_email("race@x.io"), person("race@x.io", sequence % 4)),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rows = store.find("people", &Predicate::All).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sequence_number(), 3);
    }
}
