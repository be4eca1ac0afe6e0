use super::{Deadline, SaveOutcome};
use crate::codec::Codec;
use crate::config::{ReadRetryPolicy, StoreConfig};
use crate::core::{CoachError, Result};
use crate::domain::DEFAULT_SCHEMA_VERSION;
use crate::memento::Memento;
use crate::storage::{ConditionalWrite, Document, DocumentStore, Predicate, Selector, StoredDocument, WriteOutcome};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// One entity family bound to its collection.
///
/// Owns the storage-boundary concerns every family shares: moving the primary key between
/// the stored envelope and `persistenceDetails.key`, retrying reads, issuing the
/// conditional write and logging failures.
pub struct FamilyCollection<C: Codec> {
    store: Arc<dyn DocumentStore>,
    collection: String,
    codec: C,
    read_retry: ReadRetryPolicy,
    save_timeout: Option<Duration>,
}

impl<C: Codec> FamilyCollection<C> {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>, codec: C, config: &StoreConfig) -> Self {
        Self {
            store,
            collection: collection.into(),
            codec,
            read_retry: config.read_retry,
            save_timeout: config.save_timeout,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn family(&self) -> &'static str {
        self.codec.family()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn default_deadline(&self) -> Deadline {
        Deadline::from_timeout(self.save_timeout)
    }

    /// Turns a stored document back into a memento, restoring its key.
    pub fn memento_from(&self, stored: StoredDocument) -> Result<C::Memento> {
        let StoredDocument { key, mut document } = stored;
        let details = document
            .entry("persistenceDetails")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(details) = details {
            details.insert("key".to_string(), Value::String(key));
        }
        Ok(self.codec.decode(&Value::Object(document))?)
    }

    /// Serializes a flattened memento into the body that gets stored. The key is dropped;
    /// the store keeps it beside the body.
    pub fn document_from(&self, memento: &C::Memento) -> Result<Document> {
        let Value::Object(mut document) = serde_json::to_value(memento)? else {
            return Err(CoachError::store_io(format!(
                "{} memento did not serialize to an object",
                self.family()
            )));
        };
        if let Some(Value::Object(details)) = document.get_mut("persistenceDetails") {
            details.remove("key");
            let unset = details.get("schemaVersion").is_none_or(Value::is_null);
            if unset {
                details.insert("schemaVersion".to_string(), Value::from(DEFAULT_SCHEMA_VERSION));
            }
        }
        Ok(document)
    }

    async fn with_read_retry<T, F, Fut>(&self, operation: &'static str, mut attempt_read: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.read_retry.attempts();
        let mut attempt = 1;
        loop {
            match attempt_read().await {
                Err(err) if err.is_retryable() && attempt < attempts => {
                    let backoff = self.read_retry.backoff(attempt);
                    warn!(
                        family = self.family(),
                        operation,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "read failed, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    pub async fn fetch_one(&self, key: &str) -> Result<Option<StoredDocument>> {
        let predicate = Predicate::key(key);
        self.fetch_first(&predicate).await
    }

    pub async fn fetch_first(&self, predicate: &Predicate) -> Result<Option<StoredDocument>> {
        let store = &self.store;
        let collection = self.collection.as_str();
        self.with_read_retry("find_one", move || store.find_one(collection, predicate))
            .await
    }

    pub async fn fetch_where(&self, predicate: &Predicate) -> Result<Vec<StoredDocument>> {
        let store = &self.store;
        let collection = self.collection.as_str();
        let found = self
            .with_read_retry("find", move || store.find(collection, predicate))
            .await?;
        debug!(
            family = self.family(),
            predicate = %predicate,
            matched = found.len(),
            "query"
        );
        Ok(found)
    }

    /// Documents for `keys` in the order asked for. Unknown keys are skipped.
    pub async fn fetch_many(&self, keys: &[String]) -> Result<Vec<StoredDocument>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let found = self.fetch_where(&Predicate::key_in(keys.iter().cloned())).await?;
        let by_key: HashMap<&str, &StoredDocument> =
            found.iter().map(|doc| (doc.key.as_str(), doc)).collect();
        Ok(keys
            .iter()
            .filter_map(|key| by_key.get(key.as_str()).map(|doc| (*doc).clone()))
            .collect())
    }

    /// Atomic reconcile of one flattened memento.
    ///
    /// A keyed memento competes with the document under its key and may not move onto a
    /// natural key another document holds. An unkeyed one competes with whatever matches
    /// `natural_key` and is inserted when nothing does. Either way the write only lands when
    /// its sequence number is newer than the stored one.
    pub async fn write(&self, memento: &C::Memento, natural_key: Predicate, deadline: Deadline) -> Result<WriteOutcome> {
        deadline.check(self.family(), "save")?;

        let document = self.document_from(memento)?;
        let write = match memento.persistence_details().valid_key() {
            Some(key) => ConditionalWrite::new(Selector::Key(key.to_string()), document).unique_on(natural_key),
            None => ConditionalWrite::new(Selector::NaturalKey(natural_key), document),
        };
        let selector = write.selector.clone();
        let outcome = self.store.conditional_write(&self.collection, write).await?;

        let stored = outcome.document();
        match &outcome {
            WriteOutcome::Stale(_) => warn!(
                family = self.family(),
                key = %stored.key,
                stored_sequence = stored.sequence_number(),
                incoming_sequence = memento.persistence_details().sequence_number,
                "stale write discarded, keeping stored version"
            ),
            _ => debug!(
                family = self.family(),
                key = %stored.key,
                outcome = ?SaveOutcome::from(&outcome),
                selector = ?selector,
                "write applied"
            ),
        }
        Ok(outcome)
    }

    /// Logs a failed operation at the adapter boundary and passes the result through.
    pub fn observe<T>(&self, operation: &'static str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            match err {
                CoachError::StoreIo(_) | CoachError::Cancelled(_) => {
                    error!(family = self.family(), operation, error = %err, "store operation failed")
                }
                _ => warn!(family = self.family(), operation, error = %err, "store operation rejected"),
            }
        }
        result
    }
}
