/// Store fault tests
///
/// A wrapper store fails a configurable number of calls with a driver error, or slows writes down.
mod common;

use async_trait::async_trait;
use common::*;
use fitcoach::prelude::*;
use fitcoach::storage::{ConditionalWrite, Document, DocumentConstraint, StoredDocument, WriteOutcome};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
struct FlakyStore {
    inner: InMemoryDocumentStore,
    failing_reads: AtomicUsize,
    failing_writes: AtomicUsize,
    read_calls: AtomicUsize,
    write_calls: AtomicUsize,
    write_delay_ms: AtomicU64,
}

impl FlakyStore {
    fn fail_next_reads(&self, n: usize) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    fn delay_writes(&self, delay: Duration) {
        self.write_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn trip(counter: &AtomicUsize) -> Result<()> {
        let tripped = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if tripped {
            Err(CoachError::store_io("connection reset by peer"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn find_one(&self, collection: &str, predicate: &Predicate) -> Result<Option<StoredDocument>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Self::trip(&self.failing_reads)?;
        self.inner.find_one(collection, predicate).await
    }

    async fn find(&self, collection: &str, predicate: &Predicate) -> Result<Vec<StoredDocument>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Self::trip(&self.failing_reads)?;
        self.inner.find(collection, predicate).await
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<StoredDocument> {
        self.inner.insert(collection, document).await
    }

    async fn update(&self, collection: &str, key: &str, document: Document) -> Result<StoredDocument> {
        self.inner.update(collection, key, document).await
    }

    async fn conditional_write(&self, collection: &str, write: ConditionalWrite) -> Result<WriteOutcome> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        Self::trip(&self.failing_writes)?;
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.conditional_write(collection, write).await
    }

    async fn attach_constraint(&self, collection: &str, constraint: Arc<dyn DocumentConstraint>) -> Result<()> {
        self.inner.attach_constraint(collection, constraint).await
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        self.inner.count(collection).await
    }
}

async fn open(flaky: Arc<FlakyStore>, retry: ReadRetryPolicy) -> CoachStores {
    CoachStores::open(
        flaky,
        StoreConfig::new().read_retry(retry),
        Arc::new(MeasurementCatalog::standard()),
    )
    .await
    .unwrap()
}

fn quick_retry(max_attempts: u32) -> ReadRetryPolicy {
    ReadRetryPolicy {
        max_attempts,
        base_backoff_ms: 1,
        max_backoff_ms: 2,
    }
}

#[tokio::test]
async fn transient_read_failures_are_retried() {
    let flaky = Arc::new(FlakyStore::default());
    let stores = open(flaky.clone(), quick_retry(3)).await;
    let saved = stores
        .people
        .save(&person("Dana", "dana@ironclub.fit", 0))
        .await
        .unwrap();

    flaky.fail_next_reads(2);
    let loaded = stores.people.load_one(saved.key().unwrap()).await.unwrap();
    assert_eq!(loaded, Some(saved));
    assert_eq!(flaky.read_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn reads_give_up_after_the_last_attempt() {
    let flaky = Arc::new(FlakyStore::default());
    let stores = open(flaky.clone(), quick_retry(2)).await;

    flaky.fail_next_reads(5);
    let err = stores.people.load_by_email("dana@ironclub.fit").await.unwrap_err();
    assert!(matches!(err, CoachError::StoreIo(_)));
    assert_eq!(flaky.read_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn writes_are_never_retried() {
    let flaky = Arc::new(FlakyStore::default());
    let stores = open(flaky.clone(), quick_retry(5)).await;

    flaky.fail_next_writes(1);
    let err = stores
        .people
        .save(&person("Dana", "dana@ironclub.fit", 0))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(flaky.write_calls.load(Ordering::SeqCst), 1);
    assert_eq!(count(&stores, "people").await, 0);

    // the caller decides to try again
    assert!(stores.people.save(&person("Dana", "dana@ironclub.fit", 0)).await.is_ok());
}

#[tokio::test]
async fn domain_errors_are_not_retried() {
    let flaky = Arc::new(FlakyStore::default());
    let stores = open(flaky.clone(), quick_retry(5)).await;
    let bad = snatch(stores.catalog(), "ForceRIError", "nowhere", 60.0, 1).unwrap();

    assert!(matches!(
        stores.measurements.save(&bad).await,
        Err(CoachError::ReferentialIntegrity { .. })
    ));
    assert_eq!(flaky.write_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn deadline_passing_mid_cascade_keeps_the_stored_children() {
    let flaky = Arc::new(FlakyStore::default());
    let stores = open(flaky.clone(), quick_retry(1)).await;
    flaky.delay_writes(Duration::from_millis(300));

    let gym = business("Iron Club", vec![coach("Owner", "owner@ironclub.fit")], vec![], 0);
    let err = stores
        .businesses
        .save_with_deadline(&gym, Deadline::after(Duration::from_millis(100)))
        .await
        .unwrap_err();

    assert!(matches!(err, CoachError::Cancelled(_)));
    assert_eq!(flaky.write_calls.load(Ordering::SeqCst), 1);
    assert_eq!(count(&stores, "businesses").await, 0);
    // the owner was written before the deadline and stays, findable by email
    assert_eq!(count(&stores, "people").await, 1);
    assert!(stores
        .people
        .load_by_email("owner@ironclub.fit")
        .await
        .unwrap()
        .is_some());
}
