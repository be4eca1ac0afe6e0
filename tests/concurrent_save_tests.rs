/// Concurrent save tests
///
/// Racing saves of the same natural key must converge on one stored document.
/// Run with: cargo test --test concurrent_save_tests
mod common;

use common::*;
use fitcoach::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Barrier;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_inserts_of_a_new_person_share_one_key() {
    let stores = Arc::new(stores().await);
    let num_tasks = 32;
    let barrier = Arc::new(Barrier::new(num_tasks));

    let mut handles = vec![];
    for _ in 0..num_tasks {
        let stores = Arc::clone(&stores);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            stores
                .people
                .save(&person("Racer", "racer@ironclub.fit", 0))
                .await
                .unwrap()
        }));
    }

    let mut keys = HashSet::new();
    for handle in handles {
        let saved = handle.await.unwrap();
        keys.insert(saved.key().unwrap().to_string());
    }

    assert_eq!(keys.len(), 1);
    assert_eq!(count(&stores, "people").await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn out_of_order_clocks_settle_on_the_highest() {
    let stores = Arc::new(stores().await);
    let base = stores
        .people
        .save(&person("Clock", "clock@ironclub.fit", 0))
        .await
        .unwrap();

    let mut handles = vec![];
    for sequence in (1..=20u64).rev() {
        let stores = Arc::clone(&stores);
        let mut update = base.clone();
        update.persona.persistence_details.sequence_number = sequence;
        update.persona.name = Name::new(format!("Clock {sequence}")).unwrap();
        handles.push(tokio::spawn(async move {
            stores.people.save_reported(&update, Deadline::none()).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stored = stores
        .people
        .load_one(base.key().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.persona.persistence_details.sequence_number, 20);
    assert_eq!(stored.persona.name.as_str(), "Clock 20");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_business_saves_with_a_shared_new_administrator() {
    let stores = Arc::new(stores().await);
    let num_tasks = 16;
    let barrier = Arc::new(Barrier::new(num_tasks));

    let mut handles = vec![];
    for _ in 0..num_tasks {
        let stores = Arc::clone(&stores);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            let owner = coach("Owner", "owner@ironclub.fit");
            let gym = business("Iron Club", vec![owner.clone()], vec![owner], 0);
            barrier.wait().await;
            stores.businesses.save(&gym).await.unwrap()
        }));
    }

    let mut saved = vec![];
    for handle in handles {
        saved.push(handle.await.unwrap());
    }

    let first = &saved[0];
    assert!(saved.iter().all(|business| business == first));
    assert_eq!(count(&stores, "businesses").await, 1);
    assert_eq!(count(&stores, "people").await, 1);
}
