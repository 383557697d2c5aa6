//! Concurrency stress tests for `LazyAggregate`
//!
//! Many workers assign disjoint indices of one builder at the same time. No
//! assignment may be lost and the aggregate must keep the batch length.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::thread;
use tessera_core::{LazyAggregate, StoreError};

const BATCH: usize = 512;

fn fails(index: usize) -> bool {
    index % 3 == 0 || index % 7 == 0
}

#[test]
fn test_threaded_disjoint_assignments_are_not_lost() {
    for _round in 0..16 {
        let lazy = LazyAggregate::new(BATCH);

        thread::scope(|scope| {
            for worker in 0..8 {
                let lazy = &lazy;
                scope.spawn(move || {
                    for index in (worker..BATCH).step_by(8) {
                        let err = fails(index).then(|| StoreError::message(format!("element {index}")));
                        lazy.assign(index, err).unwrap();
                    }
                });
            }
        });

        let aggregate = lazy.into_aggregate().expect("some elements failed");
        assert_eq!(aggregate.len(), BATCH);
        for index in 0..BATCH {
            match aggregate.get(index) {
                Some(err) => {
                    assert!(fails(index));
                    assert_eq!(err.to_string(), format!("element {index}"));
                }
                None => assert!(!fails(index)),
            }
        }
    }
}

#[test]
fn test_racing_first_failures_allocate_once() {
    // Every worker fails immediately, so they all race on the allocation.
    let lazy = LazyAggregate::new(64);
    thread::scope(|scope| {
        for index in 0..64 {
            let lazy = &lazy;
            scope.spawn(move || {
                lazy.assign(index, Some(StoreError::message("boom"))).unwrap();
            });
        }
    });

    let aggregate = lazy.get().expect("all elements failed");
    assert_eq!(aggregate.len(), 64);
    assert_eq!(aggregate.error_count(), 64);
    assert_eq!(aggregate.to_string(), "boom (and 63 other errors)");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_task_fan_out_assignments_are_not_lost() {
    let lazy = Arc::new(LazyAggregate::new(BATCH));

    let tasks: Vec<_> = (0..BATCH)
        .map(|index| {
            let lazy = Arc::clone(&lazy);
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                let err = fails(index).then(|| StoreError::message("task failed"));
                lazy.assign(index, err).unwrap();
                // concurrent readers never observe a short aggregate
                if let Some(snapshot) = lazy.get() {
                    assert_eq!(snapshot.len(), BATCH);
                }
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    let expected = (0..BATCH).filter(|index| fails(*index)).count();
    let aggregate = lazy.get().expect("some elements failed");
    assert_eq!(aggregate.error_count(), expected);
    assert_eq!(aggregate.len(), BATCH);
}
