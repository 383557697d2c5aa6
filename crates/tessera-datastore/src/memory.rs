//! In-memory datastore
//!
//! Reference backend used by tests and as a quick mock via [`crate::set`].
//! Every batch element runs as its own future, and the futures of one batch
//! are interleaved on the calling task. Failures are collected into a shared
//! [`LazyAggregate`] so the success path never allocates an error list.

use crate::error::DatastoreError;
use crate::interface::{BatchOutput, Key, RawDatastore, Value};
use async_trait::async_trait;
use futures::future::{join_all, poll_fn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::task::Poll;
use tessera_core::{normalize, BackendError, LazyAggregate, StoreError};

/// Datastore backed by a process-local map
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    entries: RwLock<HashMap<Key, Value>>,
}

impl MemoryDatastore {
    /// Create an empty datastore
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a datastore pre-populated with `entries`
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Key, Value)>,
    {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Number of stored entities
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether an entity is stored under `key`
    pub fn contains(&self, key: &Key) -> bool {
        self.entries.read().contains_key(key)
    }

    fn check_key(key: &Key) -> Result<(), DatastoreError> {
        if key.is_empty() {
            return Err(DatastoreError::invalid_key("key cannot be empty"));
        }
        Ok(())
    }

    fn fetch(&self, key: &Key) -> Result<Value, DatastoreError> {
        Self::check_key(key)?;
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| DatastoreError::no_such_entity(key))
    }

    fn store(&self, key: &Key, value: &Value) -> Result<(), DatastoreError> {
        Self::check_key(key)?;
        self.entries.write().insert(key.clone(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &Key) -> Result<(), DatastoreError> {
        Self::check_key(key)?;
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Suspend once, waking immediately.
async fn yield_now() {
    let mut yielded = false;
    poll_fn(|cx| {
        if yielded {
            return Poll::Ready(());
        }
        yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    })
    .await;
}

/// Run `op` for every index of a batch as interleaved futures.
///
/// Each element suspends once before running, so every element is polled
/// before any of them does its work. Outputs come back in element order,
/// with per-element failures in the batch's aggregate.
async fn fan_out<T, F>(operation: &'static str, size: usize, op: F) -> Result<BatchOutput<T>, StoreError>
where
    F: Fn(usize) -> Result<T, DatastoreError>,
{
    let errors = LazyAggregate::new(size);
    let outcomes = {
        let errors = &errors;
        let op = &op;
        join_all((0..size).map(move |index| async move {
            yield_now().await;
            match op(index) {
                Ok(output) => Ok(Some(output)),
                Err(err) => errors.assign(index, normalize(Some(err))).map(|()| None),
            }
        }))
        .await
    };

    let outputs = outcomes
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(BackendError::into_store_error)?;

    let Some(aggregate) = errors.into_aggregate() else {
        return Ok(BatchOutput::complete(outputs.into_iter().flatten().collect()));
    };
    tracing::debug!(
        operation,
        batch = size,
        failed = aggregate.error_count(),
        "memory datastore batch completed with element failures"
    );
    BatchOutput::partial(outputs, aggregate).map_err(BackendError::into_store_error)
}

#[async_trait]
impl RawDatastore for MemoryDatastore {
    async fn get_multi(&self, keys: &[Key]) -> Result<BatchOutput<Value>, StoreError> {
        fan_out("get_multi", keys.len(), |index| self.fetch(&keys[index])).await
    }

    async fn put_multi(&self, entries: &[(Key, Value)]) -> Result<(), StoreError> {
        fan_out("put_multi", entries.len(), |index| {
            let (key, value) = &entries[index];
            self.store(key, value)
        })
        .await
        .and_then(BatchOutput::into_result)
        .map(|_| ())
    }

    async fn delete_multi(&self, keys: &[Key]) -> Result<(), StoreError> {
        fan_out("delete_multi", keys.len(), |index| self.remove(&keys[index]))
            .await
            .and_then(BatchOutput::into_result)
            .map(|_| ())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker_ref;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Context as TaskContext;
    use tessera_core::ErrorAggregate;

    fn keys(names: &[&str]) -> Vec<Key> {
        names.iter().copied().map(Key::from).collect()
    }

    #[tokio::test]
    async fn test_put_then_get_batch() {
        let datastore = MemoryDatastore::new();
        let entries = vec![
            (Key::from("a"), b"alpha".to_vec()),
            (Key::from("b"), b"beta".to_vec()),
        ];

        assert!(datastore.put_multi(&entries).await.is_ok());
        let values = datastore
            .get_multi(&keys(&["b", "a"]))
            .await
            .and_then(BatchOutput::into_result);
        assert_eq!(values.ok(), Some(vec![b"beta".to_vec(), b"alpha".to_vec()]));
        assert_eq!(datastore.len(), 2);
    }

    #[tokio::test]
    async fn test_partial_get_failure_is_positional() {
        let datastore = MemoryDatastore::with_entries([(Key::from("a"), b"1".to_vec())]);

        let err = datastore
            .get_multi(&keys(&["a", "missing", "a", ""]))
            .await
            .and_then(BatchOutput::into_result)
            .err();
        let aggregate = err.as_ref().and_then(StoreError::as_aggregate);

        assert_eq!(aggregate.map(|aggregate| aggregate.len()), Some(4));
        assert_eq!(
            aggregate.map(|aggregate| aggregate.failures().map(|(i, _)| i).collect::<Vec<_>>()),
            Some(vec![1, 3])
        );
        assert_eq!(
            err.map(|err| err.to_string()).as_deref(),
            Some("datastore: no such entity: missing (and 1 other error)")
        );
    }

    #[tokio::test]
    async fn test_partial_get_keeps_successful_values() {
        let datastore = MemoryDatastore::with_entries([(Key::from("a"), b"1".to_vec())]);

        let output = datastore.get_multi(&keys(&["a", "missing", "a"])).await.ok();
        assert_eq!(
            output.as_ref().map(BatchOutput::values),
            Some(&[Some(b"1".to_vec()), None, Some(b"1".to_vec())][..])
        );
        assert_eq!(
            output.as_ref().and_then(BatchOutput::errors).map(ErrorAggregate::error_count),
            Some(1)
        );

        let missing = output
            .as_ref()
            .and_then(BatchOutput::errors)
            .and_then(|errors| errors.get(1))
            .map(ToString::to_string);
        assert_eq!(missing.as_deref(), Some("datastore: no such entity: missing"));
    }

    #[test]
    fn test_every_element_suspends_before_running() {
        let calls = AtomicUsize::new(0);
        let mut batch = Box::pin(fan_out("test", 3, |index| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(index)
        }));

        let mut cx = TaskContext::from_waker(noop_waker_ref());
        assert!(batch.as_mut().poll(&mut cx).is_pending());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let output = futures::executor::block_on(batch);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            output.ok().and_then(|output| output.into_result().ok()),
            Some(vec![0, 1, 2])
        );
    }

    #[tokio::test]
    async fn test_failed_elements_do_not_abort_siblings() {
        let datastore = MemoryDatastore::new();
        let entries = vec![
            (Key::from("x"), b"1".to_vec()),
            (Key::from(""), b"2".to_vec()),
            (Key::from("y"), b"3".to_vec()),
        ];

        let err = datastore.put_multi(&entries).await.err();
        assert!(err.is_some_and(|err| err.is_aggregate()));
        assert!(datastore.contains(&Key::from("x")));
        assert!(datastore.contains(&Key::from("y")));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let datastore = MemoryDatastore::with_entries([(Key::from("a"), b"1".to_vec())]);

        assert!(datastore.delete_multi(&keys(&["a", "never-stored"])).await.is_ok());
        assert!(datastore.is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_succeeds() {
        let datastore = MemoryDatastore::new();
        let output = datastore.get_multi(&[]).await.ok();
        assert!(output.as_ref().is_some_and(BatchOutput::is_empty));
        assert!(output.is_some_and(|output| output.is_complete()));
    }
}
