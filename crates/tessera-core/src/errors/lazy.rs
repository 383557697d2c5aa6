//! Lazily allocated error aggregate for concurrent batch fan-out

use super::{AggregateIndexError, ErrorAggregate, StoreError};
use parking_lot::Mutex;

/// Builder that allocates an [`ErrorAggregate`] only once a failure arrives.
///
/// Create one per batch call with the batch size, share it by reference with
/// the per-element workers, and call [`assign`](Self::assign) with each
/// element's outcome. The success path never allocates.
#[derive(Debug)]
pub struct LazyAggregate {
    size: usize,
    inner: Mutex<Option<ErrorAggregate>>,
}

impl LazyAggregate {
    /// Builder for a batch of `size` elements.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            inner: Mutex::new(None),
        }
    }

    /// Batch size the aggregate will have once allocated.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Record the outcome of element `index`.
    ///
    /// `None` is a no-op. The first present error allocates the full-size
    /// aggregate under the lock; later calls write into it.
    pub fn assign(&self, index: usize, err: Option<StoreError>) -> Result<(), AggregateIndexError> {
        let Some(err) = err else {
            return Ok(());
        };
        if index >= self.size {
            return Err(AggregateIndexError {
                index,
                size: self.size,
            });
        }

        let mut guard = self.inner.lock();
        let aggregate = guard.get_or_insert_with(|| {
            tracing::debug!(size = self.size, index, "allocating error aggregate on first failure");
            ErrorAggregate::new(self.size)
        });
        aggregate.set(index, err)
    }

    /// Snapshot of the aggregate, or `None` if nothing failed so far.
    pub fn get(&self) -> Option<ErrorAggregate> {
        self.inner.lock().clone()
    }

    /// Consume the builder, returning the aggregate if anything failed.
    pub fn into_aggregate(self) -> Option<ErrorAggregate> {
        self.inner.into_inner()
    }

    /// Consume the builder into the caller-facing error value.
    pub fn into_error(self) -> Option<StoreError> {
        self.into_aggregate().map(StoreError::Aggregate)
    }
}
