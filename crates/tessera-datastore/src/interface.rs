//! Datastore contract resolved from the context.
//!
//! Deliberately thin: opaque keys, raw byte values, and batch methods whose
//! per-element failures come back as an `ErrorAggregate` of the batch size.

use crate::error::DatastoreError;
use async_trait::async_trait;
use std::fmt;
use tessera_core::{ErrorAggregate, StoreError};

/// Opaque entity key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    /// Create a key from its encoded form
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded form of the key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key has no content
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(encoded: &str) -> Self {
        Self::new(encoded)
    }
}

/// Raw entity payload
pub type Value = Vec<u8>;

/// Per-element outcome of a batch read.
///
/// Entry `i` of [`values`](Self::values) is present when element `i`
/// succeeded. When any element failed, [`errors`](Self::errors) holds an
/// aggregate of the same length, so successful values survive a partial
/// failure.
#[derive(Debug, Clone)]
pub struct BatchOutput<T> {
    values: Vec<Option<T>>,
    errors: Option<ErrorAggregate>,
}

impl<T> BatchOutput<T> {
    /// Batch in which every element succeeded
    pub fn complete(values: Vec<T>) -> Self {
        Self {
            values: values.into_iter().map(Some).collect(),
            errors: None,
        }
    }

    /// Batch with per-element failures.
    ///
    /// `errors` must have one entry per value. An aggregate without any
    /// present entry is dropped.
    pub fn partial(values: Vec<Option<T>>, errors: ErrorAggregate) -> Result<Self, DatastoreError> {
        if values.len() != errors.len() {
            return Err(DatastoreError::batch_shape(values.len(), errors.len()));
        }
        Ok(Self {
            values,
            errors: errors.has_errors().then_some(errors),
        })
    }

    /// Number of elements in the batch
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the batch had no elements
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in element order; absent where the element failed
    pub fn values(&self) -> &[Option<T>] {
        &self.values
    }

    /// Value of element `index`, if it succeeded
    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Per-element failures, if any element failed
    pub fn errors(&self) -> Option<&ErrorAggregate> {
        self.errors.as_ref()
    }

    /// Whether every element succeeded
    pub fn is_complete(&self) -> bool {
        self.errors.is_none()
    }

    /// Transform every successful value, keeping failures in place
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> BatchOutput<U> {
        BatchOutput {
            values: self.values.into_iter().map(|value| value.map(&mut f)).collect(),
            errors: self.errors,
        }
    }

    /// Split into values and failures
    pub fn into_parts(self) -> (Vec<Option<T>>, Option<ErrorAggregate>) {
        (self.values, self.errors)
    }

    /// All values, or the aggregate when any element failed
    pub fn into_result(self) -> Result<Vec<T>, StoreError> {
        match self.errors {
            Some(aggregate) => Err(StoreError::Aggregate(aggregate)),
            None => Ok(self.values.into_iter().flatten().collect()),
        }
    }
}

/// Batch-capable storage interface.
///
/// Per-element failures are an `ErrorAggregate` with exactly one entry per
/// input element: inside the [`BatchOutput`] of a read, or as
/// `StoreError::Aggregate` from a write. Implementations pass backend errors
/// through [`tessera_core::normalize`] before returning them.
#[async_trait]
pub trait RawDatastore: Send + Sync {
    /// Fetch the values for `keys`, in order.
    ///
    /// `Err` means the call failed as a whole; element failures are reported
    /// in the returned [`BatchOutput`].
    async fn get_multi(&self, keys: &[Key]) -> Result<BatchOutput<Value>, StoreError>;

    /// Write every `(key, value)` pair.
    async fn put_multi(&self, entries: &[(Key, Value)]) -> Result<(), StoreError>;

    /// Remove every key.
    async fn delete_multi(&self, keys: &[Key]) -> Result<(), StoreError>;

    /// Short implementation name for diagnostics.
    fn name(&self) -> &'static str {
        "datastore"
    }
}
