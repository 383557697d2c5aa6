//! Batch error model
//!
//! A datastore call either succeeds, fails as a whole (`StoreError::Plain`), or
//! fails for some of its elements (`StoreError::Aggregate`). Aggregates keep
//! exact positional correspondence with the batch that produced them.

mod aggregate;
mod lazy;
mod normalize;

pub use aggregate::ErrorAggregate;
pub use lazy::LazyAggregate;
pub use normalize::{normalize, normalize_result, BackendError};

use std::sync::Arc;

/// Shared, clonable handle to an arbitrary error.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Canonical error returned by every datastore operation
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Whole-operation or single-element failure
    #[error(transparent)]
    Plain(SharedError),

    /// Partial batch failure, one entry per input element
    #[error(transparent)]
    Aggregate(#[from] ErrorAggregate),
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

impl StoreError {
    /// Wrap an arbitrary error as a plain failure
    pub fn plain<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Plain(Arc::new(err))
    }

    /// Create a plain failure from a message
    pub fn message(message: impl Into<String>) -> Self {
        Self::plain(Message(message.into()))
    }

    /// Whether this is a per-element batch failure
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::Aggregate(_))
    }

    /// Borrow the aggregate, if this is one
    pub fn as_aggregate(&self) -> Option<&ErrorAggregate> {
        match self {
            Self::Aggregate(aggregate) => Some(aggregate),
            Self::Plain(_) => None,
        }
    }

    /// Collapse a one-element batch result to its only entry.
    ///
    /// Aggregates yield their entry at index 0 (absent when the aggregate is
    /// empty or that element succeeded). Plain errors are returned unchanged.
    pub fn into_single(self) -> Option<Self> {
        match self {
            Self::Aggregate(aggregate) => aggregate.into_entries().into_iter().next().flatten(),
            plain @ Self::Plain(_) => Some(plain),
        }
    }

    /// Identity comparison: same underlying error objects in the same places.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Plain(a), Self::Plain(b)) => Arc::ptr_eq(a, b),
            (Self::Aggregate(a), Self::Aggregate(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|pair| match pair {
                        (None, None) => true,
                        (Some(x), Some(y)) => x.ptr_eq(y),
                        _ => false,
                    })
            }
            _ => false,
        }
    }
}

/// Unwrap an error from a batch known to hold exactly one element.
///
/// See [`StoreError::into_single`].
pub fn single_error(err: Option<StoreError>) -> Option<StoreError> {
    err.and_then(StoreError::into_single)
}

/// Assignment past the end of a lazily built aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("error index {index} out of range for batch of {size}")]
pub struct AggregateIndexError {
    /// Requested element index
    pub index: usize,
    /// Batch size the aggregate was created for
    pub size: usize,
}

impl BackendError for AggregateIndexError {}
