//! Conversion of backend-native errors into the canonical error shape
//!
//! Each backend declares, through [`BackendError`], whether one of its error
//! types is a per-element batch failure. Only declared types become
//! aggregates; everything else is carried as a plain error.

use super::{ErrorAggregate, StoreError};
use std::sync::Arc;

/// Error type produced by a datastore backend.
///
/// The default implementation treats the error as plain. A backend whose SDK
/// has its own batch-error type overrides [`try_into_aggregate`](Self::try_into_aggregate)
/// for that type, typically via [`ErrorAggregate::from_backend`].
pub trait BackendError: std::error::Error + Send + Sync + Sized + 'static {
    /// Convert into the canonical aggregate, or hand `self` back unchanged.
    fn try_into_aggregate(self) -> Result<ErrorAggregate, Self> {
        Err(self)
    }

    /// Canonical form of this error.
    fn into_store_error(self) -> StoreError {
        match self.try_into_aggregate() {
            Ok(aggregate) => StoreError::Aggregate(aggregate),
            Err(plain) => StoreError::Plain(Arc::new(plain)),
        }
    }
}

impl BackendError for StoreError {
    fn into_store_error(self) -> StoreError {
        self
    }
}

impl BackendError for ErrorAggregate {
    fn try_into_aggregate(self) -> Result<ErrorAggregate, Self> {
        Ok(self)
    }
}

/// Normalize an optional backend error before returning it to callers.
pub fn normalize<E: BackendError>(err: Option<E>) -> Option<StoreError> {
    err.map(BackendError::into_store_error)
}

/// [`normalize`] applied to the error side of a result.
pub fn normalize_result<T, E: BackendError>(result: Result<T, E>) -> Result<T, StoreError> {
    result.map_err(BackendError::into_store_error)
}
