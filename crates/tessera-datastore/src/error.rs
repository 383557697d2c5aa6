//! Datastore errors
//!
//! Typed failures raised by the in-crate backend and configuration. They reach
//! callers as `StoreError` after normalization.

use crate::interface::Key;
use tessera_core::BackendError;

/// Datastore error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatastoreError {
    /// No entity stored under the key
    #[error("datastore: no such entity: {key}")]
    NoSuchEntity {
        /// Key that was looked up
        key: Key,
    },

    /// Key cannot address an entity
    #[error("datastore: invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },

    /// Batch output whose failures are not sized to its values
    #[error("datastore: batch of {values} values paired with {errors} error entries")]
    BatchShape {
        /// Number of values
        values: usize,
        /// Number of aggregate entries
        errors: usize,
    },

    /// Configuration failed validation or parsing
    #[error("datastore: invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong with the configuration
        message: String,
    },
}

impl DatastoreError {
    /// Create a no-such-entity error
    pub fn no_such_entity(key: &Key) -> Self {
        Self::NoSuchEntity { key: key.clone() }
    }

    /// Create an invalid key error
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    /// Create a batch shape mismatch error
    pub fn batch_shape(values: usize, errors: usize) -> Self {
        Self::BatchShape { values, errors }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

impl BackendError for DatastoreError {}
