//! # Tessera Core - Execution Scope and Batch Errors
//!
//! Foundation types shared by every datastore service in the workspace.
//!
//! ## Core Concepts
//!
//! - **Context**: an immutable, explicitly passed execution scope. Services are
//!   registered into it by deriving child scopes, never by mutation.
//! - **ErrorAggregate**: one optional error per element of a batch operation,
//!   in input order.
//! - **LazyAggregate**: a lock-guarded builder that only allocates the
//!   aggregate once a real failure is reported.
//! - **Normalization**: backends declare how their native batch error maps
//!   onto the canonical aggregate, so callers only ever see one shape.
//!
//! ## What's NOT in this crate
//!
//! - Storage operations or a storage data model (see `tessera-datastore`)
//! - Retry or recovery policy

#![forbid(unsafe_code)]

/// Immutable, parent-linked execution scope
pub mod context;

/// Batch error aggregation and normalization
pub mod errors;

pub use context::{Context, ContextKey};
pub use errors::{
    normalize, normalize_result, single_error, AggregateIndexError, BackendError, ErrorAggregate,
    LazyAggregate, SharedError, StoreError,
};
