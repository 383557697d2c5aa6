//! # Tessera Datastore - Service Resolution
//!
//! Locates a [`RawDatastore`] implementation through the execution
//! [`Context`](tessera_core::Context) and decorates it with an ordered chain of
//! filters.
//!
//! ## Usage
//!
//! - A backend registers a [`Factory`] with [`set_factory`] (or a fixed
//!   instance with [`set`]).
//! - Middleware registers [`Filter`]s with [`add_filters`]; registration order
//!   is application order, so the last filter added is outermost.
//! - Callers use [`resolve`]. Filters that need the raw backend use
//!   [`resolve_unfiltered`] so they never re-enter their own chain.
//!
//! Batch methods report partial failure as an
//! [`ErrorAggregate`](tessera_core::ErrorAggregate) sized to the batch; reads
//! keep the values of the elements that succeeded in a [`BatchOutput`].

#![forbid(unsafe_code)]

/// Instrumentation filter configuration
pub mod config;

/// Factory/filter registration and resolution
pub mod context;

/// Backend error types
pub mod error;

/// Batch-capable datastore contract
pub mod interface;

/// Tracing filter over any datastore
pub mod instrument;

/// In-memory reference backend
pub mod memory;

pub use config::InstrumentConfig;
pub use context::{
    add_filters, filters, resolve, resolve_unfiltered, set, set_factory, Factory, Filter,
};
pub use error::DatastoreError;
pub use instrument::{instrument, Instrumented};
pub use interface::{BatchOutput, Key, RawDatastore, Value};
pub use memory::MemoryDatastore;
