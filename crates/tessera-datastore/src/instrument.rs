//! Tracing filter
//!
//! Wraps whatever the chain produced so far and logs every batch call with its
//! size and outcome. Partial failures are logged with the aggregate summary
//! and, optionally, one event per failed element.

use crate::config::InstrumentConfig;
use crate::context::Filter;
use crate::interface::{BatchOutput, Key, RawDatastore, Value};
use async_trait::async_trait;
use std::sync::Arc;
use tessera_core::{Context, ErrorAggregate, StoreError};

/// Filter that wraps the datastore in [`Instrumented`].
pub fn instrument(config: InstrumentConfig) -> Filter {
    let config = Arc::new(config);
    Arc::new(move |_: &Context, inner: Arc<dyn RawDatastore>| {
        let wrapped: Arc<dyn RawDatastore> = Arc::new(Instrumented {
            inner,
            config: Arc::clone(&config),
        });
        Some(wrapped)
    })
}

/// How a batch call ended, as far as logging is concerned
enum Outcome<'a> {
    Succeeded,
    Partial(&'a ErrorAggregate),
    Failed(&'a StoreError),
}

impl<'a> Outcome<'a> {
    fn of_error(err: &'a StoreError) -> Self {
        match err {
            StoreError::Aggregate(aggregate) => Self::Partial(aggregate),
            StoreError::Plain(_) => Self::Failed(err),
        }
    }

    fn of<T>(result: &'a Result<T, StoreError>) -> Self {
        result.as_ref().err().map_or(Self::Succeeded, Self::of_error)
    }

    fn of_batch<T>(result: &'a Result<BatchOutput<T>, StoreError>) -> Self {
        match result {
            Ok(output) => output.errors().map_or(Self::Succeeded, Self::Partial),
            Err(err) => Self::of_error(err),
        }
    }
}

/// Datastore decorator emitting `tracing` events per batch call
pub struct Instrumented {
    inner: Arc<dyn RawDatastore>,
    config: Arc<InstrumentConfig>,
}

impl Instrumented {
    /// Wrap `inner` directly, outside of any filter chain
    pub fn new(inner: Arc<dyn RawDatastore>, config: InstrumentConfig) -> Self {
        Self {
            inner,
            config: Arc::new(config),
        }
    }

    /// Configuration in effect
    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    fn report(&self, operation: &'static str, batch: usize, outcome: Outcome<'_>) {
        let label = self.config.label.as_str();
        let backend = self.inner.name();
        match outcome {
            Outcome::Succeeded => {
                if self.config.log_successes {
                    tracing::debug!(label, backend, operation, batch, "datastore batch succeeded");
                }
            }
            Outcome::Partial(aggregate) => {
                tracing::warn!(
                    label,
                    backend,
                    operation,
                    batch,
                    failed = aggregate.error_count(),
                    summary = %aggregate,
                    "datastore batch partially failed"
                );
                if self.config.log_element_errors {
                    for (index, err) in aggregate.failures().take(self.config.max_logged_errors) {
                        tracing::debug!(label, operation, index, error = %err, "datastore element failed");
                    }
                }
            }
            Outcome::Failed(err) => {
                tracing::warn!(label, backend, operation, batch, error = %err, "datastore batch failed");
            }
        }
    }
}

#[async_trait]
impl RawDatastore for Instrumented {
    async fn get_multi(&self, keys: &[Key]) -> Result<BatchOutput<Value>, StoreError> {
        let result = self.inner.get_multi(keys).await;
        self.report("get_multi", keys.len(), Outcome::of_batch(&result));
        result
    }

    async fn put_multi(&self, entries: &[(Key, Value)]) -> Result<(), StoreError> {
        let result = self.inner.put_multi(entries).await;
        self.report("put_multi", entries.len(), Outcome::of(&result));
        result
    }

    async fn delete_multi(&self, keys: &[Key]) -> Result<(), StoreError> {
        let result = self.inner.delete_multi(keys).await;
        self.report("delete_multi", keys.len(), Outcome::of(&result));
        result
    }

    fn name(&self) -> &'static str {
        "instrumented"
    }
}
