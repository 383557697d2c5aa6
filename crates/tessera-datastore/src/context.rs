//! Factory and filter registration on the execution context.
//!
//! The context holds one [`Factory`] and one ordered filter chain. Both are
//! immutable snapshots; registering either derives a new context.

use crate::interface::RawDatastore;
use std::sync::Arc;
use tessera_core::{Context, ContextKey};

/// Produces the datastore for a context.
///
/// May be invoked any number of times with the same context.
pub type Factory = Arc<dyn Fn(&Context) -> Option<Arc<dyn RawDatastore>> + Send + Sync>;

/// Wraps a datastore with additional behavior.
///
/// A filter receives the datastore produced by the factory and every filter
/// registered before it. To reach the raw backend it must call
/// [`resolve_unfiltered`], never [`resolve`].
pub type Filter =
    Arc<dyn Fn(&Context, Arc<dyn RawDatastore>) -> Option<Arc<dyn RawDatastore>> + Send + Sync>;

struct FactoryKey;

impl ContextKey for FactoryKey {
    type Value = Factory;
}

struct FilterKey;

impl ContextKey for FilterKey {
    type Value = Arc<[Filter]>;
}

/// Set the factory used to produce datastores in the returned context.
///
/// Shadows any factory registered on an ancestor.
pub fn set_factory(ctx: &Context, factory: Factory) -> Context {
    ctx.with_value::<FactoryKey>(factory)
}

/// Register a fixed datastore instance; every resolution returns it.
pub fn set(ctx: &Context, datastore: Arc<dyn RawDatastore>) -> Context {
    set_factory(ctx, Arc::new(move |_: &Context| Some(Arc::clone(&datastore))))
}

/// Datastore from the registered factory, without any filter applied.
pub fn resolve_unfiltered(ctx: &Context) -> Option<Arc<dyn RawDatastore>> {
    let Some(factory) = ctx.value::<FactoryKey>() else {
        tracing::trace!("no datastore factory registered in context");
        return None;
    };
    factory(ctx)
}

/// Filters currently registered, in application order.
pub fn filters(ctx: &Context) -> Vec<Filter> {
    ctx.value::<FilterKey>()
        .map(|chain| chain.to_vec())
        .unwrap_or_default()
}

/// Append filters to the chain inherited from `ctx`.
///
/// With no filters the same context is returned and no layer is added.
pub fn add_filters<I>(ctx: &Context, new_filters: I) -> Context
where
    I: IntoIterator<Item = Filter>,
{
    let new_filters: Vec<Filter> = new_filters.into_iter().collect();
    if new_filters.is_empty() {
        return ctx.clone();
    }

    let current = ctx.value::<FilterKey>().map_or(&[][..], |chain| &chain[..]);
    let mut chain = Vec::with_capacity(current.len() + new_filters.len());
    chain.extend(current.iter().cloned());
    chain.extend(new_filters);
    ctx.with_value::<FilterKey>(chain.into())
}

/// Datastore from the registered factory, wrapped by every registered filter.
///
/// Filters run in registration order, each wrapping the previous result. If the
/// factory yields nothing, no filter runs. A filter yielding nothing ends the
/// chain with no datastore.
pub fn resolve(ctx: &Context) -> Option<Arc<dyn RawDatastore>> {
    let base = resolve_unfiltered(ctx)?;
    let Some(chain) = ctx.value::<FilterKey>() else {
        return Some(base);
    };

    tracing::trace!(filters = chain.len(), base = base.name(), "applying datastore filters");
    chain
        .iter()
        .try_fold(base, |datastore, filter| filter(ctx, datastore))
}
