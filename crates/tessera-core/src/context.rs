//! Execution context for service resolution.
//!
//! A `Context` is a chain of typed layers. Each derivation pushes one layer
//! holding a single value and links back to its parent; the parent is never
//! touched. Lookups walk from the newest layer to the root and the nearest
//! layer for a key wins, so a child shadows its ancestors.
//!
//! Because published layers are never mutated, a `Context` can be cloned and
//! read from any number of threads without synchronization.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A slot in the execution context.
///
/// The implementing type is only used as an identity; `Value` is what the slot
/// holds. Keep key types private to the module that owns the slot so that
/// nothing else can read or shadow it.
pub trait ContextKey: 'static {
    /// Type stored under this key.
    type Value: Send + Sync + 'static;
}

struct Layer {
    key: TypeId,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<Layer>>,
}

/// Operation-scoped context threaded through resolution calls.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Layer>>,
}

impl Context {
    /// Empty root context with no registered values.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a child context holding `value` under key `K`.
    ///
    /// `self` is left unchanged; callers must propagate the returned context to
    /// observe the new value.
    pub fn with_value<K: ContextKey>(&self, value: K::Value) -> Self {
        Self {
            head: Some(Arc::new(Layer {
                key: TypeId::of::<K>(),
                value: Arc::new(value),
                parent: self.head.clone(),
            })),
        }
    }

    /// Nearest value stored under key `K`, if any layer holds one.
    pub fn value<K: ContextKey>(&self) -> Option<&K::Value> {
        let key = TypeId::of::<K>();
        let mut cursor = self.head.as_deref();
        while let Some(layer) = cursor {
            if layer.key == key {
                return (*layer.value).downcast_ref::<K::Value>();
            }
            cursor = layer.parent.as_deref();
        }
        None
    }

    /// Whether any layer holds a value for key `K`.
    pub fn contains<K: ContextKey>(&self) -> bool {
        self.value::<K>().is_some()
    }

    /// Number of layers between this context and the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cursor = self.head.as_deref();
        while let Some(layer) = cursor {
            depth += 1;
            cursor = layer.parent.as_deref();
        }
        depth
    }

    /// Whether both handles point at the same innermost layer.
    ///
    /// Two contexts in the same scope resolve every key identically.
    pub fn same_scope(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Name;
    impl ContextKey for Name {
        type Value = String;
    }

    struct Limit;
    impl ContextKey for Limit {
        type Value = u32;
    }

    #[test]
    fn test_background_is_empty() {
        let ctx = Context::background();
        assert_eq!(ctx.depth(), 0);
        assert!(ctx.value::<Name>().is_none());
        assert!(ctx.same_scope(&Context::default()));
    }

    #[test]
    fn test_child_shadows_parent_without_mutating_it() {
        let root = Context::background().with_value::<Name>("outer".to_string());
        let child = root.with_value::<Name>("inner".to_string());

        assert_eq!(root.value::<Name>().map(String::as_str), Some("outer"));
        assert_eq!(child.value::<Name>().map(String::as_str), Some("inner"));
        assert_eq!(root.depth(), 1);
        assert_eq!(child.depth(), 2);
    }

    #[test]
    fn test_keys_are_independent() {
        let ctx = Context::background()
            .with_value::<Limit>(7)
            .with_value::<Name>("svc".to_string());

        assert_eq!(ctx.value::<Limit>(), Some(&7));
        assert!(ctx.contains::<Name>());
    }

    #[test]
    fn test_same_scope_tracks_identity() {
        let ctx = Context::background().with_value::<Limit>(1);
        let clone = ctx.clone();
        let derived = ctx.with_value::<Limit>(1);

        assert!(ctx.same_scope(&clone));
        assert!(!ctx.same_scope(&derived));
        assert!(!ctx.same_scope(&Context::background()));
    }
}
