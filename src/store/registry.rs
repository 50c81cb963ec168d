//! Explicit store context shared by containers and subtrees.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::Value;

use super::{SharedStore, StateStore};
use crate::scope::Scope;

/// Where participants look up the store they route through.
///
/// Every container and subtree is constructed with a registry, a private one
/// unless a shared one is passed in. Attaching a store to a registry makes
/// every participant holding it (including ones constructed later) route
/// through that store.
///
/// The registry only keeps a weak reference: the store is owned by whoever
/// bound it, and dropping it tears the tree down to local fallback state.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<Slot>>,
}

#[derive(Default)]
struct Slot {
    store: Option<Weak<dyn StateStore>>,
    /// Bumped whenever the attached store changes; local fallback slices
    /// written under an older generation are stale.
    generation: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> Option<SharedStore> {
        self.inner.read().store.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_bound(&self) -> bool {
        self.store().is_some()
    }

    /// A store was attached and has been dropped since, without `detach`.
    pub fn store_dropped(&self) -> bool {
        self.inner
            .read()
            .store
            .as_ref()
            .is_some_and(|store| store.strong_count() == 0)
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Attach `store`. Returns `false` when it is already attached.
    pub fn attach(&self, store: &SharedStore) -> bool {
        let mut slot = self.inner.write();
        let candidate = Arc::downgrade(store);
        if let Some(existing) = &slot.store {
            if existing.as_ptr() as *const () == candidate.as_ptr() as *const () {
                return false;
            }
        }
        slot.store = Some(candidate);
        slot.generation += 1;
        true
    }

    /// Forget the attached store; participants fall back to fresh local state.
    pub fn detach(&self) {
        let mut slot = self.inner.write();
        if slot.store.take().is_some() {
            slot.generation += 1;
        }
    }

    /// Read the slice at `scope` from the attached store, or `None` when
    /// no store is attached. A scope missing from the tree reads as `null`.
    pub fn read(&self, scope: &Scope) -> Option<Value> {
        let store = self.store()?;
        let tree = store.snapshot();
        let slice = scope.resolve(&tree).cloned().unwrap_or_else(|| {
            tracing::warn!(scope = %scope, "scope not found in store state");
            Value::Null
        });
        Some(slice)
    }

    pub fn same_as(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.inner.read();
        f.debug_struct("Registry")
            .field("bound", &slot.store.as_ref().is_some_and(|s| s.strong_count() > 0))
            .field("generation", &slot.generation)
            .finish()
    }
}
