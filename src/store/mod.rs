//! The central store boundary.
//!
//! Containers never write to the tree directly: every write is an
//! [`Action`] handed to [`StateStore::dispatch`], which applies the
//! combined update function synchronously before notifying listeners.

mod central;
mod registry;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::action::Action;
use crate::error::InvariantViolation;

pub use central::{CentralStore, Enhancer, StoreOptions};
pub use registry::Registry;

pub type Listener = Arc<dyn Fn() + Send + Sync>;

pub type SharedStore = Arc<dyn StateStore>;

/// A store holding the whole state tree.
pub trait StateStore: Send + Sync {
    /// The last committed tree.
    fn get_state(&self) -> Value;

    /// The last committed tree as a shared handle. Stores that keep their
    /// tree behind an `Arc` hand it out without copying.
    fn snapshot(&self) -> Arc<Value> {
        Arc::new(self.get_state())
    }

    /// Apply `action` and notify listeners before returning.
    ///
    /// # Errors
    /// `ReentrantDispatch` when called from inside an update function.
    fn dispatch(&self, action: Action) -> Result<Action, InvariantViolation>;

    fn subscribe(&self, listener: Listener) -> Subscription;
}

/// Handle returned by [`StateStore::subscribe`].
///
/// Dropping it keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[must_use = "dropping a Subscription does not unsubscribe"]
pub struct Subscription {
    unsubscribe: Box<dyn FnOnce() + Send>,
}

impl Subscription {
    pub fn new<F>(unsubscribe: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            unsubscribe: Box::new(unsubscribe),
        }
    }

    pub fn unsubscribe(self) {
        (self.unsubscribe)();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subscription(..)")
    }
}
