//! Reference implementation of [`StateStore`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::{Listener, StateStore, Subscription};
use crate::action::Action;
use crate::compose::UpdateFn;
use crate::error::InvariantViolation;

/// Wraps the update function before the store starts using it.
pub type Enhancer = Box<dyn FnOnce(UpdateFn) -> UpdateFn + Send>;

/// Extra arguments for [`CentralStore::new`].
#[derive(Default)]
pub struct StoreOptions {
    /// Tree handed to the update function on creation instead of nothing.
    pub preloaded_state: Option<Value>,
    pub enhancer: Option<Enhancer>,
}

type ListenerList = Mutex<Vec<(u64, Listener)>>;

/// A synchronous single-writer store.
///
/// Dispatches from different threads are serialised; a dispatch from inside
/// an update function is rejected.
pub struct CentralStore {
    update: UpdateFn,
    state: RwLock<Arc<Value>>,
    commit: Mutex<()>,
    dispatching: Mutex<Option<ThreadId>>,
    listeners: Arc<ListenerList>,
    next_listener: AtomicU64,
}

impl CentralStore {
    /// Create a store and initialise every slice with the init action.
    pub fn new(update: UpdateFn, options: StoreOptions) -> Self {
        let update = match options.enhancer {
            Some(enhance) => enhance(update),
            None => update,
        };
        let initial = update.apply(options.preloaded_state, &Action::init());

        Self {
            update,
            state: RwLock::new(Arc::new(initial)),
            commit: Mutex::new(()),
            dispatching: Mutex::new(None),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicU64::new(0),
        }
    }

    /// `new` without preloaded state or enhancer.
    pub fn create(update: UpdateFn) -> Self {
        Self::new(update, StoreOptions::default())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

/// Clears the dispatching marker even if an update function panics.
struct DispatchGuard<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock() = None;
    }
}

impl StateStore for CentralStore {
    fn get_state(&self) -> Value {
        self.state.read().as_ref().clone()
    }

    fn snapshot(&self) -> Arc<Value> {
        Arc::clone(&self.state.read())
    }

    fn dispatch(&self, action: Action) -> Result<Action, InvariantViolation> {
        let current = thread::current().id();
        if *self.dispatching.lock() == Some(current) {
            return Err(InvariantViolation::ReentrantDispatch {
                action_type: action.kind,
            });
        }

        {
            let _commit = self.commit.lock();
            *self.dispatching.lock() = Some(current);
            let _guard = DispatchGuard(&self.dispatching);

            // Readers keep seeing the committed tree while the update runs,
            // so the update gets its own copy.
            let previous = Value::clone(&self.state.read());
            let next = self.update.apply(Some(previous), &action);
            *self.state.write() = Arc::new(next);
        }

        tracing::debug!(
            action_type = %action.kind,
            scope = action.scope.as_deref().unwrap_or(""),
            "action committed"
        );

        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }

        Ok(action)
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, listener));

        let listeners: Weak<ListenerList> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.lock().retain(|(existing, _)| *existing != id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn counter_update() -> UpdateFn {
        UpdateFn::new(|state, action| {
            let count = state.and_then(|s| s.as_i64()).unwrap_or(0);
            match action.kind.as_str() {
                "INCREMENT" => json!(count + 1),
                _ => json!(count),
            }
        })
    }

    #[test]
    fn creation_initialises_state() {
        let store = CentralStore::create(counter_update());
        assert_eq!(store.get_state(), json!(0));
    }

    #[test]
    fn preloaded_state_wins_over_default() {
        let store = CentralStore::new(
            counter_update(),
            StoreOptions {
                preloaded_state: Some(json!(41)),
                enhancer: None,
            },
        );
        store.dispatch(Action::new("INCREMENT")).unwrap();
        assert_eq!(store.get_state(), json!(42));
    }

    #[test]
    fn enhancer_wraps_update() {
        let store = CentralStore::new(
            counter_update(),
            StoreOptions {
                preloaded_state: None,
                enhancer: Some(Box::new(|inner: UpdateFn| {
                    UpdateFn::new(move |state, action| {
                        let next = inner.apply(state, action);
                        json!(next.as_i64().unwrap_or(0) * 10)
                    })
                })),
            },
        );
        assert_eq!(store.get_state(), json!(0));
        store.dispatch(Action::new("INCREMENT")).unwrap();
        assert_eq!(store.get_state(), json!(10));
    }

    #[test]
    fn snapshots_share_the_committed_tree() {
        let store = CentralStore::create(counter_update());
        let before = store.snapshot();
        assert!(Arc::ptr_eq(&before, &store.snapshot()));

        store.dispatch(Action::new("INCREMENT")).unwrap();
        let after = store.snapshot();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(*before, json!(0));
        assert_eq!(*after, json!(1));
    }

    #[test]
    fn dispatch_returns_the_action() {
        let store = CentralStore::create(counter_update());
        let action = Action::new("INCREMENT").with_scope("a");
        assert_eq!(store.dispatch(action.clone()).unwrap(), action);
    }

    #[test]
    fn listeners_run_once_per_dispatch_until_unsubscribed() {
        let store = CentralStore::create(counter_update());
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let subscription = store.subscribe(Arc::new(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        }));

        store.dispatch(Action::new("INCREMENT")).unwrap();
        store.dispatch(Action::new("OTHER")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        subscription.unsubscribe();
        assert_eq!(store.listener_count(), 0);
        store.dispatch(Action::new("INCREMENT")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listener_sees_committed_state() {
        let store = Arc::new(CentralStore::create(counter_update()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let reader = Arc::downgrade(&store);
        let sink = Arc::clone(&seen);
        let _subscription = store.subscribe(Arc::new(move || {
            if let Some(store) = reader.upgrade() {
                sink.lock().push(store.get_state());
            }
        }));

        store.dispatch(Action::new("INCREMENT")).unwrap();
        assert_eq!(*seen.lock(), vec![json!(1)]);
    }

    #[test]
    fn reentrant_dispatch_is_rejected() {
        let slot: Arc<Mutex<Option<Weak<CentralStore>>>> = Arc::new(Mutex::new(None));
        let errors = Arc::new(Mutex::new(Vec::new()));

        let inner_slot = Arc::clone(&slot);
        let inner_errors = Arc::clone(&errors);
        let update = UpdateFn::new(move |state, action| {
            if action.kind == "NESTED" {
                let store = inner_slot.lock().as_ref().and_then(Weak::upgrade);
                if let Some(store) = store {
                    if let Err(err) = store.dispatch(Action::new("INNER")) {
                        inner_errors.lock().push(err);
                    }
                }
            }
            state.unwrap_or(json!(0))
        });

        let store = Arc::new(CentralStore::create(update));
        *slot.lock() = Some(Arc::downgrade(&store));

        store.dispatch(Action::new("NESTED")).unwrap();
        assert_eq!(
            *errors.lock(),
            vec![InvariantViolation::ReentrantDispatch {
                action_type: "INNER".to_string()
            }]
        );

        // The store is usable again afterwards.
        assert!(store.dispatch(Action::new("NESTED")).is_ok());
    }
}
