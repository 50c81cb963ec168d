//! Wiring a tree to a store.
//!
//! [`bind`] derives the root's update function, builds the store with it and
//! attaches the store to every container and subtree of the tree, so that
//! their operations route through it from then on.

use std::sync::Arc;

use crate::compose::{Node, UpdateFn};
use crate::store::{SharedStore, StateStore};

/// Construct a store for `root` and attach it to the whole tree.
///
/// `create` receives the combined update function; any further store
/// arguments (preloaded state, enhancer) are captured by the closure:
///
/// ```ignore
/// let store = bind(tree.clone(), |update| {
///     CentralStore::new(update, StoreOptions { preloaded_state, enhancer: None })
/// });
/// ```
#[must_use = "the tree only holds the store weakly; dropping it unbinds the tree"]
pub fn bind<S, F>(root: impl Into<Node>, create: F) -> Arc<S>
where
    S: StateStore + 'static,
    F: FnOnce(UpdateFn) -> S,
{
    let root = root.into();
    let store = Arc::new(create(root.update_fn()));
    attach(&root, &store);
    store
}

/// Attach an existing store to every participant of `root`.
///
/// Attaching the store a tree is already bound to changes nothing.
/// Attaching a different one discards all local fallback slices.
pub fn attach<S>(root: &Node, store: &Arc<S>)
where
    S: StateStore + 'static,
{
    let shared: SharedStore = store.clone();
    root.mount(&shared);
    tracing::info!(root = ?root, "store attached");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::Subtree;
    use crate::container::{Container, LifecycleEvent};
    use crate::store::CentralStore;
    use parking_lot::Mutex;
    use serde_json::json;

    fn counter() -> Container {
        Container::builder()
            .initial_state(json!(0))
            .operation("increment", |s, _| json!(s.as_i64().unwrap_or(0) + 1))
            .build()
            .unwrap()
    }

    #[test]
    fn bind_routes_invocations_through_the_store() {
        let counter = counter();
        let store = bind(counter.clone(), CentralStore::create);
        assert_eq!(store.get_state(), json!(0));

        counter.invoke("increment", None).unwrap();
        assert_eq!(store.get_state(), json!(1));
        assert_eq!(counter.current_slice(), json!(1));
    }

    #[test]
    fn bound_tree_ignores_stale_local_state() {
        let counter = counter();
        counter.invoke("increment", None).unwrap();
        counter.invoke("increment", None).unwrap();
        assert_eq!(counter.current_slice(), json!(2));

        let store = bind(counter.clone(), CentralStore::create);
        assert_eq!(counter.current_slice(), json!(0));

        counter.registry().detach();
        assert_eq!(counter.current_slice(), json!(0));
        drop(store);
    }

    #[test]
    fn reattaching_the_same_store_is_idempotent() {
        let events = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let counter = Container::builder()
            .initial_state(json!(0))
            .operation("increment", |s, _| json!(s.as_i64().unwrap_or(0) + 1))
            .observe(move |event| sink.lock().push(event.name()))
            .build()
            .unwrap();

        let tree = Node::from(Subtree::new([("counter", Node::from(counter.clone()))]).unwrap());
        let store = bind(tree.clone(), CentralStore::create);
        attach(&tree, &store);

        counter.invoke("increment", None).unwrap();
        assert_eq!(store.get_state(), json!({ "counter": 1 }));
        assert_eq!(
            *events.lock(),
            vec![
                LifecycleEvent::WillMount.name(),
                LifecycleEvent::DidMount.name(),
                "will_dispatch",
                "will_reduce",
                "did_reduce",
                "did_dispatch",
            ]
        );
    }
}
