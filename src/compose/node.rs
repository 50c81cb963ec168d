use serde_json::Value;

use crate::action::Action;
use crate::compose::{Subtree, UpdateFn};
use crate::container::Container;
use crate::scope::Scope;
use crate::store::SharedStore;

/// One entry of a composed tree.
///
/// Every node is explicitly tagged; nothing is inferred from the shape of
/// its state.
#[derive(Debug, Clone)]
pub enum Node {
    Container(Container),
    /// A self-contained update function. Never scoped.
    Update(UpdateFn),
    Subtree(Subtree),
}

impl Node {
    pub fn update<F>(f: F) -> Self
    where
        F: Fn(Option<Value>, &Action) -> Value + Send + Sync + 'static,
    {
        Self::Update(UpdateFn::new(f))
    }

    pub fn reduce(&self, state: Option<Value>, action: &Action) -> Value {
        match self {
            Node::Container(container) => container.reduce(state, action),
            Node::Update(update) => update.apply(state, action),
            Node::Subtree(subtree) => subtree.reduce(state, action),
        }
    }

    pub fn update_fn(&self) -> UpdateFn {
        match self {
            Node::Container(container) => container.update_fn(),
            Node::Update(update) => update.clone(),
            Node::Subtree(subtree) => subtree.update_fn(),
        }
    }

    pub fn initial_state(&self) -> Value {
        match self {
            Node::Container(container) => container.initial_state().clone(),
            Node::Update(update) => update.apply(None, &Action::init()),
            Node::Subtree(subtree) => subtree.initial_state(),
        }
    }

    /// State of this node as seen by its readers. Plain update functions
    /// have no memory of their own and report their initial state.
    pub fn current_state(&self) -> Value {
        match self {
            Node::Container(container) => container.current_slice(),
            Node::Update(update) => update.apply(None, &Action::init()),
            Node::Subtree(subtree) => subtree.current_state(),
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Node::Container(container) => Some(container),
            _ => None,
        }
    }

    pub fn as_subtree(&self) -> Option<&Subtree> {
        match self {
            Node::Subtree(subtree) => Some(subtree),
            _ => None,
        }
    }

    pub(crate) fn assign_scope(&self, scope: Scope) {
        match self {
            Node::Container(container) => container.assign_scope(scope),
            Node::Update(_) => {}
            Node::Subtree(subtree) => subtree.assign_scope(scope),
        }
    }

    /// Seed the local state of a node from a slice its parent committed.
    /// Plain update functions keep no state and ignore it.
    pub(crate) fn commit_local(&self, value: Value) {
        match self {
            Node::Container(container) => container.commit_local(value),
            Node::Update(_) => {}
            Node::Subtree(subtree) => {
                if let Value::Object(map) = &value {
                    subtree.commit_local(map);
                }
            }
        }
    }

    pub(crate) fn mount(&self, store: &SharedStore) {
        match self {
            Node::Container(container) => container.mount(store),
            Node::Update(_) => {}
            Node::Subtree(subtree) => subtree.mount(store),
        }
    }
}

impl From<Container> for Node {
    fn from(container: Container) -> Self {
        Node::Container(container)
    }
}

impl From<UpdateFn> for Node {
    fn from(update: UpdateFn) -> Self {
        Node::Update(update)
    }
}

impl From<Subtree> for Node {
    fn from(subtree: Subtree) -> Self {
        Node::Subtree(subtree)
    }
}
