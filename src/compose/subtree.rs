use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::action::Action;
use crate::compose::{Node, UpdateFn};
use crate::container::Container;
use crate::error::ConfigurationError;
use crate::scope::{validate_key, Scope};
use crate::store::{Registry, SharedStore};

/// A named set of nodes reduced together into one object slice.
///
/// A subtree is the composer's output: it can be handed to a store through
/// [`Subtree::update_fn`] or nested inside another subtree, in which case its
/// descendants are re-scoped under the new key.
///
/// Cloning a `Subtree` clones a handle; all clones share children and scope.
#[derive(Clone)]
pub struct Subtree {
    inner: Arc<SubtreeInner>,
}

struct SubtreeInner {
    entries: Vec<(String, Node)>,
    scope: RwLock<Scope>,
    registry: Registry,
}

impl Subtree {
    /// Combine `entries` with a private registry.
    ///
    /// # Errors
    /// `EmptyChildren` for no entries, `InvalidChildName` for keys that are
    /// empty or dotted, `DuplicateChild` for repeated keys.
    pub fn new<I, K>(entries: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        Self::with_registry(entries, Registry::new())
    }

    /// Combine `entries`, reading bound state through `registry`.
    pub fn with_registry<I, K>(entries: I, registry: Registry) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        let entries: Vec<(String, Node)> = entries
            .into_iter()
            .map(|(key, node)| (key.into(), node))
            .collect();

        if entries.is_empty() {
            return Err(ConfigurationError::EmptyChildren);
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for (key, _) in &entries {
            validate_key(key)?;
            if !seen.insert(key.as_str()) {
                return Err(ConfigurationError::DuplicateChild { name: key.clone() });
            }
        }

        let subtree = Self {
            inner: Arc::new(SubtreeInner {
                entries,
                scope: RwLock::new(Scope::root()),
                registry,
            }),
        };
        subtree.assign_scope(Scope::root());
        Ok(subtree)
    }

    pub fn scope(&self) -> Scope {
        self.inner.scope.read().clone()
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.inner.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn child(&self, key: &str) -> Option<&Node> {
        self.nodes()
            .find(|(name, _)| *name == key)
            .map(|(_, node)| node)
    }

    pub fn container(&self, key: &str) -> Option<&Container> {
        self.child(key).and_then(Node::as_container)
    }

    pub fn subtree(&self, key: &str) -> Option<&Subtree> {
        self.child(key).and_then(Node::as_subtree)
    }

    /// Find a descendant by its dotted path relative to this subtree.
    ///
    /// Descends through nested subtrees and through the children of
    /// containers.
    pub fn lookup(&self, path: &str) -> Option<&Node> {
        let mut segments = path.split(crate::scope::SEPARATOR);
        let mut node = self.child(segments.next()?)?;
        for segment in segments {
            node = match node {
                Node::Subtree(subtree) => subtree.child(segment)?,
                Node::Container(container) => container.children()?.child(segment)?,
                Node::Update(_) => return None,
            };
        }
        Some(node)
    }

    /// Recompute every child from its own slice of `state`.
    ///
    /// Every child runs on every action. Keys no child owns are dropped.
    pub fn reduce(&self, state: Option<Value>, action: &Action) -> Value {
        let mut previous = match state {
            Some(Value::Object(map)) => map,
            None | Some(Value::Null) => Map::new(),
            Some(other) => {
                tracing::debug!(
                    scope = %self.scope(),
                    found = %other,
                    "subtree state is not an object, reinitialising"
                );
                Map::new()
            }
        };

        let mut next = Map::with_capacity(self.inner.entries.len());
        for (key, node) in &self.inner.entries {
            let slice = previous.remove(key);
            next.insert(key.clone(), node.reduce(slice, action));
        }

        if !previous.is_empty() {
            tracing::debug!(
                scope = %self.scope(),
                keys = ?previous.keys().collect::<Vec<_>>(),
                "dropping keys no child owns"
            );
        }
        Value::Object(next)
    }

    /// Reduce the children in place inside a parent's object slice.
    pub(crate) fn reduce_into(&self, map: &mut Map<String, Value>, action: &Action) {
        for (key, node) in &self.inner.entries {
            match map.get_mut(key) {
                Some(slot) => {
                    let previous = std::mem::take(slot);
                    *slot = node.reduce(Some(previous), action);
                }
                None => {
                    map.insert(key.clone(), node.reduce(None, action));
                }
            }
        }
    }

    pub fn update_fn(&self) -> UpdateFn {
        let subtree = self.clone();
        UpdateFn::new(move |state, action| subtree.reduce(state, action))
    }

    pub fn initial_state(&self) -> Value {
        Value::Object(
            self.nodes()
                .map(|(key, node)| (key.to_string(), node.initial_state()))
                .collect(),
        )
    }

    /// Bound: this subtree's scope of the store state. Unbound: assembled
    /// from the children's own state.
    pub fn current_state(&self) -> Value {
        if let Some(state) = self.inner.registry.read(&self.scope()) {
            return state;
        }
        Value::Object(
            self.nodes()
                .map(|(key, node)| (key.to_string(), node.current_state()))
                .collect(),
        )
    }

    /// Hand each owned key of `map` down to its child's local state.
    pub(crate) fn commit_local(&self, map: &Map<String, Value>) {
        for (key, node) in &self.inner.entries {
            if let Some(value) = map.get(key) {
                node.commit_local(value.clone());
            }
        }
    }

    pub(crate) fn assign_scope(&self, scope: Scope) {
        for (key, node) in &self.inner.entries {
            node.assign_scope(scope.child(key));
        }
        *self.inner.scope.write() = scope;
    }

    pub(crate) fn mount(&self, store: &SharedStore) {
        self.inner.registry.attach(store);
        for (_, node) in &self.inner.entries {
            node.mount(store);
        }
    }
}

impl fmt::Debug for Subtree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subtree")
            .field("scope", &self.scope())
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Combine named nodes into one subtree.
pub fn combine<I, K>(entries: I) -> Result<Subtree, ConfigurationError>
where
    I: IntoIterator<Item = (K, Node)>,
    K: Into<String>,
{
    Subtree::new(entries)
}
