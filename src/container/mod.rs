//! Containers: addressable, independently updatable slices of the tree.
//!
//! A container owns an initial value and a set of named operations. Calling
//! an operation builds an [`Action`] scoped to the container and routes it to
//! the store when one is attached, or applies it to a local slice when not.
//! Readers see the same thing either way:
//!
//! ```text
//! invoke ──→ store attached? ──yes──→ dispatch ──→ update fn ──→ tree
//!                 │                                              │
//!                 no                               current_slice ◀┘ (scope walk)
//!                 ▼
//!            local slice ◀── current_slice
//! ```
//!
//! Re-entrant invocation (an operation invoking another while the store is
//! applying an update) is not allowed; the store rejects it.

mod config;
mod lifecycle;
mod operation;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::action::Action;
use crate::compose::{Node, Subtree, UpdateFn};
use crate::error::{ConfigurationError, DispatchError, RoutingError};
use crate::scope::Scope;
use crate::store::{Registry, SharedStore};

pub use config::{ContainerBuilder, ContainerConfig, Strictness};
pub use lifecycle::{LifecycleEvent, Observer};
pub use operation::Operation;

/// Handle to a container. Clones refer to the same container.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    initial_state: Value,
    /// Declaration order.
    names: Vec<String>,
    operations: HashMap<String, Operation>,
    children: Option<Subtree>,
    global: bool,
    strictness: Strictness,
    observers: Vec<Observer>,
    registry: Registry,
    scope: RwLock<Scope>,
    local: Mutex<LocalSlice>,
    /// Registry generation this container last ran mount events for.
    mounted: Mutex<Option<u64>>,
}

/// Fallback slice used while no store is attached.
#[derive(Default)]
struct LocalSlice {
    generation: u64,
    value: Option<Value>,
}

impl Container {
    /// Validate `config` and construct the container.
    ///
    /// # Errors
    /// Returns the first [`ConfigurationError`] found; nothing is
    /// constructed in that case.
    pub fn new(config: ContainerConfig) -> Result<Self, ConfigurationError> {
        let declared = match config.operations {
            None => return Err(ConfigurationError::MissingOperations),
            Some(ops) if ops.is_empty() => return Err(ConfigurationError::EmptyOperations),
            Some(ops) => ops,
        };

        let mut names = Vec::with_capacity(declared.len());
        let mut operations = HashMap::with_capacity(declared.len());
        for (name, op) in declared {
            if operations.insert(name.clone(), op).is_some() {
                return Err(ConfigurationError::DuplicateOperation { name });
            }
            names.push(name);
        }

        let initial_state = match &config.children {
            None => config
                .initial_state
                .ok_or(ConfigurationError::MissingInitialState)?,
            Some(children) => {
                if let Some(name) = children.keys().find(|key| operations.contains_key(*key)) {
                    return Err(ConfigurationError::ChildNameCollision {
                        name: name.to_string(),
                    });
                }
                let mut base = match config.initial_state {
                    None => Map::new(),
                    Some(Value::Object(map)) => map,
                    Some(other) => {
                        return Err(ConfigurationError::NonObjectParentState {
                            found: other.to_string(),
                        })
                    }
                };
                if let Value::Object(initial) = children.initial_state() {
                    base.extend(initial);
                }
                Value::Object(base)
            }
        };

        let container = Self {
            inner: Arc::new(ContainerInner {
                initial_state,
                names,
                operations,
                children: config.children,
                global: config.global.unwrap_or(false),
                strictness: config.strictness.unwrap_or_default(),
                observers: config.observers,
                registry: config.registry.unwrap_or_default(),
                scope: RwLock::new(Scope::root()),
                local: Mutex::new(LocalSlice::default()),
                mounted: Mutex::new(None),
            }),
        };
        container.assign_scope(Scope::root());
        Ok(container)
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn scope(&self) -> Scope {
        self.inner.scope.read().clone()
    }

    pub fn initial_state(&self) -> &Value {
        &self.inner.initial_state
    }

    pub fn is_global(&self) -> bool {
        self.inner.global
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn children(&self) -> Option<&Subtree> {
        self.inner.children.as_ref()
    }

    /// Operation names in declaration order.
    pub fn operation_names(&self) -> &[String] {
        &self.inner.names
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.inner.operations.contains_key(name)
    }

    /// Callable bound to this container for the operation `name`.
    pub fn operation(&self, name: &str) -> Option<OperationHandle> {
        self.has_operation(name).then(|| OperationHandle {
            container: self.clone(),
            name: name.to_string(),
        })
    }

    pub fn same_as(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Build the request for `name` without routing it.
    pub fn action(&self, name: &str, payload: Option<Value>) -> Action {
        Action {
            kind: name.to_string(),
            scope: self.scope().to_action_scope(),
            payload,
        }
    }

    /// Apply the operation `name` to this container's slice.
    ///
    /// Routes through the attached store if there is one, otherwise updates
    /// the local slice. Either way the update is visible to
    /// [`Container::current_slice`] when this returns.
    ///
    /// # Errors
    /// `Routing` if the container declares no such operation, `Invariant`
    /// if the store is in the middle of applying another update.
    pub fn invoke(&self, name: &str, payload: Option<Value>) -> Result<(), DispatchError> {
        if !self.has_operation(name) {
            return Err(RoutingError::UnknownOperation {
                operation: name.to_string(),
                scope: self.scope().to_string(),
            }
            .into());
        }

        let action = self.action(name, payload);
        self.notify(&LifecycleEvent::WillDispatch(&action));

        match self.inner.registry.store() {
            Some(store) => {
                store.dispatch(action.clone())?;
            }
            None => {
                if self.inner.registry.store_dropped() {
                    tracing::warn!(
                        scope = %self.scope(),
                        operation = name,
                        "store was dropped; applying to local state"
                    );
                }
                let next = self.reduce(Some(self.local_slice()), &action);
                self.commit_local(next);
            }
        }

        self.notify(&LifecycleEvent::DidDispatch(&action));
        Ok(())
    }

    /// The most recently committed value of this container's slice.
    pub fn current_slice(&self) -> Value {
        match self.inner.registry.read(&self.scope()) {
            Some(slice) => slice,
            None => self.local_slice(),
        }
    }

    /// [`Container::current_slice`] decoded into `T`.
    pub fn current_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.current_slice())
    }

    /// Update function for this container (and its children, if any).
    pub fn update_fn(&self) -> UpdateFn {
        let container = self.clone();
        UpdateFn::new(move |state, action| container.reduce(state, action))
    }

    pub(crate) fn reduce(&self, state: Option<Value>, action: &Action) -> Value {
        let slice = state.unwrap_or_else(|| self.inner.initial_state.clone());
        let scope = self.scope();

        let slice = if self.inner.global || scope.accepts(action.scope.as_deref()) {
            match self.inner.operations.get(&action.kind) {
                Some(operation) => self.apply(operation, slice, action),
                None => {
                    self.report_unknown(&scope, action);
                    slice
                }
            }
        } else {
            slice
        };

        match (&self.inner.children, slice) {
            (Some(children), Value::Object(mut map)) => {
                children.reduce_into(&mut map, action);
                Value::Object(map)
            }
            (Some(_), other) => {
                tracing::warn!(
                    scope = %scope,
                    found = %other,
                    "container with children holds a non-object slice; children skipped"
                );
                other
            }
            (None, slice) => slice,
        }
    }

    fn apply(&self, operation: &Operation, slice: Value, action: &Action) -> Value {
        self.notify(&LifecycleEvent::WillReduce {
            action,
            slice: &slice,
        });
        let next = operation.apply(slice, action.payload_or_null());
        self.notify(&LifecycleEvent::DidReduce {
            action,
            slice: &next,
        });
        next
    }

    fn report_unknown(&self, scope: &Scope, action: &Action) {
        let addressed_here = !scope.is_root() && action.scope.as_deref() == Some(scope.as_str());
        if self.inner.strictness == Strictness::Warn && addressed_here {
            tracing::warn!(
                scope = %scope,
                action_type = %action.kind,
                "action addressed to container matches no operation"
            );
        }
    }

    fn local_slice(&self) -> Value {
        let generation = self.inner.registry.generation();
        let own = {
            let local = self.inner.local.lock();
            match &local.value {
                Some(value) if local.generation == generation => value.clone(),
                _ => self.inner.initial_state.clone(),
            }
        };

        match (&self.inner.children, own) {
            (Some(children), Value::Object(mut map)) => {
                for (key, node) in children.nodes() {
                    if matches!(node, Node::Update(_)) {
                        continue;
                    }
                    map.insert(key.to_string(), node.current_state());
                }
                Value::Object(map)
            }
            (_, own) => own,
        }
    }

    /// Replace the local slice and hand each child key down to its child,
    /// so later reads through the children agree with this slice.
    pub(crate) fn commit_local(&self, value: Value) {
        if let (Some(children), Value::Object(map)) = (&self.inner.children, &value) {
            children.commit_local(map);
        }
        let generation = self.inner.registry.generation();
        *self.inner.local.lock() = LocalSlice {
            generation,
            value: Some(value),
        };
    }

    fn notify(&self, event: &LifecycleEvent<'_>) {
        for observer in &self.inner.observers {
            observer(event);
        }
    }

    pub(crate) fn assign_scope(&self, scope: Scope) {
        if let Some(children) = &self.inner.children {
            children.assign_scope(scope.clone());
        }
        *self.inner.scope.write() = scope;
    }

    /// Attach `store` and run mount events once per attached store.
    pub(crate) fn mount(&self, store: &SharedStore) {
        self.inner.registry.attach(store);
        let generation = self.inner.registry.generation();
        let fresh = {
            let mut mounted = self.inner.mounted.lock();
            let fresh = *mounted != Some(generation);
            *mounted = Some(generation);
            fresh
        };

        if fresh {
            self.notify(&LifecycleEvent::WillMount);
        }
        if let Some(children) = &self.inner.children {
            children.mount(store);
        }
        if fresh {
            self.notify(&LifecycleEvent::DidMount);
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("scope", &self.scope())
            .field("operations", &self.inner.names)
            .field("global", &self.inner.global)
            .field("children", &self.inner.children)
            .finish()
    }
}

/// One operation of one container, callable without naming it again.
#[derive(Debug, Clone)]
pub struct OperationHandle {
    container: Container,
    name: String,
}

impl OperationHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, payload: Option<Value>) -> Result<(), DispatchError> {
        self.container.invoke(&self.name, payload)
    }

    pub fn action(&self, payload: Option<Value>) -> Action {
        self.container.action(&self.name, payload)
    }
}
