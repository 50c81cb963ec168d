//! Declarative container configuration.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lifecycle::{LifecycleEvent, Observer};
use super::operation::Operation;
use super::Container;
use crate::compose::Subtree;
use crate::error::ConfigurationError;
use crate::store::Registry;

/// How a container reports action types it does not declare when the
/// action is addressed to its own scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Ignore silently.
    #[default]
    Silent,
    /// Ignore, logging a warning.
    Warn,
}

/// Everything needed to construct a [`Container`].
///
/// Missing fields can be filled from a reusable template with
/// [`ContainerConfig::or_defaults`].
#[derive(Clone, Default)]
pub struct ContainerConfig {
    pub initial_state: Option<Value>,
    pub operations: Option<Vec<(String, Operation)>>,
    pub children: Option<Subtree>,
    pub global: Option<bool>,
    pub strictness: Option<Strictness>,
    pub observers: Vec<Observer>,
    pub registry: Option<Registry>,
}

impl ContainerConfig {
    /// Fill every field left unset from `defaults`. Explicit values win;
    /// the template's observers run before this config's own.
    pub fn or_defaults(mut self, defaults: &ContainerConfig) -> Self {
        self.initial_state = self.initial_state.or_else(|| defaults.initial_state.clone());
        self.operations = self.operations.or_else(|| defaults.operations.clone());
        self.children = self.children.or_else(|| defaults.children.clone());
        self.global = self.global.or(defaults.global);
        self.strictness = self.strictness.or(defaults.strictness);
        self.registry = self.registry.or_else(|| defaults.registry.clone());
        if !defaults.observers.is_empty() {
            let own = std::mem::take(&mut self.observers);
            self.observers = defaults.observers.iter().cloned().chain(own).collect();
        }
        self
    }
}

impl fmt::Debug for ContainerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerConfig")
            .field("initial_state", &self.initial_state)
            .field(
                "operations",
                &self
                    .operations
                    .as_ref()
                    .map(|ops| ops.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>()),
            )
            .field("children", &self.children)
            .field("global", &self.global)
            .field("strictness", &self.strictness)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Builder sugar over [`ContainerConfig`].
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    config: ContainerConfig,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_state(mut self, state: Value) -> Self {
        self.config.initial_state = Some(state);
        self
    }

    /// Declare one operation.
    pub fn operation<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value, &Value) -> Value + Send + Sync + 'static,
    {
        self.with_operation(name, Operation::new(f))
    }

    /// Declare one operation over typed slice and payload.
    pub fn typed_operation<S, P, F>(self, name: impl Into<String>, f: F) -> Self
    where
        S: Serialize + DeserializeOwned,
        P: DeserializeOwned,
        F: Fn(S, P) -> S + Send + Sync + 'static,
    {
        self.with_operation(name, Operation::typed(f))
    }

    pub fn with_operation(mut self, name: impl Into<String>, operation: Operation) -> Self {
        self.config
            .operations
            .get_or_insert_with(Vec::new)
            .push((name.into(), operation));
        self
    }

    /// Replace the declared operations wholesale. An empty set is kept as
    /// given and rejected by `build`.
    pub fn operations<I, K>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = (K, Operation)>,
        K: Into<String>,
    {
        self.config.operations = Some(
            operations
                .into_iter()
                .map(|(name, op)| (name.into(), op))
                .collect(),
        );
        self
    }

    pub fn children(mut self, children: Subtree) -> Self {
        self.config.children = Some(children);
        self
    }

    /// React to matching action types regardless of scope.
    pub fn global(mut self) -> Self {
        self.config.global = Some(true);
        self
    }

    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.config.strictness = Some(strictness);
        self
    }

    pub fn observe<F>(mut self, observer: F) -> Self
    where
        F: Fn(&LifecycleEvent<'_>) + Send + Sync + 'static,
    {
        self.config.observers.push(Arc::new(observer));
        self
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.config.registry = Some(registry);
        self
    }

    /// Fill unset fields from a template config.
    pub fn defaults(mut self, defaults: &ContainerConfig) -> Self {
        self.config = self.config.or_defaults(defaults);
        self
    }

    pub fn into_config(self) -> ContainerConfig {
        self.config
    }

    pub fn build(self) -> Result<Container, ConfigurationError> {
        Container::new(self.config)
    }
}
