//! Declarative trees loaded from TOML.
//!
//! A manifest describes a tree of containers whose operations name
//! transforms from an [`OperationCatalog`]:
//!
//! ```toml
//! [tree.counterA]
//! initial_state = 0
//! operations = { increment = "increment", decrement = "decrement" }
//!
//! [tree.filter]
//! initial_state = "SHOW_ALL"
//! strictness = "warn"
//! operations = { setVisibilityFilter = "set" }
//!
//! # A table without `operations` or `initial_state` is a subtree.
//! [tree.outer.inner.counter]
//! initial_state = 0
//! operations = { increment = "increment" }
//! ```
//!
//! Every node of a manifest shares one [`Registry`].

mod catalog;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::{Table, Value as TomlValue};

use crate::compose::{Node, Subtree};
use crate::container::{Container, ContainerConfig, Operation, Strictness};
use crate::error::ConfigurationError;
use crate::scope::Scope;
use crate::store::Registry;

pub use catalog::OperationCatalog;

const CONTAINER_FIELDS: &[&str] = &[
    "initial_state",
    "operations",
    "children",
    "global",
    "strictness",
];

/// Errors that can occur when loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Manifest has no [tree] table")]
    MissingTree,

    #[error("Manifest entry '{path}' must be a table")]
    NotATable { path: String },

    #[error("Manifest entry '{path}' has unknown field '{field}'")]
    UnknownField { path: String, field: String },

    #[error("Manifest entry '{path}': field '{field}' is invalid: {message}")]
    InvalidField {
        path: String,
        field: String,
        message: String,
    },

    #[error("Operation '{operation}' at '{path}' refers to unknown transform '{transform}'")]
    UnknownTransform {
        path: String,
        operation: String,
        transform: String,
    },

    #[error("Invalid container at '{path}': {source}")]
    Configuration {
        path: String,
        #[source]
        source: ConfigurationError,
    },
}

/// A tree built from a manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    root: Subtree,
    registry: Registry,
}

impl Manifest {
    /// Returns the default manifest path.
    ///
    /// Uses `~/.config/reduxable/manifest.toml` on Unix/macOS, or the
    /// equivalent via `dirs::config_dir()`. Falls back to the current
    /// directory if there is no config directory.
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("reduxable").join("manifest.toml")
    }

    pub fn load(path: &Path, catalog: &OperationCatalog) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path, catalog)
    }

    pub fn from_toml_str(content: &str, catalog: &OperationCatalog) -> Result<Self, ManifestError> {
        Self::parse(content, Path::new("<inline>"), catalog)
    }

    fn parse(content: &str, path: &Path, catalog: &OperationCatalog) -> Result<Self, ManifestError> {
        let document: Table = toml::from_str(content).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        let tree = match document.get("tree") {
            None => return Err(ManifestError::MissingTree),
            Some(TomlValue::Table(tree)) => tree,
            Some(_) => {
                return Err(ManifestError::NotATable {
                    path: "tree".to_string(),
                })
            }
        };

        let builder = TreeBuilder {
            catalog,
            registry: Registry::new(),
        };
        let root = builder.subtree(tree, &Scope::root())?;
        Ok(Self {
            root,
            registry: builder.registry,
        })
    }

    pub fn root(&self) -> &Subtree {
        &self.root
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn into_root(self) -> Subtree {
        self.root
    }
}

struct TreeBuilder<'a> {
    catalog: &'a OperationCatalog,
    registry: Registry,
}

impl TreeBuilder<'_> {
    fn subtree(&self, table: &Table, scope: &Scope) -> Result<Subtree, ManifestError> {
        let mut entries = Vec::with_capacity(table.len());
        for (key, value) in table {
            let child_scope = scope.child(key);
            let TomlValue::Table(child) = value else {
                return Err(ManifestError::NotATable {
                    path: child_scope.to_string(),
                });
            };
            entries.push((key.clone(), self.node(child, &child_scope)?));
        }

        Subtree::with_registry(entries, self.registry.clone()).map_err(|source| {
            ManifestError::Configuration {
                path: display_path(scope),
                source,
            }
        })
    }

    fn node(&self, table: &Table, scope: &Scope) -> Result<Node, ManifestError> {
        let declares_container = table.contains_key("operations") || table.contains_key("initial_state");
        if !declares_container {
            return Ok(self.subtree(table, scope)?.into());
        }
        Ok(self.container(table, scope)?.into())
    }

    fn container(&self, table: &Table, scope: &Scope) -> Result<Container, ManifestError> {
        let path = scope.to_string();
        if let Some(field) = table.keys().find(|k| !CONTAINER_FIELDS.contains(&k.as_str())) {
            return Err(ManifestError::UnknownField {
                path,
                field: field.clone(),
            });
        }

        let invalid = |field: &str, message: String| ManifestError::InvalidField {
            path: path.clone(),
            field: field.to_string(),
            message,
        };

        let initial_state = table
            .get("initial_state")
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| invalid("initial_state", e.to_string()))?;

        let operations = match table.get("operations") {
            None => None,
            Some(TomlValue::Table(ops)) => Some(self.operations(ops, &path)?),
            Some(other) => {
                return Err(ManifestError::Configuration {
                    path,
                    source: ConfigurationError::WrongOperationsType {
                        found: other.to_string(),
                    },
                })
            }
        };

        let children = match table.get("children") {
            None => None,
            Some(TomlValue::Table(children)) => Some(self.subtree(children, scope)?),
            Some(_) => return Err(invalid("children", "expected a table".to_string())),
        };

        let global = match table.get("global") {
            None => None,
            Some(TomlValue::Boolean(flag)) => Some(*flag),
            Some(other) => return Err(invalid("global", format!("expected a boolean, found {other}"))),
        };

        let strictness = table
            .get("strictness")
            .map(|value| value.clone().try_into::<Strictness>())
            .transpose()
            .map_err(|e| invalid("strictness", e.to_string()))?;

        let config = ContainerConfig {
            initial_state,
            operations,
            children,
            global,
            strictness,
            observers: Vec::new(),
            registry: Some(self.registry.clone()),
        };
        Container::new(config).map_err(|source| ManifestError::Configuration { path, source })
    }

    fn operations(&self, table: &Table, path: &str) -> Result<Vec<(String, Operation)>, ManifestError> {
        table
            .iter()
            .map(|(name, transform)| {
                let TomlValue::String(transform) = transform else {
                    return Err(ManifestError::InvalidField {
                        path: path.to_string(),
                        field: format!("operations.{name}"),
                        message: format!("expected a transform name, found {transform}"),
                    });
                };
                let operation = self.catalog.get(transform).cloned().ok_or_else(|| {
                    ManifestError::UnknownTransform {
                        path: path.to_string(),
                        operation: name.clone(),
                        transform: transform.clone(),
                    }
                })?;
                Ok((name.clone(), operation))
            })
            .collect()
    }
}

fn display_path(scope: &Scope) -> String {
    if scope.is_root() {
        "tree".to_string()
    } else {
        scope.to_string()
    }
}
