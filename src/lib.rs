//! Scoped, composable state containers over a single central store.
//!
//! A [`Container`] bundles an initial slice with named operations. Trees of
//! containers are combined into one update function with [`combine`], and
//! [`bind`] wires that function into a [`StateStore`]. Each container only
//! reacts to actions carrying its own dotted scope, so the same container
//! shape can be mounted at many places in one tree.
//!
//! ```text
//!  container.invoke("increment")
//!        │
//!        ▼
//!  Action { type: "increment", scope: "outer.inner.counter" }
//!        │  store.dispatch
//!        ▼
//!  root Subtree ──→ outer ──→ inner ──→ counter (scope matches, runs)
//! ```

pub mod action;
pub mod binding;
pub mod compose;
pub mod container;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod reducer;
pub mod scope;
pub mod store;

pub use action::{Action, INIT_ACTION_TYPE};
pub use binding::{attach, bind};
pub use compose::{combine, Node, Subtree, UpdateFn};
pub use container::{
    Container, ContainerBuilder, ContainerConfig, LifecycleEvent, Operation, OperationHandle,
    Strictness,
};
pub use error::{ConfigurationError, DispatchError, InvariantViolation, RoutingError};
pub use manifest::{Manifest, ManifestError, OperationCatalog};
pub use reducer::{Intent, Reducer, SliceState};
pub use scope::Scope;
pub use store::{CentralStore, Registry, SharedStore, StateStore, StoreOptions, Subscription};
