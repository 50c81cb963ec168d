//! Lifecycle observers.
//!
//! Observers are registered at construction and run in registration order
//! at fixed points of the commit pipeline:
//!
//! ```text
//! bind ──→ WillMount (parent, then children) ──→ DidMount (children, then parent)
//!
//! invoke ──→ WillDispatch ──→ [store] ──→ WillReduce ──→ op ──→ DidReduce ──→ DidDispatch
//! ```
//!
//! `WillReduce`/`DidReduce` only fire when an operation actually runs for
//! this container; ignored actions are silent.

use std::sync::Arc;

use serde_json::Value;

use crate::action::Action;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LifecycleEvent<'a> {
    WillMount,
    DidMount,
    /// Before a request built by this container is routed.
    WillDispatch(&'a Action),
    /// After the request has been applied and committed.
    DidDispatch(&'a Action),
    /// Before an operation recomputes this container's slice.
    WillReduce { action: &'a Action, slice: &'a Value },
    /// After the slice has been recomputed, before it is committed.
    DidReduce { action: &'a Action, slice: &'a Value },
}

impl LifecycleEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::WillMount => "will_mount",
            LifecycleEvent::DidMount => "did_mount",
            LifecycleEvent::WillDispatch(_) => "will_dispatch",
            LifecycleEvent::DidDispatch(_) => "did_dispatch",
            LifecycleEvent::WillReduce { .. } => "will_reduce",
            LifecycleEvent::DidReduce { .. } => "did_reduce",
        }
    }
}

pub type Observer = Arc<dyn Fn(&LifecycleEvent<'_>) + Send + Sync>;
