//! Update requests routed through the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type of the action the reference store dispatches when it is created, so
/// every slice gets a chance to initialise itself.
pub const INIT_ACTION_TYPE: &str = "@@reduxable/INIT";

/// A request to apply the operation `kind` to the container at `scope`.
///
/// Serialises to `{ "type": ..., "scope"?: ..., "payload"?: ... }`.
/// An absent scope addresses the root of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Action {
    /// An unscoped action without payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            scope: None,
            payload: None,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub(crate) fn init() -> Self {
        Self::new(INIT_ACTION_TYPE)
    }

    /// Payload handed to operations; `Null` when the action carries none.
    pub fn payload_or_null(&self) -> &Value {
        self.payload.as_ref().unwrap_or(&Value::Null)
    }
}
