use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

type Transform = dyn Fn(Value, &Value) -> Value + Send + Sync;

/// A pure transform `(slice, payload) -> new slice`.
///
/// The slice is passed by value: the caller has already given up the
/// previous value, so an operation can reuse it without affecting anyone.
/// `payload` is `null` when the request carried none.
#[derive(Clone)]
pub struct Operation(Arc<Transform>);

impl Operation {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Operation over typed slice and payload.
    ///
    /// A slice or payload that does not decode, or a result that does not
    /// encode, leaves the slice unchanged.
    pub fn typed<S, P, F>(f: F) -> Self
    where
        S: Serialize + DeserializeOwned,
        P: DeserializeOwned,
        F: Fn(S, P) -> S + Send + Sync + 'static,
    {
        Self::new(move |slice, payload| {
            let state = match <S as Deserialize>::deserialize(&slice) {
                Ok(state) => state,
                Err(err) => {
                    tracing::warn!(error = %err, "slice does not decode into the operation's state type");
                    return slice;
                }
            };
            let payload = match <P as Deserialize>::deserialize(payload) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::warn!(error = %err, "payload does not decode into the operation's payload type");
                    return slice;
                }
            };
            match serde_json::to_value(f(state, payload)) {
                Ok(next) => next,
                Err(err) => {
                    tracing::warn!(error = %err, "operation result does not encode");
                    slice
                }
            }
        })
    }

    pub fn apply(&self, slice: Value, payload: &Value) -> Value {
        (self.0)(slice, payload)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Operation(..)")
    }
}
