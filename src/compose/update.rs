//! Plain state-update functions.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::action::Action;
use crate::container::Operation;
use crate::reducer::Reducer;

type UpdateFnInner = dyn Fn(Option<Value>, &Action) -> Value + Send + Sync;

/// A pure `(state, action) -> state` function with no identity.
///
/// `None` means the slice has not been initialised yet and the function
/// should produce its default.
#[derive(Clone)]
pub struct UpdateFn(Arc<UpdateFnInner>);

impl UpdateFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<Value>, &Action) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, state: Option<Value>, action: &Action) -> Value {
        (self.0)(state, action)
    }

    /// Unscoped update function matching only on action type.
    ///
    /// Unknown types return the state unchanged; `None` state becomes
    /// `default` (or `null`).
    pub fn from_operations<I, K>(operations: I, default: Option<Value>) -> Self
    where
        I: IntoIterator<Item = (K, Operation)>,
        K: Into<String>,
    {
        let operations: Vec<(String, Operation)> = operations
            .into_iter()
            .map(|(name, op)| (name.into(), op))
            .collect();
        let default = default.unwrap_or(Value::Null);

        Self::new(move |state, action| {
            let state = state.unwrap_or_else(|| default.clone());
            match operations.iter().find(|(name, _)| *name == action.kind) {
                Some((_, op)) => op.apply(state, action.payload_or_null()),
                None => state,
            }
        })
    }

    /// Lift a statically typed [`Reducer`] into the tree.
    ///
    /// The intent is decoded from `{ "type": ..., "payload": ... }`; actions
    /// that do not decode into `R::Intent` leave the slice untouched.
    pub fn from_reducer<R>() -> Self
    where
        R: Reducer + 'static,
    {
        Self::new(|state, action| {
            let (previous, current) = match state {
                None => {
                    let current = R::State::default();
                    match serde_json::to_value(&current) {
                        Ok(previous) => (previous, current),
                        Err(err) => {
                            tracing::warn!(error = %err, "default reducer state is not serialisable");
                            return Value::Null;
                        }
                    }
                }
                Some(previous) => match <R::State as Deserialize>::deserialize(&previous) {
                    Ok(current) => (previous, current),
                    Err(err) => {
                        tracing::warn!(error = %err, "slice does not match reducer state type");
                        return previous;
                    }
                },
            };

            let mut envelope = Map::new();
            envelope.insert("type".to_string(), Value::String(action.kind.clone()));
            if let Some(payload) = &action.payload {
                envelope.insert("payload".to_string(), payload.clone());
            }
            let Ok(intent) = <R::Intent as Deserialize>::deserialize(Value::Object(envelope)) else {
                return previous;
            };

            let next = R::reduce(current.clone(), intent);
            if next == current {
                return previous;
            }
            serde_json::to_value(next).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "reducer produced an unserialisable state");
                previous
            })
        })
    }
}

impl fmt::Debug for UpdateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UpdateFn(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn counter() -> UpdateFn {
        UpdateFn::from_operations(
            [
                ("increment", Operation::new(|s, _| json!(s.as_i64().unwrap_or(0) + 1))),
                ("decrement", Operation::new(|s, _| json!(s.as_i64().unwrap_or(0) - 1))),
            ],
            None,
        )
    }

    #[test]
    fn from_operations_without_default() {
        let reduce = counter();
        assert_eq!(reduce.apply(None, &Action::new("UNHANDLED")), Value::Null);
        assert_eq!(reduce.apply(Some(Value::Null), &Action::new("UNHANDLED")), Value::Null);
        assert_eq!(reduce.apply(Some(json!(10)), &Action::new("UNHANDLED")), json!(10));
        assert_eq!(reduce.apply(Some(json!(0)), &Action::new("increment")), json!(1));
        assert_eq!(reduce.apply(Some(json!(10)), &Action::new("decrement")), json!(9));
    }

    #[test]
    fn from_operations_with_default() {
        let reduce = UpdateFn::from_operations(
            [("increment", Operation::new(|s, _| json!(s.as_i64().unwrap_or(0) + 1)))],
            Some(json!(1000)),
        );
        assert_eq!(reduce.apply(None, &Action::new("UNHANDLED")), json!(1000));
    }

    #[test]
    fn from_operations_ignores_scope() {
        let reduce = counter();
        let action = Action::new("increment").with_scope("somewhere.else");
        assert_eq!(reduce.apply(Some(json!(1)), &action), json!(2));
    }
}
