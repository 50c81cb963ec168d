//! Named transforms that manifests can refer to.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

use crate::container::Operation;

#[derive(Debug, Clone, Default)]
pub struct OperationCatalog {
    transforms: BTreeMap<String, Operation>,
}

impl OperationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in transforms:
    ///
    /// - `increment` / `decrement`: add or subtract the numeric payload (1 by default)
    /// - `set`: replace the slice with the payload
    /// - `toggle`: negate a boolean
    /// - `append`: push the payload onto an array
    /// - `merge`: shallow-merge an object payload into an object slice
    /// - `clear`: empty an array, object or string
    ///
    /// Slices of the wrong kind are returned unchanged.
    pub fn standard() -> Self {
        Self::new()
            .with("increment", Operation::new(|slice, payload| step(slice, payload, 1)))
            .with("decrement", Operation::new(|slice, payload| step(slice, payload, -1)))
            .with("set", Operation::new(|_, payload| payload.clone()))
            .with(
                "toggle",
                Operation::new(|slice, _| match slice {
                    Value::Bool(flag) => Value::Bool(!flag),
                    other => other,
                }),
            )
            .with(
                "append",
                Operation::new(|slice, payload| match slice {
                    Value::Array(mut items) => {
                        items.push(payload.clone());
                        Value::Array(items)
                    }
                    other => other,
                }),
            )
            .with(
                "merge",
                Operation::new(|slice, payload| match (slice, payload) {
                    (Value::Object(mut map), Value::Object(patch)) => {
                        map.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
                        Value::Object(map)
                    }
                    (other, _) => other,
                }),
            )
            .with(
                "clear",
                Operation::new(|slice, _| match slice {
                    Value::Array(_) => Value::Array(Vec::new()),
                    Value::Object(_) => Value::Object(Default::default()),
                    Value::String(_) => Value::String(String::new()),
                    other => other,
                }),
            )
    }

    pub fn with(mut self, name: impl Into<String>, operation: Operation) -> Self {
        self.register(name, operation);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, operation: Operation) -> &mut Self {
        self.transforms.insert(name.into(), operation);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.transforms.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(String::as_str)
    }
}

/// Add `sign * payload` (or `sign` when the payload is null) to a number.
fn step(slice: Value, payload: &Value, sign: i64) -> Value {
    let Value::Number(current) = &slice else {
        return slice;
    };

    let amount = match payload {
        Value::Null => Value::from(1),
        Value::Number(_) => payload.clone(),
        _ => return slice,
    };

    if let (Some(a), Some(b)) = (current.as_i64(), amount.as_i64()) {
        if let Some(sum) = b.checked_mul(sign).and_then(|delta| a.checked_add(delta)) {
            return Value::from(sum);
        }
    }

    match (current.as_f64(), amount.as_f64()) {
        (Some(a), Some(b)) => Number::from_f64(a + b * sign as f64)
            .map(Value::Number)
            .unwrap_or(slice),
        _ => slice,
    }
}
