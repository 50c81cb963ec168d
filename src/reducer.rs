//! Statically typed reducers that can be mixed into a tree.
//!
//! A [`Reducer`] is the typed counterpart of a plain update function: its
//! state and intents are ordinary Rust types, decoded from and encoded to
//! the JSON tree at the boundary by [`UpdateFn::from_reducer`].
//!
//! ```text
//! Action ──decode──→ Intent ──→ Reducer ──→ State ──encode──→ slice
//! ```
//!
//! [`UpdateFn::from_reducer`]: crate::compose::UpdateFn::from_reducer

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Marker trait for typed slice state.
///
/// `Default` supplies the initial slice, `PartialEq` lets unchanged
/// results keep the previous encoding.
pub trait SliceState:
    Clone + PartialEq + Default + Serialize + DeserializeOwned + Send + 'static
{
}

/// Marker trait for intents decoded from actions.
///
/// Intents are usually adjacently tagged enums:
/// `#[serde(tag = "type", content = "payload")]`.
pub trait Intent: DeserializeOwned + Send + 'static {}

/// Reducer transforms state based on intents.
///
/// It must be a pure function: (State, Intent) -> State
pub trait Reducer {
    type State: SliceState;
    type Intent: Intent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}
