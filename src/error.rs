//! Error types for container construction, routing and commits.
//!
//! Construction problems are always reported synchronously from the
//! constructor that detected them; a malformed container never becomes live.

use thiserror::Error;

/// Construction-time errors. Fatal, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error(
        "You must provide the 'operations' as:\n - the `operations` field of the container config\n - the `operations` of the template passed to `or_defaults`"
    )]
    MissingOperations,

    #[error("The operations must be a table of operation names and it is '{found}'")]
    WrongOperationsType { found: String },

    #[error("The operations must not be empty")]
    EmptyOperations,

    #[error("Operation '{name}' is declared more than once")]
    DuplicateOperation { name: String },

    #[error(
        "You must provide the 'initial state' as:\n - the `initial_state` field of the container config\n - the `initial_state` of the template passed to `or_defaults`"
    )]
    MissingInitialState,

    #[error("The initial state of a container with children must be an object and it is '{found}'")]
    NonObjectParentState { found: String },

    #[error("The children must not be empty")]
    EmptyChildren,

    #[error("Child '{name}' is declared more than once")]
    DuplicateChild { name: String },

    #[error("Child name '{name}' is invalid: names must be non-empty and must not contain '.'")]
    InvalidChildName { name: String },

    #[error("Child '{name}' collides with an operation of the same name")]
    ChildNameCollision { name: String },
}

/// A request that names no declared operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("Operation '{operation}' is not declared by the container at scope '{scope}'")]
    UnknownOperation { operation: String, scope: String },
}

/// Violations of the single-writer commit pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// An update function tried to dispatch while the store was applying one.
    #[error("Update functions may not dispatch actions (re-entrant dispatch of '{action_type}')")]
    ReentrantDispatch { action_type: String },
}

/// Errors returned when invoking an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}
