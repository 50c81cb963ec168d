//! Tree combination.
//!
//! Combines named containers, plain update functions and nested subtrees
//! into one update function for the whole (sub)tree, assigning each
//! scoped node its dotted path on the way.
//!
//! ```text
//! Subtree { a: Container, b: Subtree { c: Container }, d: UpdateFn }
//!   a    → scope "a"
//!   b.c  → scope "b.c"
//!   d    → unscoped, sees every action
//! ```

mod node;
mod subtree;
mod update;

pub use node::Node;
pub use subtree::{combine, Subtree};
pub use update::UpdateFn;
