//! Dotted-path identities for nodes of the state tree.
//!
//! A scope is assigned by the composer: a child composed under `key` by a
//! parent at scope `p` lives at `p.key` (or just `key` under the root). The
//! same path is used to read the node's slice out of the full tree and to
//! decide which actions the node reacts to.

use std::fmt;

use serde_json::Value;

use crate::error::ConfigurationError;

pub const SEPARATOR: char = '.';

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scope(String);

impl Scope {
    /// The empty scope: the node owns the whole tree.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Scope of the child stored under `key`.
    pub fn child(&self, key: &str) -> Self {
        if self.is_root() {
            Self(key.to_string())
        } else {
            Self(format!("{}{}{}", self.0, SEPARATOR, key))
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|segment| !segment.is_empty())
    }

    /// Walk `tree` segment by segment. The root scope resolves to the tree.
    pub fn resolve<'a>(&self, tree: &'a Value) -> Option<&'a Value> {
        self.segments()
            .try_fold(tree, |node, segment| node.as_object()?.get(segment))
    }

    /// Owned variant of [`Scope::resolve`]; moves the slice out of `tree`.
    pub fn extract(&self, tree: Value) -> Option<Value> {
        self.segments().try_fold(tree, |node, segment| match node {
            Value::Object(mut map) => map.remove(segment),
            _ => None,
        })
    }

    /// Scope carried by actions built for this node; the root sends none.
    pub fn to_action_scope(&self) -> Option<String> {
        (!self.is_root()).then(|| self.0.clone())
    }

    /// Whether an action addressed to `target` belongs to this scope.
    ///
    /// The root accepts everything. Below the root, matching is exact string
    /// equality (no prefix matching).
    pub fn accepts(&self, target: Option<&str>) -> bool {
        self.is_root() || target == Some(self.0.as_str())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reject keys that would break path splitting.
pub(crate) fn validate_key(key: &str) -> Result<(), ConfigurationError> {
    if key.is_empty() || key.contains(SEPARATOR) {
        return Err(ConfigurationError::InvalidChildName {
            name: key.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn child_of_root_is_the_key() {
        assert_eq!(Scope::root().child("counter").as_str(), "counter");
    }

    #[test]
    fn nested_children_are_dotted() {
        let scope = Scope::root().child("outer").child("inner").child("counter");
        assert_eq!(scope.as_str(), "outer.inner.counter");
        assert_eq!(
            scope.segments().collect::<Vec<_>>(),
            vec!["outer", "inner", "counter"]
        );
    }

    #[test]
    fn resolve_walks_the_tree() {
        let tree = json!({ "outer": { "inner": { "counter": 3 } } });
        let scope = Scope::root().child("outer").child("inner").child("counter");
        assert_eq!(scope.resolve(&tree), Some(&json!(3)));
        assert_eq!(Scope::root().resolve(&tree), Some(&tree));
        assert_eq!(Scope::root().child("missing").resolve(&tree), None);
    }

    #[test]
    fn extract_matches_resolve() {
        let tree = json!({ "a": { "b": [1, 2] }, "c": null });
        let scope = Scope::root().child("a").child("b");
        assert_eq!(scope.extract(tree.clone()), scope.resolve(&tree).cloned());
        assert_eq!(Scope::root().child("c").extract(tree.clone()), Some(Value::Null));
        assert_eq!(Scope::root().child("d").extract(tree), None);
    }

    #[test]
    fn resolve_stops_at_leaves() {
        let tree = json!({ "counter": 3 });
        assert_eq!(Scope::root().child("counter").child("x").resolve(&tree), None);
    }

    #[test]
    fn root_accepts_everything() {
        assert!(Scope::root().accepts(None));
        assert!(Scope::root().accepts(Some("anything")));
    }

    #[test]
    fn scoped_matching_is_exact() {
        let scope = Scope::root().child("a").child("b");
        assert!(scope.accepts(Some("a.b")));
        assert!(!scope.accepts(Some("a")));
        assert!(!scope.accepts(Some("a.b.c")));
        assert!(!scope.accepts(None));
    }

    #[test]
    fn invalid_keys_are_rejected() {
        assert!(validate_key("counter").is_ok());
        assert_eq!(
            validate_key("a.b"),
            Err(ConfigurationError::InvalidChildName {
                name: "a.b".to_string()
            })
        );
        assert!(validate_key("").is_err());
    }
}
