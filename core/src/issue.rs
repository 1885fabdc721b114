//! Structured decode/encode errors with navigable paths
//!
//! An `Issue` is immutable, composable data — never a thrown exception. A
//! transformation closure that panics is a programmer error and is allowed
//! to propagate as a host fault; only closures that *return* an
//! `Issue` participate in this tree.

use crate::ast::Ast;
use crate::value::Value;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;

/// One step of a path from a root `Issue` down to a nested failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A mapping key (property name).
    Key(String),
    /// A sequence index.
    Index(usize),
    /// An opaque symbol id.
    Sym(u64),
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        PathSegment::Key(s.to_string())
    }
}
impl From<String> for PathSegment {
    fn from(s: String) -> Self {
        PathSegment::Key(s)
    }
}
impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

/// A path through the value tree, inlined up to 4 segments before spilling
/// to the heap — most validation failures are shallow (a tuple index or a
/// single property name).
pub type Path = SmallVec<[PathSegment; 4]>;

/// A structured, path-qualified decode/encode error.
///
/// Equality is structural; `Issue` carries no interior mutability and can be
/// freely cloned, compared, and serialized to the recommended wire format
/// below.
#[derive(Debug, Clone, PartialEq)]
pub enum Issue {
    /// The value's shape did not match the expected AST node.
    InvalidType { ast: Arc<Ast>, actual: Value },
    /// The value's shape matched but a check/coercion rejected its content.
    InvalidValue { actual: Value, reason: String },
    /// A required slot was absent.
    MissingKey,
    /// A transformation vetoed the operation outright (e.g. an encode-only
    /// schema refusing to decode).
    Forbidden { actual: Value, reason: String },
    /// More than one member of a `OneOf` union matched.
    OneOf { ast: Arc<Ast>, actual: Value },
    /// A single child issue, qualified by a path prefix. Consecutive
    /// `Pointer`s are collapsed by [`pointer`] rather than nested.
    Pointer { path: Path, inner: Box<Issue> },
    /// Multiple issues at one node (e.g. `errors = "all"` aggregation, or a
    /// `FilterGroup` where more than one predicate failed).
    Composite {
        ast: Arc<Ast>,
        actual: Value,
        children: Vec<Issue>,
    },
}

/// Lift `issue` under `path_prefix`, collapsing consecutive `Pointer`s so a
/// `Pointer(["a"], Pointer(["b"], x))` never appears — it becomes
/// `Pointer(["a", "b"], x)`.
#[must_use]
pub fn pointer(path_prefix: impl Into<PathSegment>, issue: Issue) -> Issue {
    let mut path: Path = SmallVec::new();
    path.push(path_prefix.into());
    match issue {
        Issue::Pointer { path: rest, inner } => {
            path.extend(rest);
            Issue::Pointer { path, inner }
        }
        other => Issue::Pointer {
            path,
            inner: Box::new(other),
        },
    }
}

/// Build a `Composite`, flattening a singleton child into its sole member
/// so a node with exactly one failing check/element doesn't
/// grow an extra tree level.
#[must_use]
pub fn composite(ast: Arc<Ast>, actual: Value, mut children: Vec<Issue>) -> Issue {
    if children.len() == 1 {
        return children.pop().expect("len checked above");
    }
    Issue::Composite {
        ast,
        actual,
        children,
    }
}

/// Count the leaf issues in an issue tree.
#[must_use]
pub fn leaf_count(issue: &Issue) -> usize {
    match issue {
        Issue::Pointer { inner, .. } => leaf_count(inner),
        Issue::Composite { children, .. } => children.iter().map(leaf_count).sum(),
        _ => 1,
    }
}

/// The wire-format `kind` discriminant used for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    InvalidType,
    InvalidValue,
    MissingKey,
    Forbidden,
    OneOf,
    Composite,
}

/// The recommended wire shape: `{ kind, path, message?, children? }`.
#[derive(Debug, Clone, Serialize)]
pub struct IssueWire {
    pub kind: IssueKind,
    pub path: Vec<PathSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<IssueWire>>,
}

impl Issue {
    /// Flatten this issue tree into the recommended wire format, threading
    /// the accumulated path down through nested `Pointer`s.
    #[must_use]
    pub fn to_wire(&self) -> IssueWire {
        self.to_wire_with_path(Vec::new())
    }

    fn to_wire_with_path(&self, mut path: Vec<PathSegment>) -> IssueWire {
        match self {
            Issue::InvalidType { .. } => IssueWire {
                kind: IssueKind::InvalidType,
                path,
                message: None,
                children: None,
            },
            Issue::InvalidValue { reason, .. } => IssueWire {
                kind: IssueKind::InvalidValue,
                path,
                message: Some(reason.clone()),
                children: None,
            },
            Issue::MissingKey => IssueWire {
                kind: IssueKind::MissingKey,
                path,
                message: None,
                children: None,
            },
            Issue::Forbidden { reason, .. } => IssueWire {
                kind: IssueKind::Forbidden,
                path,
                message: Some(reason.clone()),
                children: None,
            },
            Issue::OneOf { .. } => IssueWire {
                kind: IssueKind::OneOf,
                path,
                message: None,
                children: None,
            },
            Issue::Pointer { path: prefix, inner } => {
                path.extend(prefix.iter().cloned());
                inner.to_wire_with_path(path)
            }
            Issue::Composite { children, .. } => IssueWire {
                kind: IssueKind::Composite,
                path: path.clone(),
                message: None,
                children: Some(
                    children
                        .iter()
                        .map(|c| c.to_wire_with_path(Vec::new()))
                        .collect(),
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;

    fn dummy_ast() -> Arc<Ast> {
        Arc::new(Ast::string_kw())
    }

    #[test]
    fn pointer_collapses_consecutive_pointers() {
        let inner = pointer(1usize, Issue::MissingKey);
        let outer = pointer("a", inner);
        match outer {
            Issue::Pointer { path, inner } => {
                assert_eq!(path.len(), 2);
                assert_eq!(path[0], PathSegment::Key("a".to_string()));
                assert_eq!(path[1], PathSegment::Index(1));
                assert!(matches!(*inner, Issue::MissingKey));
            }
            _ => panic!("expected Pointer"),
        }
    }

    #[test]
    fn composite_flattens_singleton() {
        let ast = dummy_ast();
        let single = composite(ast.clone(), Value::Null, vec![Issue::MissingKey]);
        assert!(matches!(single, Issue::MissingKey));

        let multi = composite(
            ast,
            Value::Null,
            vec![Issue::MissingKey, Issue::MissingKey],
        );
        assert!(matches!(multi, Issue::Composite { .. }));
    }

    #[test]
    fn leaf_count_sums_composite_children() {
        let ast = dummy_ast();
        let tree = Issue::Composite {
            ast: ast.clone(),
            actual: Value::Null,
            children: vec![
                pointer(0usize, Issue::MissingKey),
                pointer(
                    1usize,
                    Issue::Composite {
                        ast,
                        actual: Value::Null,
                        children: vec![Issue::MissingKey, Issue::MissingKey],
                    },
                ),
            ],
        };
        assert_eq!(leaf_count(&tree), 3);
    }

    #[test]
    fn wire_format_threads_path_through_pointers() {
        let issue = pointer("a", pointer(2usize, Issue::MissingKey));
        let wire = issue.to_wire();
        assert_eq!(wire.kind, IssueKind::MissingKey);
        assert_eq!(wire.path.len(), 2);
    }
}
