//! Check / CheckGroup
//!
//! A `Check` runs after a decoder has produced `Some(value)`. It never
//! mutates; it only inspects the typed value and optionally reports an
//! `Issue`.

use crate::issue::Issue;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// A single predicate over a decoded value.
pub type Predicate = Arc<dyn Fn(&Value) -> Option<Issue> + Send + Sync>;

/// One check: either a single predicate (`Filter`) or a named group of
/// checks evaluated in order (`FilterGroup`).
#[derive(Clone)]
pub enum Check {
    Filter {
        predicate: Predicate,
        name: String,
        message: Option<String>,
    },
    FilterGroup {
        checks: Vec<Check>,
        name: String,
    },
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Filter { name, .. } => f.debug_struct("Check::Filter").field("name", name).finish(),
            Check::FilterGroup { name, checks } => f
                .debug_struct("Check::FilterGroup")
                .field("name", name)
                .field("len", &checks.len())
                .finish(),
        }
    }
}

impl Check {
    /// Build a named `Filter` check from a predicate returning `Some(Issue)`
    /// on failure.
    pub fn filter(
        name: impl Into<String>,
        predicate: impl Fn(&Value) -> Option<Issue> + Send + Sync + 'static,
    ) -> Self {
        Check::Filter {
            predicate: Arc::new(predicate),
            name: name.into(),
            message: None,
        }
    }

    /// Like [`Check::filter`], but failures are reported as
    /// `InvalidValue { reason: message }` rather than a caller-supplied
    /// `Issue`.
    pub fn filter_with_message(
        name: impl Into<String>,
        message: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        let message = message.into();
        Check::Filter {
            predicate: Arc::new(move |v: &Value| {
                if predicate(v) {
                    None
                } else {
                    Some(Issue::InvalidValue {
                        actual: v.clone(),
                        reason: message.clone(),
                    })
                }
            }),
            name: name.into(),
            message: Some(message),
        }
    }

    /// Group checks under one logical name, preserved for diagnostics:
    /// semantics are identical to flattening, but the name survives.
    #[must_use]
    pub fn group(name: impl Into<String>, checks: Vec<Check>) -> Self {
        Check::FilterGroup {
            checks,
            name: name.into(),
        }
    }

    /// The check's diagnostic name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Check::Filter { name, .. } => name,
            Check::FilterGroup { name, .. } => name,
        }
    }

    /// The human-readable failure message, if one was supplied at
    /// construction.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Check::Filter { message, .. } => message.as_deref(),
            Check::FilterGroup { .. } => None,
        }
    }

    /// Evaluate this check against a decoded value, returning every failing
    /// leaf in evaluation order.
    #[must_use]
    pub fn evaluate(&self, value: &Value) -> Vec<Issue> {
        match self {
            Check::Filter { predicate, .. } => predicate(value).into_iter().collect(),
            Check::FilterGroup { checks, .. } => {
                checks.iter().flat_map(|c| c.evaluate(value)).collect()
            }
        }
    }

    /// Evaluate this check, stopping at the first failure (used under
    /// `errors = "first"`).
    #[must_use]
    pub fn evaluate_first(&self, value: &Value) -> Option<Issue> {
        match self {
            Check::Filter { predicate, .. } => predicate(value),
            Check::FilterGroup { checks, .. } => {
                checks.iter().find_map(|c| c.evaluate_first(value))
            }
        }
    }
}

/// Run every check in `checks` (the node's ordered check list) against
/// `value`, honoring the `errors = "first"` vs `"all"` policy.
/// Returns `None` if every check passed.
#[must_use]
pub fn run_checks(checks: &[Check], value: &Value, collect_all: bool) -> Option<Vec<Issue>> {
    if collect_all {
        let failures: Vec<Issue> = checks.iter().flat_map(|c| c.evaluate(value)).collect();
        if failures.is_empty() {
            None
        } else {
            Some(failures)
        }
    } else {
        checks
            .iter()
            .find_map(|c| c.evaluate_first(value))
            .map(|issue| vec![issue])
    }
}
