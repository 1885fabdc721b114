//! `ParseOptions`
//!
//! Lives in `schema-core` rather than the interpreter crate because
//! `Declaration` nodes need to thread these options into the user-supplied
//! `run` hook without the AST crate depending on the interpreter crate.

use serde::{Deserialize, Serialize};

/// Short-circuit vs. aggregate error-collection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorMode {
    /// Stop at the first failing check/element and return immediately.
    First,
    /// Collect every failure and return them wrapped in `Issue::Composite`.
    All,
}

impl Default for ErrorMode {
    fn default() -> Self {
        ErrorMode::First
    }
}

/// Internal: selects the constructor-default transformation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// Standard decode/encode path.
    Standard,
    /// Use each property's `ctor_default` in place of the ordinary parser
    /// when a slot is absent.
    Make,
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Standard
    }
}

/// Options threaded through every parser invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// `"first"` short-circuits, `"all"` aggregates into a `Composite`.
    pub errors: ErrorMode,
    /// If `true`, a missing property is always an error, even when the
    /// target slot type could otherwise admit absence. Defaults to `false`.
    pub exact: bool,
    /// Selects the constructor-default transformation path.
    pub variant: Variant,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            errors: ErrorMode::default(),
            exact: false,
            variant: Variant::default(),
        }
    }
}

impl ParseOptions {
    /// `ParseOptions` with `errors = "all"`.
    #[must_use]
    pub fn collect_all() -> Self {
        Self {
            errors: ErrorMode::All,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_errors_all(&self) -> bool {
        matches!(self.errors, ErrorMode::All)
    }
}
