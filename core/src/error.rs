//! Infrastructure errors for the schema engine
//!
//! `SchemaError` covers failures in *building* or *compiling* a schema: a
//! malformed template-literal pattern, a regex that doesn't compile, a
//! builder invariant violated at construction time. It is distinct from
//! [`crate::issue::Issue`], which is the recoverable decode/encode error a
//! parser returns as data and is never wrapped in `Result`'s
//! `Err` side by the interpreter.

use thiserror::Error;

/// Result alias used throughout `schema-core`.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Infrastructure-level error for schema construction and compilation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A template literal span or literal failed to compile to a regex.
    #[error("invalid template literal pattern: {0}")]
    InvalidPattern(String),

    /// A builder or combinator was called with an invariant-violating
    /// argument (e.g. an empty `checks` list passed to `FilterGroup`).
    #[error("invalid schema construction: {0}")]
    InvalidConstruction(String),

    /// A `Declaration`'s `run` closure failed to produce a parser.
    #[error("declaration setup failed: {0}")]
    DeclarationFailed(String),
}

impl SchemaError {
    /// Construct an [`SchemaError::InvalidPattern`].
    pub fn pattern(msg: impl Into<String>) -> Self {
        Self::InvalidPattern(msg.into())
    }

    /// Construct an [`SchemaError::InvalidConstruction`].
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::InvalidConstruction(msg.into())
    }

    /// Construct an [`SchemaError::DeclarationFailed`].
    pub fn declaration(msg: impl Into<String>) -> Self {
        Self::DeclarationFailed(msg.into())
    }
}
