//! Value tree, AST, transformations, checks and issues for a bidirectional
//! schema engine.
//!
//! This crate holds everything that is pure data and pure rewriting: the
//! [`value::Value`] domain decoders/encoders operate over, the
//! [`ast::Ast`] that describes a schema, [`transform::Transformation`] and
//! [`check::Check`] attached to AST nodes, and the [`issue::Issue`] tree
//! reported on failure. It has no notion of "run this schema against this
//! value" — that dispatch lives in the interpreter crate, which depends on
//! this one.

pub mod ast;
pub mod check;
pub mod combinators;
pub mod error;
pub mod format;
pub mod issue;
pub mod options;
pub mod transform;
pub mod value;

pub use ast::{Ast, AstNode, DeclOutcome, DeclarationHook, DeclarationImpl, Link, UnionMode};
pub use check::Check;
pub use error::{Result, SchemaError};
pub use issue::{Issue, IssueKind, IssueWire, PathSegment};
pub use options::{ErrorMode, ParseOptions, Variant};
pub use transform::{Getter, GetterOutcome, Transformation};
pub use value::{Key, Slot, Value, ValueTag};
