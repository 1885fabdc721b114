//! The interpreter: `go(ast) -> Parser`, memoized on AST identity, plus the
//! public `decode_unknown`/`encode_unknown` entry points.

pub mod interpreter;
pub mod parser;

pub use interpreter::{decode_unknown, encode_unknown, encoded_ast, go, Direction, Interpreter};
pub use schema_core::{
    ast, check, combinators, error, format, issue, options, transform, value, Ast, AstNode, Check,
    ErrorMode, Getter, GetterOutcome, Issue, IssueKind, IssueWire, Key, Link, ParseOptions,
    PathSegment, SchemaError, Slot, Transformation, UnionMode, Value, ValueTag, Variant,
};
