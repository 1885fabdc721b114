//! `go(ast, direction) -> Parser`, memoized on AST identity.
//!
//! `go` is the single dispatch every variant's decode/encode behavior
//! collapses into. It is memoized so recursive schemas (`Suspend`) terminate,
//! and keyed by `(AST pointer, Direction)` since decode and encode bodies
//! differ for every container variant.

use crate::parser::{record, template, tuple, union};
use dashmap::DashMap;
use futures::future::BoxFuture;
use once_cell::sync::OnceCell;
use schema_core::ast::{self, Ast, AstNode, DeclOutcome};
use schema_core::check::run_checks;
use schema_core::issue::{composite, pointer};
use schema_core::{Issue, ParseOptions, Slot};
use std::sync::Arc;
use tracing::{debug, trace};

/// Decode (wire → typed) or encode (typed → wire) direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Decode,
    Encode,
}

impl Direction {
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Direction::Decode => Direction::Encode,
            Direction::Encode => Direction::Decode,
        }
    }
}

/// The result of one parser invocation: resolved immediately, or suspended
/// pending a `Declaration`/`Middleware` future.
pub enum ParserOutcome {
    Ready(Result<Slot, Issue>),
    Pending(BoxFuture<'static, Result<Slot, Issue>>),
}

impl ParserOutcome {
    pub async fn resolve(self) -> Result<Slot, Issue> {
        match self {
            ParserOutcome::Ready(r) => r,
            ParserOutcome::Pending(fut) => fut.await,
        }
    }
}

/// A compiled, direction-specific parser for one AST node:
/// `Parser = fn(Option<Value>, ParseOptions) -> Result<Option<TypedValue>, Issue>`,
/// extended here with the suspension case.
pub type ParserFn = Arc<dyn Fn(Slot, ParseOptions) -> ParserOutcome + Send + Sync>;

#[derive(Clone)]
pub struct Parser(pub ParserFn);

impl Parser {
    #[must_use]
    pub fn call(&self, input: Slot, options: ParseOptions) -> ParserOutcome {
        (self.0)(input, options)
    }

    fn from_fn(f: impl Fn(Slot, ParseOptions) -> ParserOutcome + Send + Sync + 'static) -> Self {
        Parser(Arc::new(f))
    }
}

fn ast_key(ast: &Arc<Ast>) -> usize {
    Arc::as_ptr(ast) as *const () as usize
}

static GO_MEMO: OnceCell<DashMap<(usize, Direction), Parser>> = OnceCell::new();

fn go_memo() -> &'static DashMap<(usize, Direction), Parser> {
    GO_MEMO.get_or_init(DashMap::new)
}

/// `encoded_ast(ast) = type_ast(flip(ast))`.
#[must_use]
pub fn encoded_ast(ast: &Arc<Ast>) -> Arc<Ast> {
    ast::type_ast(&ast::flip(ast))
}

fn invalid_type(self_ast: &Arc<Ast>, actual: Slot) -> Issue {
    Issue::InvalidType {
        ast: Arc::clone(self_ast),
        actual: actual.unwrap_or(schema_core::Value::Null),
    }
}

/// The interpreter's top-level dispatch. Memoized on
/// `(Arc::as_ptr(ast), direction)` so recursive schemas terminate.
#[must_use]
pub fn go(ast: &Arc<Ast>, direction: Direction) -> Parser {
    let key = (ast_key(ast), direction);
    if let Some(cached) = go_memo().get(&key) {
        trace!(ast = key.0, ?direction, "go: memo hit");
        return cached.clone();
    }

    // Insert a placeholder-free recursive binding: Suspend handles its own
    // laziness by deferring the `go` call to first invocation, so simple
    // recursive schemas don't need a fixpoint trick here.
    trace!(ast = key.0, ?direction, "go: compiling parser");
    let parser = build_parser(ast, direction);
    go_memo().insert(key, parser.clone());
    parser
}

fn build_parser(ast: &Arc<Ast>, direction: Direction) -> Parser {
    let self_ast = Arc::clone(ast);

    if let Some(chain) = ast.ext.encoding.clone() {
        return build_chain_parser(self_ast, chain, direction);
    }

    let body: Parser = match &ast.node {
        AstNode::NullKw => keyword_parser(self_ast.clone(), |v| matches!(v, schema_core::Value::Null)),
        AstNode::BoolKw => keyword_parser(self_ast.clone(), |v| matches!(v, schema_core::Value::Bool(_))),
        AstNode::NumberKw => keyword_parser(self_ast.clone(), |v| matches!(v, schema_core::Value::Num(_))),
        AstNode::StringKw => keyword_parser(self_ast.clone(), |v| matches!(v, schema_core::Value::Str(_))),
        AstNode::BigIntKw => keyword_parser(self_ast.clone(), |v| matches!(v, schema_core::Value::BigInt(_))),
        AstNode::SymbolKw => keyword_parser(self_ast.clone(), |v| matches!(v, schema_core::Value::Sym(_))),
        AstNode::ObjectKw => keyword_parser(self_ast.clone(), |v| {
            matches!(v, schema_core::Value::Map(_) | schema_core::Value::Seq(_))
        }),
        // The source's `Void` uses an "any value" predicate while `Never`
        // uses "nothing". We keep that asymmetry
        // rather than silently aligning the two, and note it in the design
        // ledger: Void is intentionally permissive, Never never matches.
        AstNode::VoidKw | AstNode::AnyKw | AstNode::UnknownKw => {
            keyword_parser(self_ast.clone(), |_| true)
        }
        AstNode::UndefinedKw => keyword_parser(self_ast.clone(), |v| matches!(v, schema_core::Value::Null)),
        AstNode::NeverKw => keyword_parser(self_ast.clone(), |_| false),
        AstNode::LiteralType(lit) => literal_parser(self_ast.clone(), lit.clone()),
        AstNode::UniqueSymbol(id) => {
            let id = *id;
            keyword_parser(self_ast.clone(), move |v| matches!(v, schema_core::Value::Sym(s) if *s == id))
        }
        AstNode::Enums(members) => enum_parser(self_ast.clone(), members.clone()),
        AstNode::TemplateLiteral { .. } => template::build(self_ast.clone(), direction),
        AstNode::TupleType { .. } => tuple::build(self_ast.clone(), direction),
        AstNode::TypeLiteral { .. } => record::build(self_ast.clone(), direction),
        AstNode::UnionType { .. } => union::build(self_ast.clone(), direction),
        AstNode::Suspend(cell) => suspend_parser(cell.clone(), direction),
        AstNode::Declaration { hook, .. } => declaration_parser(self_ast.clone(), Arc::clone(hook), direction),
    };

    with_checks(self_ast, body, direction)
}

fn keyword_parser(self_ast: Arc<Ast>, accepts: impl Fn(&schema_core::Value) -> bool + Send + Sync + 'static) -> Parser {
    Parser::from_fn(move |input, _options| {
        ParserOutcome::Ready(match &input {
            None => Ok(None),
            Some(v) if accepts(v) => Ok(input),
            Some(_) => Err(invalid_type(&self_ast, input)),
        })
    })
}

fn literal_parser(self_ast: Arc<Ast>, lit: ast::LiteralValue) -> Parser {
    Parser::from_fn(move |input, _options| {
        use ast::LiteralValue as L;
        use schema_core::Value as V;
        let matches = match (&lit, &input) {
            (L::Str(s), Some(V::Str(v))) => s == v,
            (L::Num(n), Some(V::Num(v))) => n == v,
            (L::Bool(b), Some(V::Bool(v))) => b == v,
            (L::BigInt(i), Some(V::BigInt(v))) => i == v,
            (_, None) => return ParserOutcome::Ready(Ok(None)),
            _ => false,
        };
        ParserOutcome::Ready(if matches {
            Ok(input)
        } else {
            Err(invalid_type(&self_ast, input))
        })
    })
}

fn enum_parser(self_ast: Arc<Ast>, members: Vec<ast::EnumMember>) -> Parser {
    Parser::from_fn(move |input, _options| {
        use ast::EnumValue as E;
        use schema_core::Value as V;
        let matches = match &input {
            None => return ParserOutcome::Ready(Ok(None)),
            Some(V::Str(s)) => members.iter().any(|m| matches!(&m.value, E::Str(v) if v == s)),
            Some(V::Num(n)) => members.iter().any(|m| matches!(&m.value, E::Num(v) if v == n)),
            _ => false,
        };
        ParserOutcome::Ready(if matches {
            Ok(input)
        } else {
            Err(invalid_type(&self_ast, input))
        })
    })
}

fn suspend_parser(cell: ast::SuspendCell, direction: Direction) -> Parser {
    Parser::from_fn(move |input, options| {
        let forced = cell.force();
        trace!(ast = ast_key(&forced), ?direction, "suspend: forced recursive schema");
        go(&forced, direction).call(input, options)
    })
}

fn declaration_parser(self_ast: Arc<Ast>, hook: Arc<dyn ast::DeclarationHook>, direction: Direction) -> Parser {
    Parser::from_fn(move |input, options| {
        let outcome = match direction {
            Direction::Decode => hook.decode(input, &self_ast, options),
            Direction::Encode => hook.encode(input, &self_ast, options),
        };
        match outcome {
            DeclOutcome::Done(r) => ParserOutcome::Ready(r),
            DeclOutcome::Pending(fut) => ParserOutcome::Pending(fut),
        }
    })
}

/// Apply the encoding chain. `chain` is ordered
/// innermost-to-outermost (index 0 nearest the node's own type, the last
/// element nearest the wire boundary):
///
/// - Decode: parse the raw input as `chain.last().to`'s type (the only
///   `go` call against unknown input), then thread the value inward through
///   each link's `transformation.decode`, ending at the node's own type.
/// - Encode: thread the typed value outward through each link's
///   `transformation.encode` in order, then parse/validate the final
///   representation via `go(chain.last().to, Encode)`.
fn build_chain_parser(self_ast: Arc<Ast>, chain: Vec<ast::Link>, direction: Direction) -> Parser {
    match direction {
        Direction::Decode => Parser::from_fn(move |input, options| {
            let outer = chain.last().expect("encoding is non-empty");
            match go(&outer.to, Direction::Decode).call(input, options) {
                ParserOutcome::Ready(Ok(value)) => {
                    decode_chain_continue(self_ast.clone(), chain.clone(), 0, value, options)
                }
                ParserOutcome::Ready(Err(e)) => ParserOutcome::Ready(Err(e)),
                ParserOutcome::Pending(fut) => {
                    let self_ast = self_ast.clone();
                    let chain = chain.clone();
                    ParserOutcome::Pending(Box::pin(async move {
                        let value = fut.await?;
                        match decode_chain_continue(self_ast, chain, 0, value, options) {
                            ParserOutcome::Ready(r) => r,
                            ParserOutcome::Pending(f) => f.await,
                        }
                    }))
                }
            }
        }),
        Direction::Encode => Parser::from_fn(move |input, options| encode_chain_continue(chain.clone(), 0, input, options)),
    }
}

/// Thread `value` through `chain[chain.len() - 1 - from_end ..]` in reverse
/// (outer-to-inner), resuming cleanly from a suspended link without
/// re-invoking any link already applied.
fn decode_chain_continue(
    self_ast: Arc<Ast>,
    chain: Vec<ast::Link>,
    mut from_end: usize,
    mut value: Slot,
    options: ParseOptions,
) -> ParserOutcome {
    let total = chain.len();
    while from_end < total {
        let link = &chain[total - 1 - from_end];
        match link.transformation.decode.call(value, &link.to, options) {
            schema_core::GetterOutcome::Ready(Ok(v)) => {
                value = v;
                from_end += 1;
            }
            schema_core::GetterOutcome::Ready(Err(e)) => return ParserOutcome::Ready(Err(e)),
            schema_core::GetterOutcome::Pending(fut) => {
                let self_ast = self_ast.clone();
                let chain = chain.clone();
                let next = from_end + 1;
                return ParserOutcome::Pending(Box::pin(async move {
                    let v = fut.await?;
                    match decode_chain_continue(self_ast, chain, next, v, options) {
                        ParserOutcome::Ready(r) => r,
                        ParserOutcome::Pending(f) => f.await,
                    }
                }));
            }
        }
    }
    run_own_checks(&self_ast, value, options)
}

/// Thread `value` through `chain[from..]` forward (inner-to-outer), then
/// parse/validate the final wire representation via `go(chain.last().to)`.
fn encode_chain_continue(
    chain: Vec<ast::Link>,
    mut from: usize,
    mut value: Slot,
    options: ParseOptions,
) -> ParserOutcome {
    let total = chain.len();
    while from < total {
        let link = &chain[from];
        match link.transformation.encode.call(value, &link.to, options) {
            schema_core::GetterOutcome::Ready(Ok(v)) => {
                value = v;
                from += 1;
            }
            schema_core::GetterOutcome::Ready(Err(e)) => return ParserOutcome::Ready(Err(e)),
            schema_core::GetterOutcome::Pending(fut) => {
                let chain = chain.clone();
                let next = from + 1;
                return ParserOutcome::Pending(Box::pin(async move {
                    let v = fut.await?;
                    match encode_chain_continue(chain, next, v, options) {
                        ParserOutcome::Ready(r) => r,
                        ParserOutcome::Pending(f) => f.await,
                    }
                }));
            }
        }
    }
    let outer = chain.last().expect("encoding is non-empty");
    go(&outer.to, Direction::Encode).call(value, options)
}

/// Run the node's own check list on a successfully decoded value.
/// Encode-direction results are not re-checked: checks validate the typed
/// value a decoder produced, and an encoder's job is to serialize an
/// already-valid typed value back out.
fn run_own_checks(self_ast: &Arc<Ast>, value: Slot, options: ParseOptions) -> ParserOutcome {
    let Some(checks) = &self_ast.ext.checks else {
        return ParserOutcome::Ready(Ok(value));
    };
    let Some(v) = &value else {
        return ParserOutcome::Ready(Ok(value));
    };
    match run_checks(checks, v, options.is_errors_all()) {
        None => ParserOutcome::Ready(Ok(value)),
        Some(mut issues) if issues.len() == 1 => {
            debug!(ast = ast_key(self_ast), "check failed");
            ParserOutcome::Ready(Err(issues.remove(0)))
        }
        Some(issues) => {
            debug!(ast = ast_key(self_ast), count = issues.len(), "multiple checks failed");
            ParserOutcome::Ready(Err(composite(Arc::clone(self_ast), v.clone(), issues)))
        }
    }
}

fn with_checks(self_ast: Arc<Ast>, inner: Parser, direction: Direction) -> Parser {
    if self_ast.ext.checks.is_none() || direction == Direction::Encode {
        return inner;
    }
    Parser::from_fn(move |input, options| match inner.call(input, options) {
        ParserOutcome::Ready(Ok(value)) => run_own_checks(&self_ast, value, options),
        other @ ParserOutcome::Ready(Err(_)) => other,
        ParserOutcome::Pending(fut) => {
            let self_ast = self_ast.clone();
            ParserOutcome::Pending(Box::pin(async move {
                let value = fut.await?;
                run_own_checks(&self_ast, value, options).resolve().await
            }))
        }
    })
}

/// Thread a path segment through a child failure by wrapping it in
/// `Pointer([segment], _)`.
pub(crate) fn wrap_pointer(segment: impl Into<schema_core::PathSegment>, issue: Issue) -> Issue {
    pointer(segment, issue)
}

/// `decode_unknown(schema, value, options) -> Result<T, Issue>`.
pub fn decode_unknown(schema: &Arc<Ast>, value: Slot, options: ParseOptions) -> ParserOutcome {
    go(schema, Direction::Decode).call(value, options)
}

/// `encode_unknown(schema, t, options) -> Result<V, Issue>`.
pub fn encode_unknown(schema: &Arc<Ast>, value: Slot, options: ParseOptions) -> ParserOutcome {
    go(schema, Direction::Encode).call(value, options)
}

/// Thin façade over `decode_unknown`/`encode_unknown` for callers that
/// prefer a handle over free functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl Interpreter {
    #[must_use]
    pub fn new() -> Self {
        Interpreter
    }

    #[must_use]
    pub fn decode(&self, schema: &Arc<Ast>, value: Slot, options: ParseOptions) -> ParserOutcome {
        decode_unknown(schema, value, options)
    }

    #[must_use]
    pub fn encode(&self, schema: &Arc<Ast>, value: Slot, options: ParseOptions) -> ParserOutcome {
        encode_unknown(schema, value, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_core::Value;

    fn ready(outcome: ParserOutcome) -> Result<Slot, Issue> {
        match outcome {
            ParserOutcome::Ready(r) => r,
            ParserOutcome::Pending(_) => panic!("unexpected suspension in sync test"),
        }
    }

    #[test]
    fn absent_propagates_through_any_variant() {
        let ast = Arc::new(Ast::string_kw());
        let result = ready(go(&ast, Direction::Decode).call(None, ParseOptions::default()));
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn keyword_mismatch_is_invalid_type() {
        let ast = Arc::new(Ast::string_kw());
        let result = ready(go(&ast, Direction::Decode).call(Some(Value::Num(1.0)), ParseOptions::default()));
        assert!(matches!(result, Err(Issue::InvalidType { .. })));
    }

    #[test]
    fn never_kw_rejects_everything_but_void_accepts_anything() {
        let never = Arc::new(Ast::never_kw());
        let void = Arc::new(Ast::void_kw());
        assert!(ready(go(&never, Direction::Decode).call(Some(Value::Null), ParseOptions::default())).is_err());
        assert!(ready(go(&void, Direction::Decode).call(Some(Value::Null), ParseOptions::default())).is_ok());
    }

    #[test]
    fn go_is_memoized_on_ast_identity() {
        let ast = Arc::new(Ast::string_kw());
        let p1 = go(&ast, Direction::Decode);
        let p2 = go(&ast, Direction::Decode);
        assert!(Arc::ptr_eq(&p1.0, &p2.0));
    }

    #[test]
    fn encoded_ast_matches_definition() {
        let ast = Arc::new(Ast::string_kw());
        let direct = ast::type_ast(&ast::flip(&ast));
        let via_helper = encoded_ast(&ast);
        assert!(Arc::ptr_eq(&direct, &via_helper));
    }
}
