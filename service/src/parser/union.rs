//! `UnionType` decode/encode: candidate-tag pruning plus `AnyOf`/`OneOf`
//! disambiguation.

use crate::interpreter::{go, Direction, Parser, ParserOutcome};
use schema_core::ast::{Ast, AstNode, UnionMode};
use schema_core::issue::composite;
use schema_core::{Issue, ParseOptions, Slot, Value, ValueTag};
use std::sync::Arc;
use tracing::trace;

pub fn build(self_ast: Arc<Ast>, direction: Direction) -> Parser {
    Parser(Arc::new(move |input: Slot, options: ParseOptions| {
        let (types, mode) = match &self_ast.node {
            AstNode::UnionType { types, mode } => (types, *mode),
            _ => unreachable!("union parser built for non-union AST"),
        };

        let Some(value) = &input else {
            return ParserOutcome::Ready(Ok(None));
        };

        let tag = value.tag();
        let candidates: Vec<&Arc<Ast>> = types
            .iter()
            .filter(|member| accepts_tag(member, tag))
            .collect();
        trace!(
            ?tag,
            total = types.len(),
            pruned_to = candidates.len(),
            "union: candidate-tag pruning"
        );

        let mut matched: Vec<(usize, Value)> = Vec::new();
        let mut failures: Vec<Issue> = Vec::new();

        for member in &candidates {
            match go(member, direction).call(Some(value.clone()), options) {
                ParserOutcome::Ready(Ok(Some(v))) => {
                    let idx = matched.len();
                    matched.push((idx, v));
                    if mode == UnionMode::AnyOf {
                        break;
                    }
                }
                ParserOutcome::Ready(Ok(None)) => {}
                ParserOutcome::Ready(Err(e)) => failures.push(e),
                ParserOutcome::Pending(_) => {
                    return ParserOutcome::Ready(Err(Issue::InvalidValue {
                        actual: value.clone(),
                        reason: "suspending member parsers are not supported inside UnionType"
                            .to_string(),
                    }));
                }
            }
        }

        match mode {
            UnionMode::AnyOf => {
                if let Some((_, v)) = matched.into_iter().next() {
                    ParserOutcome::Ready(Ok(Some(v)))
                } else if failures.is_empty() {
                    ParserOutcome::Ready(Err(Issue::InvalidType {
                        ast: Arc::clone(&self_ast),
                        actual: value.clone(),
                    }))
                } else {
                    ParserOutcome::Ready(Err(composite(
                        Arc::clone(&self_ast),
                        value.clone(),
                        failures,
                    )))
                }
            }
            UnionMode::OneOf => match matched.len() {
                0 if failures.is_empty() => ParserOutcome::Ready(Err(Issue::InvalidType {
                    ast: Arc::clone(&self_ast),
                    actual: value.clone(),
                })),
                0 => ParserOutcome::Ready(Err(composite(
                    Arc::clone(&self_ast),
                    value.clone(),
                    failures,
                ))),
                1 => ParserOutcome::Ready(Ok(Some(matched.into_iter().next().unwrap().1))),
                _ => ParserOutcome::Ready(Err(Issue::OneOf {
                    ast: Arc::clone(&self_ast),
                    actual: value.clone(),
                })),
            },
        }
    }))
}

/// Does `ast`'s variant admit `tag` at all? A coarse pre-filter before
/// actually running the member's parser: narrows `UnionType`/`Suspend`/
/// `Declaration` members conservatively to "maybe" (`true`) since their
/// real acceptance set isn't known without forcing/running them.
fn accepts_tag(ast: &Ast, tag: ValueTag) -> bool {
    use AstNode as N;
    match &ast.node {
        N::NullKw => tag == ValueTag::Null,
        N::UndefinedKw => tag == ValueTag::Null,
        N::VoidKw | N::AnyKw | N::UnknownKw => true,
        N::NeverKw => false,
        N::BoolKw => tag == ValueTag::Bool,
        N::NumberKw => tag == ValueTag::Num,
        N::StringKw => tag == ValueTag::Str,
        N::BigIntKw => tag == ValueTag::BigInt,
        N::SymbolKw | N::UniqueSymbol(_) => tag == ValueTag::Sym,
        N::ObjectKw => matches!(tag, ValueTag::Map | ValueTag::Seq),
        N::LiteralType(lit) => match lit {
            schema_core::ast::LiteralValue::Str(_) => tag == ValueTag::Str,
            schema_core::ast::LiteralValue::Num(_) => tag == ValueTag::Num,
            schema_core::ast::LiteralValue::Bool(_) => tag == ValueTag::Bool,
            schema_core::ast::LiteralValue::BigInt(_) => tag == ValueTag::BigInt,
        },
        N::Enums(members) => members.iter().any(|m| match &m.value {
            schema_core::ast::EnumValue::Str(_) => tag == ValueTag::Str,
            schema_core::ast::EnumValue::Num(_) => tag == ValueTag::Num,
        }),
        N::TemplateLiteral { .. } => tag == ValueTag::Str,
        N::TupleType { .. } => tag == ValueTag::Seq,
        N::TypeLiteral { .. } => tag == ValueTag::Map,
        N::UnionType { types, .. } => types.iter().any(|t| accepts_tag(t, tag)),
        N::Suspend(_) | N::Declaration { .. } => true,
    }
}
