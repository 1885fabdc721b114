//! `TemplateLiteral` decode/encode: regex-compiled from the template's
//! literal head/spans, memoized per AST identity the same way `go` memoizes
//! parsers.

use crate::interpreter::{Direction, Parser, ParserOutcome};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use regex::Regex;
use schema_core::ast::{Ast, AstNode, LiteralValue};
use schema_core::{Issue, ParseOptions, Slot, Value};
use std::sync::Arc;

static REGEX_MEMO: OnceCell<DashMap<usize, Arc<Regex>>> = OnceCell::new();

fn regex_memo() -> &'static DashMap<usize, Arc<Regex>> {
    REGEX_MEMO.get_or_init(DashMap::new)
}

fn ast_key(ast: &Arc<Ast>) -> usize {
    Arc::as_ptr(ast) as *const () as usize
}

pub fn build(self_ast: Arc<Ast>, _direction: Direction) -> Parser {
    Parser(Arc::new(move |input: Slot, _options: ParseOptions| {
        let regex = compiled(&self_ast);
        ParserOutcome::Ready(match &input {
            None => Ok(None),
            Some(Value::Str(s)) if regex.is_match(s) => Ok(input),
            Some(_) => Err(Issue::InvalidType {
                ast: Arc::clone(&self_ast),
                actual: input.unwrap_or(Value::Null),
            }),
        })
    }))
}

fn compiled(ast: &Arc<Ast>) -> Arc<Regex> {
    let key = ast_key(ast);
    if let Some(cached) = regex_memo().get(&key) {
        return Arc::clone(&cached);
    }
    let (head, spans) = match &ast.node {
        AstNode::TemplateLiteral { head, spans } => (head, spans),
        _ => unreachable!("template parser built for non-template AST"),
    };

    let mut pattern = String::from("^");
    pattern.push_str(&regex::escape(head));
    for span in spans {
        pattern.push_str(&pattern_for(&span.pattern));
        pattern.push_str(&regex::escape(&span.literal));
    }
    pattern.push('$');

    let regex = Arc::new(Regex::new(&pattern).expect("template regex assembled from known fragments"));
    regex_memo().insert(key, Arc::clone(&regex));
    regex
}

/// The regex fragment a single template span's pattern node contributes,
/// unanchored and ungrouped so it can be spliced between literal segments.
fn pattern_for(ast: &Arc<Ast>) -> String {
    match &ast.node {
        AstNode::StringKw => "[\\s\\S]*".to_string(),
        AstNode::NumberKw => "[+-]?\\d*\\.?\\d+(?:[Ee][+-]?\\d+)?".to_string(),
        AstNode::BigIntKw => "[+-]?\\d+".to_string(),
        AstNode::LiteralType(LiteralValue::Str(s)) => regex::escape(s),
        AstNode::LiteralType(LiteralValue::Num(n)) => regex::escape(&n.to_string()),
        AstNode::LiteralType(LiteralValue::Bool(b)) => regex::escape(&b.to_string()),
        AstNode::LiteralType(LiteralValue::BigInt(i)) => regex::escape(&i.to_string()),
        AstNode::TemplateLiteral { head, spans } => {
            let mut inner = regex::escape(head);
            for span in spans {
                inner.push_str(&pattern_for(&span.pattern));
                inner.push_str(&regex::escape(&span.literal));
            }
            inner
        }
        AstNode::UnionType { types, .. } => {
            let alts: Vec<String> = types.iter().map(pattern_for).collect();
            format!("(?:{})", alts.join("|"))
        }
        _ => "[\\s\\S]*".to_string(),
    }
}
