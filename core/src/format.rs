//! Human-readable AST rendering.
//!
//! `format` produces a single-line-per-node tree: titles from annotations,
//! check names, encoding chain depth, and optionality/readonly markers. It
//! is meant for debugging/logging, not as a canonical serialization.

use crate::ast::{Ast, AstNode};
use std::fmt::Write as _;

/// Render `ast` as a human-readable tree.
#[must_use]
pub fn format(ast: &Ast) -> String {
    let mut out = String::new();
    write_node(ast, 0, &mut out);
    out
}

fn write_node(ast: &Ast, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let title = ast
        .ext
        .annotations
        .get("title")
        .and_then(|v| v.as_str())
        .map(|s| format!(" \"{s}\""));

    let _ = write!(out, "{indent}{}", variant_name(&ast.node));
    if let Some(t) = title {
        out.push_str(&t);
    }
    if ast.is_optional() {
        out.push('?');
    }
    if ast.is_readonly() {
        out.push_str(" readonly");
    }
    if let Some(checks) = &ast.ext.checks {
        let names: Vec<&str> = checks.iter().map(|c| c.name()).collect();
        let _ = write!(out, " checks=[{}]", names.join(", "));
    }
    if let Some(enc) = &ast.ext.encoding {
        let _ = write!(out, " encoding(depth={})", enc.len());
    }
    out.push('\n');

    match &ast.node {
        AstNode::TupleType { elements, rest, .. } => {
            for e in elements {
                write_node(e, depth + 1, out);
            }
            for r in rest {
                write_node(r, depth + 1, out);
            }
        }
        AstNode::TypeLiteral {
            property_sigs,
            index_sigs,
        } => {
            for p in property_sigs {
                let _ = writeln!(out, "{indent}  {}:", p.name);
                write_node(&p.ty, depth + 2, out);
            }
            for i in index_sigs {
                write_node(&i.ty, depth + 1, out);
            }
        }
        AstNode::UnionType { types, .. } => {
            for t in types {
                write_node(t, depth + 1, out);
            }
        }
        AstNode::Declaration { type_params, .. } => {
            for t in type_params {
                write_node(t, depth + 1, out);
            }
        }
        AstNode::Suspend(_) => {
            let _ = writeln!(out, "{indent}  <suspended, not forced to avoid infinite recursion>");
        }
        _ => {}
    }
}

fn variant_name(node: &AstNode) -> &'static str {
    match node {
        AstNode::NullKw => "NullKw",
        AstNode::UndefinedKw => "UndefinedKw",
        AstNode::VoidKw => "VoidKw",
        AstNode::NeverKw => "NeverKw",
        AstNode::AnyKw => "AnyKw",
        AstNode::UnknownKw => "UnknownKw",
        AstNode::StringKw => "StringKw",
        AstNode::NumberKw => "NumberKw",
        AstNode::BoolKw => "BoolKw",
        AstNode::BigIntKw => "BigIntKw",
        AstNode::SymbolKw => "SymbolKw",
        AstNode::ObjectKw => "ObjectKw",
        AstNode::LiteralType(_) => "LiteralType",
        AstNode::UniqueSymbol(_) => "UniqueSymbol",
        AstNode::Enums(_) => "Enums",
        AstNode::TemplateLiteral { .. } => "TemplateLiteral",
        AstNode::TupleType { .. } => "TupleType",
        AstNode::TypeLiteral { .. } => "TypeLiteral",
        AstNode::UnionType { .. } => "UnionType",
        AstNode::Suspend(_) => "Suspend",
        AstNode::Declaration { .. } => "Declaration",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;
    use std::sync::Arc;

    #[test]
    fn formats_plain_keyword() {
        let rendered = format(&Ast::string_kw());
        assert!(rendered.starts_with("StringKw"));
    }

    #[test]
    fn formats_tuple_with_children() {
        let t = Ast::tuple(vec![Arc::new(Ast::string_kw()), Arc::new(Ast::number_kw())], vec![]);
        let rendered = format(&t);
        assert!(rendered.contains("TupleType"));
        assert!(rendered.contains("StringKw"));
        assert!(rendered.contains("NumberKw"));
    }
}
