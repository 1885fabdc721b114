//! Constructors and decoration functions layered over the raw [`Ast`]
//! variants.
//!
//! These are the ergonomic surface schema authors actually call; `ast.rs`
//! owns the data shapes and the universal/global rewrites.

use crate::ast::{
    Ast, AstNode, Context, EnumMember, Extensions, IndexSignature, Link, LiteralValue,
    PropertySignature, TemplateSpan, UnionMode,
};
use crate::check::Check;
use crate::transform::Transformation;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Build a `TypeLiteral` (record) from named property types, all required
/// and mutable by default.
#[must_use]
pub fn struct_(fields: Vec<(&str, Arc<Ast>)>) -> Ast {
    let property_sigs = fields
        .into_iter()
        .map(|(name, ty)| PropertySignature {
            name: name.to_string(),
            ty,
        })
        .collect();
    Ast::type_literal(property_sigs, Vec::new())
}

/// Build a fixed-length `TupleType` with no variadic rest.
#[must_use]
pub fn tuple(elements: Vec<Arc<Ast>>) -> Ast {
    Ast::tuple(elements, Vec::new())
}

/// Build a homogeneous `TupleType`: zero fixed elements, a single variadic
/// element type as the rest head.
#[must_use]
pub fn array(element: Arc<Ast>) -> Ast {
    Ast::tuple(Vec::new(), vec![element])
}

/// Build a `TypeLiteral` with a single index signature (a homogeneous
/// record keyed by `parameter`, mapping to `ty`).
#[must_use]
pub fn record(parameter: Arc<Ast>, ty: Arc<Ast>) -> Ast {
    Ast::type_literal(
        Vec::new(),
        vec![IndexSignature {
            parameter,
            ty,
            merge: None,
        }],
    )
}

/// Build an `AnyOf` union (the common case; use [`Ast::union`] directly for
/// `OneOf`).
#[must_use]
pub fn union(members: Vec<Arc<Ast>>) -> Ast {
    Ast::union(members, UnionMode::AnyOf)
}

/// Build a `OneOf` union.
#[must_use]
pub fn one_of(members: Vec<Arc<Ast>>) -> Ast {
    Ast::union(members, UnionMode::OneOf)
}

/// A single-value `LiteralType` over a string.
#[must_use]
pub fn literal_str(value: impl Into<String>) -> Ast {
    Ast::literal(LiteralValue::Str(value.into()))
}

/// A single-value `LiteralType` over a number.
#[must_use]
pub fn literal_num(value: f64) -> Ast {
    Ast::literal(LiteralValue::Num(value))
}

/// A closed set of named string/number values.
#[must_use]
pub fn enum_(members: Vec<(&str, &str)>) -> Ast {
    Ast::enums(
        members
            .into_iter()
            .map(|(name, value)| EnumMember {
                name: name.to_string(),
                value: crate::ast::EnumValue::Str(value.to_string()),
            })
            .collect(),
    )
}

/// A `TemplateLiteral` built from a leading literal and `(pattern, literal)`
/// spans.
#[must_use]
pub fn template(head: impl Into<String>, spans: Vec<(Arc<Ast>, &str)>) -> Ast {
    Ast::template_literal(
        head,
        spans
            .into_iter()
            .map(|(pattern, literal)| TemplateSpan {
                pattern,
                literal: literal.to_string(),
            })
            .collect(),
    )
}

/// Wrap `thunk` in a memoized `Suspend` node for recursive schemas.
#[must_use]
pub fn suspend(thunk: impl Fn() -> Arc<Ast> + Send + Sync + 'static) -> Ast {
    Ast::suspend(thunk)
}

/// Attach a title/description/example annotation.
#[must_use]
pub fn annotate(ast: Arc<Ast>, key: &str, value: Value) -> Arc<Ast> {
    let mut annotations = ast.ext.annotations.clone();
    annotations.insert(key.to_string(), value);
    Arc::new(Ast {
        node: ast.node.clone(),
        ext: Extensions {
            annotations,
            ..ast.ext.clone()
        },
    })
}

/// Bulk-set annotations, replacing whatever was there.
#[must_use]
pub fn annotate_all(ast: Arc<Ast>, annotations: HashMap<String, Value>) -> Arc<Ast> {
    Arc::new(Ast {
        node: ast.node.clone(),
        ext: Extensions {
            annotations,
            ..ast.ext.clone()
        },
    })
}

/// Append one check to the node's check list (thin wrapper over
/// [`crate::ast::append_checks`] for the common single-check case).
#[must_use]
pub fn check(ast: Arc<Ast>, c: Check) -> Arc<Ast> {
    crate::ast::append_checks(&ast, vec![c])
}

/// Add an encoding link that transforms to/from `to` via `transformation`
///. The new link is appended as the outermost step: encoding
/// chains are read innermost-to-outermost, and `encode_to` always describes
/// one more step further from the node's own typed form.
#[must_use]
pub fn encode_to(ast: Arc<Ast>, to: Arc<Ast>, transformation: Transformation) -> Arc<Ast> {
    let mut chain = ast.ext.encoding.clone().unwrap_or_default();
    chain.push(Link { to, transformation });
    crate::ast::replace_encoding(&ast, Some(chain))
}

/// Mark a node's `context.is_optional = true`.
#[must_use]
pub fn optional_key(ast: Arc<Ast>) -> Arc<Ast> {
    let mut ctx = ast.ext.context.clone().unwrap_or_default();
    ctx.is_optional = true;
    Arc::new(Ast {
        node: ast.node.clone(),
        ext: Extensions {
            context: Some(ctx),
            ..ast.ext.clone()
        },
    })
}

/// Clear a node's `context.is_readonly` flag (the inverse of
/// [`mutable_key`]'s counterpart, exposed for symmetry).
#[must_use]
pub fn readonly_key(ast: Arc<Ast>) -> Arc<Ast> {
    let mut ctx = ast.ext.context.clone().unwrap_or_default();
    ctx.is_readonly = true;
    Arc::new(Ast {
        node: ast.node.clone(),
        ext: Extensions {
            context: Some(ctx),
            ..ast.ext.clone()
        },
    })
}

/// Mark a node's `context.is_readonly = false`.
#[must_use]
pub fn mutable_key(ast: Arc<Ast>) -> Arc<Ast> {
    let mut ctx = ast.ext.context.clone().unwrap_or_default();
    ctx.is_readonly = false;
    Arc::new(Ast {
        node: ast.node.clone(),
        ext: Extensions {
            context: Some(ctx),
            ..ast.ext.clone()
        },
    })
}

/// Set the constructor-default transformation used under
/// `ParseOptions { variant: Variant::Make, .. }`.
#[must_use]
pub fn set_ctor_default(ast: Arc<Ast>, default: Transformation) -> Arc<Ast> {
    let mut ctx = ast.ext.context.clone().unwrap_or_default();
    ctx.ctor_default = Some(default);
    Arc::new(Ast {
        node: ast.node.clone(),
        ext: Extensions {
            context: Some(ctx),
            ..ast.ext.clone()
        },
    })
}

macro_rules! is_variant {
    ($(($fn_name:ident, $variant:pat)),* $(,)?) => {
        $(
            #[must_use]
            pub fn $fn_name(ast: &Ast) -> bool {
                matches!(ast.node, $variant)
            }
        )*
    };
}

is_variant!(
    (is_null_kw, AstNode::NullKw),
    (is_string_kw, AstNode::StringKw),
    (is_number_kw, AstNode::NumberKw),
    (is_bool_kw, AstNode::BoolKw),
    (is_bigint_kw, AstNode::BigIntKw),
    (is_symbol_kw, AstNode::SymbolKw),
    (is_object_kw, AstNode::ObjectKw),
    (is_any_kw, AstNode::AnyKw),
    (is_unknown_kw, AstNode::UnknownKw),
    (is_never_kw, AstNode::NeverKw),
    (is_void_kw, AstNode::VoidKw),
    (is_undefined_kw, AstNode::UndefinedKw),
    (is_literal, AstNode::LiteralType(_)),
    (is_unique_symbol, AstNode::UniqueSymbol(_)),
    (is_enums, AstNode::Enums(_)),
    (is_template_literal, AstNode::TemplateLiteral { .. }),
    (is_tuple, AstNode::TupleType { .. }),
    (is_type_literal, AstNode::TypeLiteral { .. }),
    (is_union, AstNode::UnionType { .. }),
    (is_suspend, AstNode::Suspend(_)),
    (is_declaration, AstNode::Declaration { .. }),
);
