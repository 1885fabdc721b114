//! Integration-level coverage of the AST rewrite helpers: identity-memoized
//! `type_ast`/`flip`, recursive `Suspend` termination, and the combinator
//! surface layered over raw `Ast` variants.

use schema_core::ast::{self, Ast, Link};
use schema_core::combinators::{array, optional_key, struct_, union};
use schema_core::transform::string_coercion;
use std::sync::Arc;

#[test]
fn flip_is_an_involution_across_a_nested_schema() {
    let schema = Arc::new(struct_(vec![
        ("name", Arc::new(Ast::string_kw())),
        ("tags", Arc::new(array(Arc::new(Ast::string_kw())))),
    ]));
    let flipped = ast::flip(&schema);
    let flipped_twice = ast::flip(&flipped);
    assert!(Arc::ptr_eq(&schema, &flipped_twice));
}

#[test]
fn type_ast_strips_encoding_chains_from_every_node_and_is_memoized() {
    let inner = Arc::new(Ast::number_kw());
    let outer = Arc::new(Ast {
        node: ast::AstNode::StringKw,
        ext: ast::Extensions {
            encoding: Some(vec![Link {
                to: Arc::clone(&inner),
                transformation: string_coercion(),
            }]),
            ..ast::Extensions::default()
        },
    });
    let typed = ast::type_ast(&outer);
    assert!(typed.ext.encoding.is_none());
    assert!(Arc::ptr_eq(&ast::type_ast(&outer), &typed));
}

#[test]
fn suspend_cell_terminates_a_recursive_schema() {
    let cell = ast::SuspendCell::new(|| {
        Arc::new(union(vec![
            Arc::new(Ast::null_kw()),
            Arc::new(struct_(vec![("value", Arc::new(Ast::number_kw()))])),
        ]))
    });
    let forced_once = cell.force();
    let forced_twice = cell.force();
    assert!(Arc::ptr_eq(&forced_once, &forced_twice));
}

#[test]
fn optional_struct_field_is_reported_by_is_optional() {
    let schema = struct_(vec![(
        "nickname",
        optional_key(Arc::new(Ast::string_kw())),
    )]);
    match &schema.node {
        ast::AstNode::TypeLiteral { property_sigs, .. } => {
            assert!(property_sigs[0].ty.is_optional());
        }
        _ => panic!("expected TypeLiteral"),
    }
}
