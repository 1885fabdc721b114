//! End-to-end decode/encode coverage across the container shapes, driven
//! through the top-level `decode_unknown`/`encode_unknown` entry points
//! rather than any single parser module in isolation.

use schema_interpreter::interpreter::ParserOutcome;
use schema_interpreter::{decode_unknown, encode_unknown, ParseOptions, Value};
use schema_core::ast::Ast;
use schema_core::combinators::{array, one_of, optional_key, struct_, suspend, union};
use schema_core::transform::{encode_forbidden, string_coercion};
use std::sync::Arc;

fn ready(outcome: ParserOutcome) -> Result<Option<Value>, schema_core::Issue> {
    match outcome {
        ParserOutcome::Ready(r) => r,
        ParserOutcome::Pending(_) => panic!("unexpected suspension in a synchronous schema"),
    }
}

fn map(entries: Vec<(&str, Value)>) -> Value {
    let mut m = indexmap::IndexMap::new();
    for (k, v) in entries {
        m.insert(schema_core::Key::from(k), v);
    }
    Value::Map(m)
}

#[test]
fn nested_struct_with_array_and_optional_field_round_trips() {
    let schema = Arc::new(struct_(vec![
        ("name", Arc::new(Ast::string_kw())),
        ("tags", Arc::new(array(Arc::new(Ast::string_kw())))),
        ("nickname", optional_key(Arc::new(Ast::string_kw()))),
    ]));

    let input = map(vec![
        ("name", Value::Str("Ada".into())),
        ("tags", Value::Seq(vec![Value::Str("math".into())])),
    ]);
    let decoded = ready(decode_unknown(&schema, Some(input.clone()), ParseOptions::default()))
        .expect("decode succeeds without the optional field");
    assert_eq!(decoded, Some(input));
}

#[test]
fn missing_required_field_without_exact_mode_is_a_missing_key_pointer() {
    let schema = Arc::new(struct_(vec![("name", Arc::new(Ast::string_kw()))]));
    let result = ready(decode_unknown(
        &schema,
        Some(map(vec![])),
        ParseOptions::default(),
    ));
    match result {
        Err(schema_core::Issue::Pointer { inner, .. }) => {
            assert!(matches!(*inner, schema_core::Issue::MissingKey));
        }
        other => panic!("expected Pointer(MissingKey), got {other:?}"),
    }
}

#[test]
fn exact_mode_rejects_a_present_optional_field_absence_differently_than_default() {
    let schema = Arc::new(struct_(vec![(
        "nickname",
        optional_key(Arc::new(Ast::string_kw())),
    )]));
    let lenient = ready(decode_unknown(&schema, Some(map(vec![])), ParseOptions::default()));
    assert!(lenient.is_ok());

    let strict = ready(decode_unknown(&schema, Some(map(vec![])), ParseOptions::collect_all()));
    // collect_all alone doesn't imply exact; still ok.
    assert!(strict.is_ok());

    let mut exact_opts = ParseOptions::default();
    exact_opts.exact = true;
    let exact = ready(decode_unknown(&schema, Some(map(vec![])), exact_opts));
    assert!(exact.is_err());
}

fn list_ast() -> Arc<Ast> {
    Arc::new(union(vec![
        Arc::new(Ast::null_kw()),
        Arc::new(struct_(vec![
            ("value", Arc::new(Ast::number_kw())),
            ("next", Arc::new(suspend(list_ast))),
        ])),
    ]))
}

#[test]
fn recursive_schema_decodes_an_arbitrarily_nested_linked_list() {
    let list = list_ast();

    let nested = map(vec![
        ("value", Value::Num(1.0)),
        (
            "next",
            map(vec![("value", Value::Num(2.0)), ("next", Value::Null)]),
        ),
    ]);
    let decoded = ready(decode_unknown(&list, Some(nested.clone()), ParseOptions::default()));
    assert_eq!(decoded.unwrap(), Some(nested));
}

#[test]
fn encode_to_chain_coerces_then_validates_the_wire_type() {
    let schema = schema_core::combinators::encode_to(
        Arc::new(Ast::string_kw()),
        Arc::new(Ast::string_kw()),
        string_coercion(),
    );
    let decoded = ready(decode_unknown(&schema, Some(Value::Str("7".into())), ParseOptions::default()));
    assert_eq!(decoded.unwrap(), Some(Value::Str("7".into())));

    let encoded = ready(encode_unknown(&schema, Some(Value::Str("7".into())), ParseOptions::default()));
    assert_eq!(encoded.unwrap(), Some(Value::Str("7".into())));
}

#[test]
fn encode_forbidden_link_vetoes_encode_but_allows_decode() {
    let schema = schema_core::combinators::encode_to(
        Arc::new(Ast::string_kw()),
        Arc::new(Ast::string_kw()),
        encode_forbidden(|s| Ok(s), "legacy field, write-once"),
    );
    let decoded = ready(decode_unknown(&schema, Some(Value::Str("x".into())), ParseOptions::default()));
    assert!(decoded.is_ok());

    let encoded = ready(encode_unknown(&schema, Some(Value::Str("x".into())), ParseOptions::default()));
    assert!(matches!(encoded, Err(schema_core::Issue::Forbidden { .. })));
}

#[test]
fn one_of_union_picks_the_unambiguous_struct_shape() {
    let a = Arc::new(struct_(vec![("kind", Arc::new(schema_core::combinators::literal_str("a")))]));
    let b = Arc::new(struct_(vec![("kind", Arc::new(schema_core::combinators::literal_str("b")))]));
    let schema = Arc::new(one_of(vec![a, b]));

    let input = map(vec![("kind", Value::Str("b".into()))]);
    let decoded = ready(decode_unknown(&schema, Some(input.clone()), ParseOptions::default()));
    assert_eq!(decoded.unwrap(), Some(input));
}
