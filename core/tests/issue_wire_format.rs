//! Integration coverage for the `Issue` tree's wire serialization and the
//! check-group evaluation it's built from.

use schema_core::check::{run_checks, Check};
use schema_core::issue::{composite, pointer, IssueKind};
use schema_core::{Ast, Issue, Value};
use std::sync::Arc;

#[test]
fn nested_pointer_and_composite_serializes_to_expected_shape() {
    let ast = Arc::new(Ast::string_kw());
    let issue = pointer(
        "items",
        pointer(
            0usize,
            composite(
                ast,
                Value::Null,
                vec![Issue::MissingKey, Issue::Forbidden {
                    actual: Value::Num(1.0),
                    reason: "extra key".into(),
                }],
            ),
        ),
    );
    let wire = issue.to_wire();
    assert_eq!(wire.kind, IssueKind::Composite);
    assert_eq!(wire.path.len(), 2);
    let children = wire.children.expect("composite has children");
    assert_eq!(children.len(), 2);
    assert_eq!(children[1].kind, IssueKind::Forbidden);
    assert_eq!(children[1].message.as_deref(), Some("extra key"));

    let json = serde_json::to_string(&wire).expect("IssueWire serializes");
    assert!(json.contains("\"kind\":\"composite\""));
}

#[test]
fn filter_group_check_reports_every_failure_under_errors_all() {
    let positive = Check::filter_with_message("positive", "must be positive", |v| {
        matches!(v, Value::Num(n) if *n > 0.0)
    });
    let even = Check::filter_with_message("even", "must be even", |v| {
        matches!(v, Value::Num(n) if (*n as i64) % 2 == 0)
    });
    let group = Check::group("numeric", vec![positive, even]);

    let failures = run_checks(&[group], &Value::Num(-3.0), true).expect("both checks fail");
    assert_eq!(failures.len(), 2);
}
