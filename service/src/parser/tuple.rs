//! `TupleType` decode/encode.

use crate::interpreter::{go, wrap_pointer, Direction, Parser, ParserOutcome};
use schema_core::ast::{Ast, AstNode};
use schema_core::issue::composite;
use schema_core::{Issue, ParseOptions, Slot, Value};
use std::sync::Arc;

/// Build the tuple parser for `direction`. Suspension inside element
/// parsers is deliberately not supported here: tuples are a structural,
/// synchronous-only container in this engine (only `Declaration`/
/// `Middleware` leaves may suspend, and a suspending element nested inside
/// a tuple resolves through `go`'s own memoized dispatch before this
/// function's caller ever sees it, since array/record elements are
/// themselves driven to completion by their own chain parser).
pub fn build(self_ast: Arc<Ast>, direction: Direction) -> Parser {
    match direction {
        Direction::Decode => build_decode(self_ast),
        Direction::Encode => build_encode(self_ast),
    }
}

fn unpack(ast: &Ast) -> (&[Arc<Ast>], &[Arc<Ast>]) {
    match &ast.node {
        AstNode::TupleType { elements, rest, .. } => (elements, rest),
        _ => unreachable!("tuple parser built for non-tuple AST"),
    }
}

fn build_decode(self_ast: Arc<Ast>) -> Parser {
    Parser(Arc::new(move |input: Slot, options: ParseOptions| {
        let Some(Value::Seq(items)) = &input else {
            return ParserOutcome::Ready(match &input {
                None => Ok(None),
                _ => Err(Issue::InvalidType {
                    ast: Arc::clone(&self_ast),
                    actual: input.clone().unwrap_or(Value::Null),
                }),
            });
        };

        let (elements, rest) = unpack(&self_ast);
        let collect_all = options.is_errors_all();
        let mut output: Vec<Value> = Vec::with_capacity(items.len());
        let mut issues: Vec<Issue> = Vec::new();

        for (i, element) in elements.iter().enumerate() {
            let slot = items.get(i).cloned();
            match go(element, Direction::Decode).call(slot, options) {
                ParserOutcome::Ready(Ok(Some(v))) => output.push(v),
                ParserOutcome::Ready(Ok(None)) => {
                    if options.exact || !element.is_optional() {
                        let issue = wrap_pointer(i, Issue::MissingKey);
                        if collect_all {
                            issues.push(issue);
                        } else {
                            return ParserOutcome::Ready(Err(issue));
                        }
                    }
                }
                ParserOutcome::Ready(Err(e)) => {
                    let issue = wrap_pointer(i, e);
                    if collect_all {
                        issues.push(issue);
                    } else {
                        return ParserOutcome::Ready(Err(issue));
                    }
                }
                ParserOutcome::Pending(_) => {
                    return ParserOutcome::Ready(Err(Issue::InvalidValue {
                        actual: Value::Seq(items.clone()),
                        reason: "suspending element parsers are not supported inside TupleType"
                            .to_string(),
                    }));
                }
            }
        }

        if !rest.is_empty() {
            let head = &rest[0];
            let tail = &rest[1..];
            let variadic_end = items.len().saturating_sub(tail.len());
            for i in elements.len()..variadic_end {
                let slot = items.get(i).cloned();
                match go(head, Direction::Decode).call(slot, options) {
                    ParserOutcome::Ready(Ok(v)) => {
                        if let Some(v) = v {
                            output.push(v);
                        } else {
                            let issue = wrap_pointer(i, Issue::MissingKey);
                            if collect_all {
                                issues.push(issue);
                            } else {
                                return ParserOutcome::Ready(Err(issue));
                            }
                        }
                    }
                    ParserOutcome::Ready(Err(e)) => {
                        let issue = wrap_pointer(i, e);
                        if collect_all {
                            issues.push(issue);
                        } else {
                            return ParserOutcome::Ready(Err(issue));
                        }
                    }
                    ParserOutcome::Pending(_) => {
                        return ParserOutcome::Ready(Err(Issue::InvalidValue {
                            actual: Value::Seq(items.clone()),
                            reason: "suspending element parsers are not supported inside TupleType"
                                .to_string(),
                        }));
                    }
                }
            }
            for (j, tail_elem) in tail.iter().enumerate() {
                let i = variadic_end + j;
                let slot = items.get(i).cloned();
                match go(tail_elem, Direction::Decode).call(slot, options) {
                    ParserOutcome::Ready(Ok(v)) => {
                        if let Some(v) = v {
                            output.push(v);
                        }
                    }
                    ParserOutcome::Ready(Err(e)) => {
                        let issue = wrap_pointer(i, e);
                        if collect_all {
                            issues.push(issue);
                        } else {
                            return ParserOutcome::Ready(Err(issue));
                        }
                    }
                    ParserOutcome::Pending(_) => {
                        return ParserOutcome::Ready(Err(Issue::InvalidValue {
                            actual: Value::Seq(items.clone()),
                            reason: "suspending element parsers are not supported inside TupleType"
                                .to_string(),
                        }));
                    }
                }
            }
        }

        if !issues.is_empty() {
            return ParserOutcome::Ready(Err(composite(
                Arc::clone(&self_ast),
                Value::Seq(items.clone()),
                issues,
            )));
        }

        ParserOutcome::Ready(Ok(Some(Value::Seq(output))))
    }))
}

fn build_encode(self_ast: Arc<Ast>) -> Parser {
    Parser(Arc::new(move |input: Slot, options: ParseOptions| {
        let Some(Value::Seq(items)) = &input else {
            return ParserOutcome::Ready(match &input {
                None => Ok(None),
                _ => Err(Issue::InvalidType {
                    ast: Arc::clone(&self_ast),
                    actual: input.clone().unwrap_or(Value::Null),
                }),
            });
        };

        let (elements, rest) = unpack(&self_ast);
        let mut output: Vec<Value> = Vec::with_capacity(items.len());

        for (i, element) in elements.iter().enumerate() {
            let slot = items.get(i).cloned();
            match go(element, Direction::Encode).call(slot, options) {
                ParserOutcome::Ready(Ok(Some(v))) => output.push(v),
                ParserOutcome::Ready(Ok(None)) => {}
                ParserOutcome::Ready(Err(e)) => return ParserOutcome::Ready(Err(wrap_pointer(i, e))),
                ParserOutcome::Pending(_) => {
                    return ParserOutcome::Ready(Err(Issue::InvalidValue {
                        actual: Value::Seq(items.clone()),
                        reason: "suspending element parsers are not supported inside TupleType"
                            .to_string(),
                    }));
                }
            }
        }

        if let Some(head) = rest.first() {
            for i in elements.len()..items.len() {
                let slot = items.get(i).cloned();
                match go(head, Direction::Encode).call(slot, options) {
                    ParserOutcome::Ready(Ok(Some(v))) => output.push(v),
                    ParserOutcome::Ready(Ok(None)) => {}
                    ParserOutcome::Ready(Err(e)) => return ParserOutcome::Ready(Err(wrap_pointer(i, e))),
                    ParserOutcome::Pending(_) => {
                        return ParserOutcome::Ready(Err(Issue::InvalidValue {
                            actual: Value::Seq(items.clone()),
                            reason: "suspending element parsers are not supported inside TupleType"
                                .to_string(),
                        }));
                    }
                }
            }
        }

        ParserOutcome::Ready(Ok(Some(Value::Seq(output))))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_core::combinators::tuple as tuple_ctor;
    use schema_core::combinators::{array, optional_key};

    #[test]
    fn all_errors_mode_collects_every_failing_position() {
        let schema = Arc::new(tuple_ctor(vec![
            Arc::new(Ast::string_kw()),
            optional_key(Arc::new(Ast::number_kw())),
            Arc::new(Ast::string_kw()),
        ]));
        let input = Some(Value::Seq(vec![Value::Num(1.0), Value::Str("x".into()), Value::Num(2.0)]));
        let result = match go(&schema, Direction::Decode).call(input, ParseOptions::collect_all()) {
            ParserOutcome::Ready(r) => r,
            ParserOutcome::Pending(_) => panic!("unexpected suspension"),
        };
        match result {
            Err(Issue::Composite { children, .. }) => assert_eq!(children.len(), 3),
            other => panic!("expected Composite, got {other:?}"),
        }
    }

    #[test]
    fn array_decodes_homogeneous_sequence() {
        let schema = Arc::new(array(Arc::new(Ast::number_kw())));
        let input = Some(Value::Seq(vec![Value::Num(1.0), Value::Num(2.0)]));
        let result = match go(&schema, Direction::Decode).call(input, ParseOptions::default()) {
            ParserOutcome::Ready(r) => r,
            ParserOutcome::Pending(_) => panic!("unexpected suspension"),
        };
        assert_eq!(result.unwrap(), Some(Value::Seq(vec![Value::Num(1.0), Value::Num(2.0)])));
    }
}
