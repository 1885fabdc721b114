//! `TypeLiteral` decode/encode: property signatures plus index signatures.

use crate::interpreter::{go, wrap_pointer, Direction, Parser, ParserOutcome};
use schema_core::ast::{Ast, AstNode, IndexSignature, PropertySignature};
use schema_core::issue::composite;
use schema_core::{Issue, Key, ParseOptions, Slot, Value};
use std::sync::Arc;
use tracing::warn;

pub fn build(self_ast: Arc<Ast>, direction: Direction) -> Parser {
    match direction {
        Direction::Decode => build_decode(self_ast),
        Direction::Encode => build_encode(self_ast),
    }
}

fn unpack(ast: &Ast) -> (&[PropertySignature], &[IndexSignature]) {
    match &ast.node {
        AstNode::TypeLiteral {
            property_sigs,
            index_sigs,
        } => (property_sigs, index_sigs),
        _ => unreachable!("record parser built for non-record AST"),
    }
}

fn build_decode(self_ast: Arc<Ast>) -> Parser {
    Parser(Arc::new(move |input: Slot, options: ParseOptions| {
        let (property_sigs, index_sigs) = unpack(&self_ast);

        if property_sigs.is_empty() && index_sigs.is_empty() {
            return ParserOutcome::Ready(match &input {
                None => Ok(None),
                Some(Value::Null) | Some(Value::Seq(_)) => Err(Issue::InvalidType {
                    ast: Arc::clone(&self_ast),
                    actual: input.clone().unwrap(),
                }),
                Some(v) => Ok(Some(v.clone())),
            });
        }

        let Some(Value::Map(map)) = &input else {
            return ParserOutcome::Ready(match &input {
                None => Ok(None),
                _ => Err(Issue::InvalidType {
                    ast: Arc::clone(&self_ast),
                    actual: input.clone().unwrap_or(Value::Null),
                }),
            });
        };

        let collect_all = options.is_errors_all();
        let mut out = indexmap::IndexMap::new();
        let mut issues: Vec<Issue> = Vec::new();

        for prop in property_sigs {
            let key = Key::from(prop.name.clone());
            let slot = map.get(&key).cloned();
            match go(&prop.ty, Direction::Decode).call(slot, options) {
                ParserOutcome::Ready(Ok(Some(v))) => {
                    out.insert(key, v);
                }
                ParserOutcome::Ready(Ok(None)) => {
                    if options.exact || !prop.ty.is_optional() {
                        let issue = wrap_pointer(prop.name.clone(), Issue::MissingKey);
                        if collect_all {
                            issues.push(issue);
                        } else {
                            return ParserOutcome::Ready(Err(issue));
                        }
                    }
                }
                ParserOutcome::Ready(Err(e)) => {
                    let issue = wrap_pointer(prop.name.clone(), e);
                    if collect_all {
                        issues.push(issue);
                    } else {
                        return ParserOutcome::Ready(Err(issue));
                    }
                }
                ParserOutcome::Pending(_) => {
                    return ParserOutcome::Ready(Err(Issue::InvalidValue {
                        actual: Value::Map(map.clone()),
                        reason: "suspending property parsers are not supported inside TypeLiteral"
                            .to_string(),
                    }));
                }
            }
        }

        // Remaining unhandled entries go through the index signatures, last
        // one matching wins when a key fits more than one signature and no
        // merge combiner is supplied.
        for (key, value) in map.iter() {
            if property_sigs.iter().any(|p| Key::from(p.name.clone()) == *key) {
                continue;
            }
            let mut decoded_entry: Option<(Key, Value)> = None;
            for sig in index_sigs {
                match key_matches(sig, key, options) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        if collect_all {
                            issues.push(e);
                            continue;
                        }
                        return ParserOutcome::Ready(Err(e));
                    }
                }
                match go(&sig.ty, Direction::Decode).call(Some(value.clone()), options) {
                    ParserOutcome::Ready(Ok(Some(v))) => {
                        let candidate = (key.clone(), v);
                        decoded_entry = Some(match (decoded_entry, &sig.merge) {
                            (None, _) => candidate,
                            (Some(prev), Some(merge)) => (merge.decode)(prev, candidate),
                            (Some(_), None) => {
                                warn!(key = ?key, "key matches multiple index signatures with no merge combiner, last match wins");
                                candidate
                            }
                        });
                    }
                    ParserOutcome::Ready(Ok(None)) => {}
                    ParserOutcome::Ready(Err(e)) => {
                        let issue = wrap_pointer(key_segment(key), e);
                        if collect_all {
                            issues.push(issue);
                        } else {
                            return ParserOutcome::Ready(Err(issue));
                        }
                    }
                    ParserOutcome::Pending(_) => {
                        return ParserOutcome::Ready(Err(Issue::InvalidValue {
                            actual: Value::Map(map.clone()),
                            reason: "suspending index parsers are not supported inside TypeLiteral"
                                .to_string(),
                        }));
                    }
                }
            }
            if let Some((k, v)) = decoded_entry {
                out.insert(k, v);
            } else if options.exact && index_sigs.is_empty() {
                let issue = wrap_pointer(key_segment(key), Issue::Forbidden {
                    actual: value.clone(),
                    reason: "unexpected key under exact mode".to_string(),
                });
                if collect_all {
                    issues.push(issue);
                } else {
                    return ParserOutcome::Ready(Err(issue));
                }
            }
        }

        if !issues.is_empty() {
            return ParserOutcome::Ready(Err(composite(
                Arc::clone(&self_ast),
                Value::Map(map.clone()),
                issues,
            )));
        }

        ParserOutcome::Ready(Ok(Some(Value::Map(out))))
    }))
}

fn build_encode(self_ast: Arc<Ast>) -> Parser {
    Parser(Arc::new(move |input: Slot, options: ParseOptions| {
        let (property_sigs, index_sigs) = unpack(&self_ast);

        if property_sigs.is_empty() && index_sigs.is_empty() {
            return ParserOutcome::Ready(match &input {
                None => Ok(None),
                Some(Value::Null) | Some(Value::Seq(_)) => Err(Issue::InvalidType {
                    ast: Arc::clone(&self_ast),
                    actual: input.clone().unwrap(),
                }),
                Some(v) => Ok(Some(v.clone())),
            });
        }

        let Some(Value::Map(map)) = &input else {
            return ParserOutcome::Ready(match &input {
                None => Ok(None),
                _ => Err(Issue::InvalidType {
                    ast: Arc::clone(&self_ast),
                    actual: input.clone().unwrap_or(Value::Null),
                }),
            });
        };

        let mut out = indexmap::IndexMap::new();

        for prop in property_sigs {
            let key = Key::from(prop.name.clone());
            let slot = map.get(&key).cloned();
            match go(&prop.ty, Direction::Encode).call(slot, options) {
                ParserOutcome::Ready(Ok(Some(v))) => {
                    out.insert(key, v);
                }
                ParserOutcome::Ready(Ok(None)) => {}
                ParserOutcome::Ready(Err(e)) => {
                    return ParserOutcome::Ready(Err(wrap_pointer(prop.name.clone(), e)))
                }
                ParserOutcome::Pending(_) => {
                    return ParserOutcome::Ready(Err(Issue::InvalidValue {
                        actual: Value::Map(map.clone()),
                        reason: "suspending property parsers are not supported inside TypeLiteral"
                            .to_string(),
                    }));
                }
            }
        }

        for (key, value) in map.iter() {
            if property_sigs.iter().any(|p| Key::from(p.name.clone()) == *key) {
                continue;
            }
            let mut encoded_entry: Option<(Key, Value)> = None;
            for sig in index_sigs {
                match go(&sig.ty, Direction::Encode).call(Some(value.clone()), options) {
                    ParserOutcome::Ready(Ok(Some(v))) => {
                        let candidate = (key.clone(), v);
                        encoded_entry = Some(match (encoded_entry, &sig.merge) {
                            (None, _) => candidate,
                            (Some(prev), Some(merge)) => (merge.encode)(prev, candidate),
                            (Some(_), None) => {
                                warn!(key = ?key, "key matches multiple index signatures with no merge combiner, last match wins");
                                candidate
                            }
                        });
                    }
                    ParserOutcome::Ready(Ok(None)) => {}
                    ParserOutcome::Ready(Err(e)) => {
                        return ParserOutcome::Ready(Err(wrap_pointer(key_segment(key), e)))
                    }
                    ParserOutcome::Pending(_) => {
                        return ParserOutcome::Ready(Err(Issue::InvalidValue {
                            actual: Value::Map(map.clone()),
                            reason: "suspending index parsers are not supported inside TypeLiteral"
                                .to_string(),
                        }));
                    }
                }
            }
            if let Some((k, v)) = encoded_entry {
                out.insert(k, v);
            }
        }

        ParserOutcome::Ready(Ok(Some(Value::Map(out))))
    }))
}

/// Validate `key` against an index signature's parameter type by decoding
/// its string/int form through that type's own parser.
fn key_matches(sig: &IndexSignature, key: &Key, options: ParseOptions) -> Result<bool, Issue> {
    let key_value = match key {
        Key::Str(s) => Value::Str(s.clone()),
        Key::Int(i) => Value::Num(*i as f64),
        Key::Sym(s) => Value::Sym(*s),
    };
    match go(&sig.parameter, Direction::Decode).call(Some(key_value), options) {
        ParserOutcome::Ready(Ok(_)) => Ok(true),
        ParserOutcome::Ready(Err(_)) => Ok(false),
        ParserOutcome::Pending(_) => Err(Issue::InvalidValue {
            actual: Value::Null,
            reason: "suspending index parameter parsers are not supported".to_string(),
        }),
    }
}

fn key_segment(key: &Key) -> schema_core::PathSegment {
    match key {
        Key::Str(s) => schema_core::PathSegment::Key(s.clone()),
        Key::Int(i) => schema_core::PathSegment::Index(*i as usize),
        Key::Sym(s) => schema_core::PathSegment::Sym(*s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_core::combinators::{record, struct_};

    #[test]
    fn missing_required_property_is_missing_key() {
        let schema = Arc::new(struct_(vec![("name", Arc::new(Ast::string_kw()))]));
        let input = Some(Value::Map(indexmap::IndexMap::new()));
        let result = match go(&schema, Direction::Decode).call(input, ParseOptions::default()) {
            ParserOutcome::Ready(r) => r,
            ParserOutcome::Pending(_) => panic!("unexpected suspension"),
        };
        match result {
            Err(Issue::Pointer { inner, .. }) => assert!(matches!(*inner, Issue::MissingKey)),
            other => panic!("expected Pointer(MissingKey), got {other:?}"),
        }
    }

    #[test]
    fn empty_record_accepts_any_non_null_non_array_value() {
        let schema = Arc::new(struct_(vec![]));

        let num = go(&schema, Direction::Decode).call(Some(Value::Num(5.0)), ParseOptions::default());
        assert!(matches!(num, ParserOutcome::Ready(Ok(Some(Value::Num(n)))) if n == 5.0));

        let s = go(&schema, Direction::Decode).call(Some(Value::Str("x".into())), ParseOptions::default());
        assert!(matches!(s, ParserOutcome::Ready(Ok(Some(Value::Str(_))))));

        let null = go(&schema, Direction::Decode).call(Some(Value::Null), ParseOptions::default());
        assert!(matches!(null, ParserOutcome::Ready(Err(Issue::InvalidType { .. }))));

        let seq = go(&schema, Direction::Decode)
            .call(Some(Value::Seq(vec![])), ParseOptions::default());
        assert!(matches!(seq, ParserOutcome::Ready(Err(Issue::InvalidType { .. }))));

        let encoded =
            go(&schema, Direction::Encode).call(Some(Value::Num(5.0)), ParseOptions::default());
        assert!(matches!(encoded, ParserOutcome::Ready(Ok(Some(Value::Num(n)))) if n == 5.0));
    }

    #[test]
    fn index_signature_decodes_homogeneous_map() {
        let schema = Arc::new(record(Arc::new(Ast::string_kw()), Arc::new(Ast::number_kw())));
        let mut map = indexmap::IndexMap::new();
        map.insert(Key::from("a"), Value::Num(1.0));
        let input = Some(Value::Map(map));
        let result = match go(&schema, Direction::Decode).call(input, ParseOptions::default()) {
            ParserOutcome::Ready(r) => r,
            ParserOutcome::Pending(_) => panic!("unexpected suspension"),
        };
        assert!(result.unwrap().is_some());
    }
}
