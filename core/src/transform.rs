//! Transformation & Getter
//!
//! A `Transformation` is a bidirectional, possibly-failing value mapping
//! embedded in a [`crate::ast::Link`]. A `Getter` is the underlying function
//! shape: total from `Slot` to a result that may succeed, fail with an
//! [`Issue`], or suspend — the two suspension points named there
//! are exactly a `Declaration`'s parser and a transformation's `decode`/
//! `encode`.

use crate::ast::Ast;
use crate::issue::Issue;
use crate::options::ParseOptions;
use crate::value::{Slot, Value};
use convert_case::{Case, Casing};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// The result of one `Getter` invocation.
pub type GetterResult = Result<Slot, Issue>;

/// Either a resolved result or a suspended computation.
pub enum GetterOutcome {
    /// The computation completed synchronously.
    Ready(GetterResult),
    /// The computation suspended; awaiting the future yields the result.
    Pending(BoxFuture<'static, GetterResult>),
}

impl GetterOutcome {
    /// Drive this outcome to completion, awaiting if it suspended.
    pub async fn resolve(self) -> GetterResult {
        match self {
            GetterOutcome::Ready(r) => r,
            GetterOutcome::Pending(fut) => fut.await,
        }
    }
}

impl fmt::Debug for GetterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GetterOutcome::Ready(r) => write!(f, "Ready({r:?})"),
            GetterOutcome::Pending(_) => write!(f, "Pending(..)"),
        }
    }
}

/// A getter that only needs the slot value.
pub type PlainGetter = Arc<dyn Fn(Slot) -> GetterOutcome + Send + Sync>;

/// A getter that additionally sees the AST node it sits on and the active
/// `ParseOptions` — the `Middleware` case.
pub type MiddlewareGetter = Arc<dyn Fn(Slot, Arc<Ast>, ParseOptions) -> GetterOutcome + Send + Sync>;

/// A total function from `Slot` to a (possibly suspending, possibly
/// failing) result, in its two shapes: plain and middleware.
#[derive(Clone)]
pub enum Getter {
    /// Sees only the slot value.
    Plain(PlainGetter),
    /// Also sees the AST node and parse options (Middleware).
    Middleware(MiddlewareGetter),
}

impl fmt::Debug for Getter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Getter::Plain(_) => f.write_str("Getter::Plain(..)"),
            Getter::Middleware(_) => f.write_str("Getter::Middleware(..)"),
        }
    }
}

impl Getter {
    /// Invoke the getter, supplying AST/options context for `Middleware`
    /// getters and ignoring it for `Plain` ones.
    pub fn call(&self, input: Slot, ast: &Arc<Ast>, options: ParseOptions) -> GetterOutcome {
        match self {
            Getter::Plain(f) => f(input),
            Getter::Middleware(f) => f(input, Arc::clone(ast), options),
        }
    }

    /// `true` if this getter needs AST/options context.
    #[must_use]
    pub fn is_middleware(&self) -> bool {
        matches!(self, Getter::Middleware(_))
    }
}

/// A bidirectional, possibly-failing value mapping.
///
/// Composition laws:
/// - `identity().flip() == identity()` (structurally: both sides are the
///   same pass-through getter)
/// - `t.flip().flip()` behaves identically to `t`
/// - composing with `identity()` in a chain is a no-op
#[derive(Clone, Debug)]
pub struct Transformation {
    pub decode: Getter,
    pub encode: Getter,
}

impl Transformation {
    /// Swap decode and encode.
    #[must_use]
    pub fn flip(self) -> Self {
        Transformation {
            decode: self.encode,
            encode: self.decode,
        }
    }
}

/// The nop transformation: `decode`/`encode` both echo the input unchanged.
#[must_use]
pub fn identity() -> Transformation {
    let pass: PlainGetter = Arc::new(|s: Slot| GetterOutcome::Ready(Ok(s)));
    Transformation {
        decode: Getter::Plain(Arc::clone(&pass)),
        encode: Getter::Plain(pass),
    }
}

/// Lift a pair of total, infallible functions into a `Transformation`.
pub fn transform<D, E>(decode: D, encode: E) -> Transformation
where
    D: Fn(Slot) -> Slot + Send + Sync + 'static,
    E: Fn(Slot) -> Slot + Send + Sync + 'static,
{
    Transformation {
        decode: Getter::Plain(Arc::new(move |s| GetterOutcome::Ready(Ok(decode(s))))),
        encode: Getter::Plain(Arc::new(move |s| GetterOutcome::Ready(Ok(encode(s))))),
    }
}

/// Lift a pair of partial functions into a `Transformation`.
pub fn transform_or_fail<D, E>(decode: D, encode: E) -> Transformation
where
    D: Fn(Slot) -> GetterResult + Send + Sync + 'static,
    E: Fn(Slot) -> GetterResult + Send + Sync + 'static,
{
    Transformation {
        decode: Getter::Plain(Arc::new(move |s| GetterOutcome::Ready(decode(s)))),
        encode: Getter::Plain(Arc::new(move |s| GetterOutcome::Ready(encode(s)))),
    }
}

/// Supplemented constructor (SPEC_FULL "Forbidden-producing encode-only
/// schemas"): build a transformation whose encode side unconditionally
/// vetoes with `Issue::Forbidden`, for authors marking a decode-only,
/// lossy coercion.
pub fn encode_forbidden<D>(decode: D, reason: impl Into<String> + Clone + Send + Sync + 'static) -> Transformation
where
    D: Fn(Slot) -> GetterResult + Send + Sync + 'static,
{
    Transformation {
        decode: Getter::Plain(Arc::new(move |s| GetterOutcome::Ready(decode(s)))),
        encode: Getter::Plain(Arc::new(move |s| {
            GetterOutcome::Ready(match &s {
                Some(v) => Err(Issue::Forbidden {
                    actual: v.clone(),
                    reason: reason.clone().into(),
                }),
                None => Ok(None),
            })
        })),
    }
}

fn invalid_value(actual: &Value, reason: &str) -> Issue {
    Issue::InvalidValue {
        actual: actual.clone(),
        reason: reason.to_string(),
    }
}

/// Coerce any value to a string.
///
/// Decode failures report `Issue::InvalidType` rather than `InvalidValue`:
/// coercion into `string` is a type-level carve-out, not a value-level
/// predicate failure.
#[must_use]
pub fn string_coercion() -> Transformation {
    Transformation {
        decode: Getter::Middleware(Arc::new(|s: Slot, ast: Arc<Ast>, _options| {
            GetterOutcome::Ready(match s {
                None => Ok(None),
                Some(Value::Str(_)) => Ok(s),
                Some(v @ Value::Num(_)) | Some(v @ Value::Bool(_)) | Some(v @ Value::BigInt(_)) => {
                    let rendered = match v {
                        Value::Num(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        Value::BigInt(i) => i.to_string(),
                        _ => unreachable!(),
                    };
                    Ok(Some(Value::Str(rendered)))
                }
                Some(v) => Err(Issue::InvalidType { ast, actual: v }),
            })
        })),
        encode: Getter::Plain(Arc::new(|s: Slot| {
            GetterOutcome::Ready(match s {
                Some(Value::Str(_)) | None => Ok(s),
                Some(v) => Err(invalid_value(&v, "expected a string to encode")),
            })
        })),
    }
}

/// Coerce any value to a number.
#[must_use]
pub fn number_coercion() -> Transformation {
    transform_or_fail(
        |s: Slot| match s {
            None => Ok(None),
            Some(Value::Num(_)) => Ok(s),
            Some(Value::Str(ref st)) => st
                .trim()
                .parse::<f64>()
                .map(|n| Some(Value::Num(n)))
                .map_err(|_| invalid_value(&Value::Str(st.clone()), "not a valid number")),
            Some(Value::Bool(b)) => Ok(Some(Value::Num(if b { 1.0 } else { 0.0 }))),
            Some(v) => Err(invalid_value(&v, "cannot coerce to number")),
        },
        |s: Slot| match s {
            Some(Value::Num(_)) | None => Ok(s),
            Some(v) => Err(invalid_value(&v, "expected a number to encode")),
        },
    )
}

/// Coerce any value to a boolean.
#[must_use]
pub fn boolean_coercion() -> Transformation {
    transform_or_fail(
        |s: Slot| match s {
            None => Ok(None),
            Some(Value::Bool(_)) => Ok(s),
            Some(Value::Str(ref st)) => match st.as_str() {
                "true" => Ok(Some(Value::Bool(true))),
                "false" => Ok(Some(Value::Bool(false))),
                _ => Err(invalid_value(&Value::Str(st.clone()), "not a valid boolean")),
            },
            Some(Value::Num(n)) => Ok(Some(Value::Bool(n != 0.0))),
            Some(v) => Err(invalid_value(&v, "cannot coerce to boolean")),
        },
        |s: Slot| match s {
            Some(Value::Bool(_)) | None => Ok(s),
            Some(v) => Err(invalid_value(&v, "expected a boolean to encode")),
        },
    )
}

/// Coerce a string, number, or boolean into a `BigInt`.
#[must_use]
pub fn bigint_coercion() -> Transformation {
    transform_or_fail(
        |s: Slot| match s {
            None => Ok(None),
            Some(Value::BigInt(_)) => Ok(s),
            Some(Value::Str(ref st)) => st
                .trim()
                .parse::<i128>()
                .map(|i| Some(Value::BigInt(i)))
                .map_err(|_| invalid_value(&Value::Str(st.clone()), "not a valid bigint")),
            Some(Value::Num(n)) if n.fract() == 0.0 => Ok(Some(Value::BigInt(n as i128))),
            Some(Value::Bool(b)) => Ok(Some(Value::BigInt(i128::from(b)))),
            Some(v) => Err(invalid_value(&v, "cannot coerce to bigint")),
        },
        |s: Slot| match s {
            Some(Value::BigInt(_)) | None => Ok(s),
            Some(v) => Err(invalid_value(&v, "expected a bigint to encode")),
        },
    )
}

/// Coerce a string (RFC 3339) or number (epoch millis) into a `Date`,
/// represented as an ISO-8601 string under `Value::Str`. Dates
/// have no dedicated `Value` variant; the engine keeps them as strings and
/// leaves any richer host type to the adapter layer.
#[must_use]
pub fn date_coercion() -> Transformation {
    transform_or_fail(
        |s: Slot| match s {
            None => Ok(None),
            Some(Value::Str(ref st)) => chrono::DateTime::parse_from_rfc3339(st)
                .map(|dt| Some(Value::Str(dt.to_rfc3339())))
                .map_err(|_| invalid_value(&Value::Str(st.clone()), "not a valid RFC3339 date")),
            Some(Value::Num(millis)) => {
                let secs = (millis / 1000.0) as i64;
                let nanos = ((millis.rem_euclid(1000.0)) * 1_000_000.0) as u32;
                chrono::DateTime::from_timestamp(secs, nanos)
                    .map(|dt| Some(Value::Str(dt.to_rfc3339())))
                    .ok_or_else(|| invalid_value(&Value::Num(millis), "epoch millis out of range"))
            }
            Some(v) => Err(invalid_value(&v, "cannot coerce to date")),
        },
        |s: Slot| match s {
            Some(Value::Str(_)) | None => Ok(s),
            Some(v) => Err(invalid_value(&v, "expected a date string to encode")),
        },
    )
}

fn map_str(s: Slot, f: impl Fn(&str) -> String) -> GetterResult {
    match s {
        None => Ok(None),
        Some(Value::Str(st)) => Ok(Some(Value::Str(f(&st)))),
        Some(v) => Err(invalid_value(&v, "expected a string")),
    }
}

/// Trim leading/trailing whitespace on decode; identity on encode
/// (`decode(trim, "  x  ") = "x"`, `encode(trim, "x") = "x"`).
#[must_use]
pub fn trim() -> Transformation {
    transform_or_fail(
        |s| map_str(s, |v| v.trim().to_string()),
        |s| map_str(s, |v| v.to_string()),
    )
}

/// Lowercase on decode, identity on encode.
#[must_use]
pub fn to_lower() -> Transformation {
    transform_or_fail(
        |s| map_str(s, str::to_lowercase),
        |s| map_str(s, |v| v.to_string()),
    )
}

/// Uppercase on decode, identity on encode.
#[must_use]
pub fn to_upper() -> Transformation {
    transform_or_fail(
        |s| map_str(s, str::to_uppercase),
        |s| map_str(s, |v| v.to_string()),
    )
}

fn snake_to_camel_str(s: &str) -> String {
    s.to_case(Case::Camel)
}

fn camel_to_snake_str(s: &str) -> String {
    s.to_case(Case::Snake)
}

/// Bidirectional case conversion: decode `snake_case -> camelCase`, encode
/// `camelCase -> snake_case`.
#[must_use]
pub fn snake_to_camel() -> Transformation {
    transform_or_fail(
        |s| map_str(s, snake_to_camel_str),
        |s| map_str(s, camel_to_snake_str),
    )
}

/// The standalone encoder direction of [`snake_to_camel`], exposed as its
/// own named transformation
#[must_use]
pub fn camel_to_snake() -> Transformation {
    transform_or_fail(
        |s| map_str(s, camel_to_snake_str),
        |s| map_str(s, snake_to_camel_str),
    )
}

/// On a `None` decode input, substitute `Some(f())`; the encoder is
/// identity.
pub fn with_decoding_default<F>(f: F) -> Transformation
where
    F: Fn() -> Value + Send + Sync + 'static,
{
    Transformation {
        decode: Getter::Plain(Arc::new(move |s: Slot| {
            GetterOutcome::Ready(Ok(s.or_else(|| Some(f()))))
        })),
        encode: Getter::Plain(Arc::new(|s: Slot| GetterOutcome::Ready(Ok(s)))),
    }
}

/// Decoder drops the key from its containing record unless `pred` holds on
/// the present value; encoder is identity.
pub fn omit_key_unless<P>(pred: P) -> Transformation
where
    P: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Transformation {
        decode: Getter::Plain(Arc::new(move |s: Slot| {
            GetterOutcome::Ready(Ok(match &s {
                Some(v) if pred(v) => s,
                _ => None,
            }))
        })),
        encode: Getter::Plain(Arc::new(|s: Slot| GetterOutcome::Ready(Ok(s)))),
    }
}

/// Decoder drops the key from its containing record when `pred` holds on
/// the present value; encoder is identity.
pub fn omit_key_when<P>(pred: P) -> Transformation
where
    P: Fn(&Value) -> bool + Send + Sync + 'static,
{
    omit_key_unless(move |v| !pred(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_sync(t: &Transformation, dir: &str, input: Slot) -> GetterResult {
        let ast = Arc::new(Ast::string_kw());
        let getter = if dir == "decode" { &t.decode } else { &t.encode };
        match getter.call(input, &ast, ParseOptions::default()) {
            GetterOutcome::Ready(r) => r,
            GetterOutcome::Pending(_) => panic!("unexpected suspension in sync test"),
        }
    }

    #[test]
    fn identity_round_trips() {
        let t = identity();
        let v = Some(Value::Str("x".into()));
        assert_eq!(run_sync(&t, "decode", v.clone()).unwrap(), v.clone());
        assert_eq!(run_sync(&t, "encode", v.clone()).unwrap(), v);
    }

    #[test]
    fn trim_strips_whitespace_on_decode_and_is_identity_on_encode() {
        let t = trim();
        assert_eq!(
            run_sync(&t, "decode", Some(Value::Str("  x  ".into()))).unwrap(),
            Some(Value::Str("x".into()))
        );
        assert_eq!(
            run_sync(&t, "encode", Some(Value::Str("x".into()))).unwrap(),
            Some(Value::Str("x".into()))
        );
    }

    #[test]
    fn snake_to_camel_then_camel_to_snake_round_trips() {
        let camel = snake_to_camel_str("hello_world");
        assert_eq!(camel, "helloWorld");
        assert_eq!(camel_to_snake_str(&camel), "hello_world");
    }

    #[test]
    fn number_coercion_parses_string() {
        let t = number_coercion();
        assert_eq!(
            run_sync(&t, "decode", Some(Value::Str("42".into()))).unwrap(),
            Some(Value::Num(42.0))
        );
        assert!(run_sync(&t, "decode", Some(Value::Str("x".into()))).is_err());
    }

    #[test]
    fn string_coercion_rejects_uncoercible_values_with_invalid_type() {
        let t = string_coercion();
        assert_eq!(
            run_sync(&t, "decode", Some(Value::Num(7.0))).unwrap(),
            Some(Value::Str("7".into()))
        );
        assert!(matches!(
            run_sync(&t, "decode", Some(Value::Seq(vec![]))),
            Err(Issue::InvalidType { .. })
        ));
    }

    #[test]
    fn with_decoding_default_substitutes_on_absence() {
        let t = with_decoding_default(|| Value::Num(7.0));
        assert_eq!(run_sync(&t, "decode", None).unwrap(), Some(Value::Num(7.0)));
        assert_eq!(
            run_sync(&t, "encode", Some(Value::Num(7.0))).unwrap(),
            Some(Value::Num(7.0))
        );
    }

    #[test]
    fn omit_key_unless_drops_on_false_predicate() {
        let t = omit_key_unless(|v| matches!(v, Value::Bool(true)));
        assert_eq!(run_sync(&t, "decode", Some(Value::Bool(false))).unwrap(), None);
        assert_eq!(
            run_sync(&t, "decode", Some(Value::Bool(true))).unwrap(),
            Some(Value::Bool(true))
        );
    }
}
