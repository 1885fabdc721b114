//! Abstract value tree and the present/absent `Slot` wrapper
//!
//! The engine is agnostic to any concrete host serialization format; it only
//! requires this sum type. Adapters (JSON, YAML, CBOR, ...) convert into and
//! out of `Value` at the boundary; the engine itself never touches a wire
//! format directly.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A key in a [`Value::Map`]: a string, an integer, or an opaque symbol id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// String-keyed property.
    Str(String),
    /// Integer-keyed property (sparse arrays modeled as maps, tuple indices).
    Int(i64),
    /// Symbol-keyed property, identified by its interned id.
    Sym(u64),
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

/// An opaque, engine-recognized tag for [`Value::Opaque`] payloads (e.g. a
/// host's native `Date`, `RegExp`, or binary blob that should pass through
/// checks/transformations without the engine attempting to interpret it).
pub type TypeTag = Arc<str>;

/// The host-neutral value domain the engine decodes from and encodes to.
///
/// Immutable once constructed by a decoder; an encoder always builds a fresh
/// tree rather than mutating an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// The absence of any meaningful value, distinct from an absent slot.
    Null,
    /// A boolean.
    Bool(bool),
    /// A double-precision number.
    Num(f64),
    /// An arbitrary-precision integer.
    BigInt(i128),
    /// A UTF-8 string.
    Str(String),
    /// An opaque byte string.
    Bytes(Vec<u8>),
    /// An opaque symbol, identified by an interned id unique within a run.
    Sym(u64),
    /// An ordered sequence of values.
    Seq(Vec<Value>),
    /// An ordered mapping from key to value; preserves insertion order.
    Map(IndexMap<Key, Value>),
    /// A tagged opaque payload the engine passes through unexamined.
    Opaque(TypeTag, Arc<Value>),
}

impl Value {
    /// The runtime type tag used for union candidate-type pruning.
    #[must_use]
    pub fn tag(&self) -> ValueTag {
        match self {
            Value::Null => ValueTag::Null,
            Value::Bool(_) => ValueTag::Bool,
            Value::Num(_) => ValueTag::Num,
            Value::BigInt(_) => ValueTag::BigInt,
            Value::Str(_) => ValueTag::Str,
            Value::Bytes(_) => ValueTag::Bytes,
            Value::Sym(_) => ValueTag::Sym,
            Value::Seq(_) => ValueTag::Seq,
            Value::Map(_) => ValueTag::Map,
            Value::Opaque(..) => ValueTag::Opaque,
        }
    }

    /// `true` if this is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow as a string, if this is [`Value::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Borrow as a sequence, if this is [`Value::Seq`].
    #[must_use]
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Borrow as a mapping, if this is [`Value::Map`].
    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<Key, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// The runtime type tag of a [`Value`], used by union candidate pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    Null,
    Undefined,
    Bool,
    Num,
    BigInt,
    Str,
    Bytes,
    Sym,
    Seq,
    Map,
    Opaque,
}

/// A present/absent wrapper distinguishing "the slot is missing" from
/// "the slot is present and null".
///
/// This is a thin alias over [`std::option::Option`] rather than a
/// reimplementation: `None` already means absent and `Some`/`map`/
/// `is_some`/`is_none` are exactly the operations a present/absent slot
/// needs. Giving it a name keeps call sites self-documenting about which kind of
/// optionality is meant (slot presence, not `Value::Null`).
pub type Slot = Option<Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_matches_variant() {
        assert_eq!(Value::Null.tag(), ValueTag::Null);
        assert_eq!(Value::Bool(true).tag(), ValueTag::Bool);
        assert_eq!(Value::Str("x".into()).tag(), ValueTag::Str);
        assert_eq!(Value::Seq(vec![]).tag(), ValueTag::Seq);
    }

    #[test]
    fn slot_distinguishes_absent_from_null() {
        let absent: Slot = None;
        let present_null: Slot = Some(Value::Null);
        assert!(absent.is_none());
        assert!(present_null.is_some());
        assert!(present_null.unwrap().is_null());
    }

    #[test]
    fn key_conversions() {
        assert_eq!(Key::from("a"), Key::Str("a".to_string()));
        assert_eq!(Key::from(3i64), Key::Int(3));
    }
}
