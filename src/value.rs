use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::tag::TypeTag;

/// Canonical value representation.
///
/// Everything is owned: handlers consume their input and produce a fresh
/// value, so there is no source buffer to borrow from. Composites are
/// recursive. User-defined types ride in `Foreign`, dispatched by
/// `TypeId`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    Bool(bool),
    Str(String),
    /// Opaque binary data.
    Bytes(Vec<u8>),
    /// Recursive; elements are reduced individually by whoever handles them.
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Ordered pairs. No Hash/Eq requirement on keys.
    Map(Vec<(Value, Value)>),
    /// User-defined type. Its tag is the payload's `TypeId`.
    Foreign(Foreign),
    Null,
}

impl Value {
    /// Wrap a user-defined value so it can flow through a reduction chain.
    pub fn foreign<T: Any + Send + Sync>(value: T) -> Self {
        Value::Foreign(Foreign::new(value))
    }

    /// Exact runtime tag of this value. O(1).
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Int64(_) => TypeTag::Int64,
            Value::UInt64(_) => TypeTag::UInt64,
            Value::Float64(_) => TypeTag::Float64,
            Value::Bool(_) => TypeTag::Bool,
            Value::Str(_) => TypeTag::Str,
            Value::Bytes(_) => TypeTag::Bytes,
            Value::List(_) => TypeTag::List,
            Value::Tuple(_) => TypeTag::Tuple,
            Value::Map(_) => TypeTag::Map,
            Value::Foreign(v) => TypeTag::Foreign(v.id),
            Value::Null => TypeTag::Null,
        }
    }

    /// Human-readable type name for diagnostics. Foreign values report the
    /// wrapped Rust type's name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Foreign(v) => v.name,
            other => other.tag().name(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

/// Plain-text rendering, the stringification a catch-all handler reaches
/// for. Scalars render bare, strings unquoted, composites as `[a, b]`,
/// `(a, b)` and `{k: v}`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items)?;
                f.write_str(")")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Foreign(v) => write!(f, "<{}>", v.name),
            Value::Null => f.write_str("null"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::UInt64(v) => serializer.serialize_u64(*v),
            Value::Float64(v) => serializer.serialize_f64(*v),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::List(items) | Value::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            // Payload is opaque; emit a marker naming the type.
            Value::Foreign(v) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$foreign", v.name)?;
                map.end()
            }
        }
    }
}

/// A user-defined value the engine dispatches on by `TypeId`.
#[derive(Clone)]
pub struct Foreign {
    id: TypeId,
    name: &'static str,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Foreign {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            payload: Arc::new(value),
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Shared ownership of the payload.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.payload).downcast::<T>().ok()
    }
}

impl fmt::Debug for Foreign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Foreign").field("type", &self.name).finish()
    }
}

/// Payload identity: clones of one `Foreign` are equal, separately
/// constructed payloads are not, even for the same Rust type.
impl PartialEq for Foreign {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_variants() {
        assert_eq!(Value::Int64(1).tag(), TypeTag::Int64);
        assert_eq!(Value::Str("x".into()).tag(), TypeTag::Str);
        assert_eq!(Value::Tuple(Vec::new()).tag(), TypeTag::Tuple);
        assert_eq!(Value::Null.tag(), TypeTag::Null);

        struct Custom;
        assert_eq!(Value::foreign(Custom).tag(), TypeTag::of::<Custom>());
    }

    #[test]
    fn foreign_type_name_is_the_rust_name() {
        struct Widget;
        let v = Value::foreign(Widget);
        assert!(v.type_name().ends_with("Widget"));
    }

    #[test]
    fn foreign_downcast() {
        struct Pair(i64, i64);
        let Value::Foreign(f) = Value::foreign(Pair(3, 4)) else {
            unreachable!()
        };
        assert!(f.is::<Pair>());
        assert!(!f.is::<String>());
        let pair = f.downcast_ref::<Pair>().unwrap();
        assert_eq!((pair.0, pair.1), (3, 4));
        assert!(f.downcast_ref::<String>().is_none());

        let shared = f.downcast::<Pair>().unwrap();
        assert_eq!(shared.1, 4);
        assert!(f.downcast::<String>().is_none());
    }

    #[test]
    fn foreign_equality_is_payload_identity() {
        struct Token(u8);
        let a = Value::foreign(Token(1));
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Value::foreign(Token(1)));
    }

    #[test]
    fn display_rendering() {
        let list = Value::List(vec![1i64.into(), "a".into()]);
        assert_eq!(list.to_string(), "[1, a]");

        let tuple = Value::Tuple(vec![true.into(), Value::Null]);
        assert_eq!(tuple.to_string(), "(true, null)");

        let map = Value::Map(vec![("k".into(), 7i64.into())]);
        assert_eq!(map.to_string(), "{k: 7}");

        assert_eq!(Value::Map(Vec::new()).to_string(), "{}");
        assert_eq!(Value::Str("bare".into()).to_string(), "bare");
    }

    #[test]
    fn serializes_to_json() {
        let value = Value::Map(vec![
            ("nums".into(), Value::List(vec![1i64.into(), 2i64.into()])),
            ("pair".into(), Value::Tuple(vec!["a".into(), "b".into()])),
            ("none".into(), Value::Null),
        ]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "nums": [1, 2],
                "pair": ["a", "b"],
                "none": null,
            })
        );
    }

    #[test]
    fn foreign_serializes_as_marker() {
        struct Opaque;
        let json = serde_json::to_string(&Value::foreign(Opaque)).unwrap();
        assert!(json.contains("$foreign"));
        assert!(json.contains("Opaque"));
    }
}
