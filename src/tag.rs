use std::any::{Any, TypeId};
use std::fmt;

/// Exact runtime tag of a [`Value`](crate::Value).
///
/// Handler dispatch and terminal-membership checks compare tags, never
/// payloads. `Foreign` carries the `TypeId` of the wrapped Rust type, so
/// every user-defined type is its own tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Null,
    Bool,
    Int64,
    UInt64,
    Float64,
    Str,
    Bytes,
    List,
    Tuple,
    Map,
    Foreign(TypeId),
}

impl TypeTag {
    /// Tag of a user-defined type, for handler registration and terminal
    /// sets: `TypeTag::of::<MyType>()`.
    pub fn of<T: Any>() -> Self {
        TypeTag::Foreign(TypeId::of::<T>())
    }

    /// Short lowercase name. `TypeId` carries no portable name, so foreign
    /// tags all report `"foreign"`; [`Value::type_name`](crate::Value::type_name)
    /// knows the real one.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Bool => "bool",
            TypeTag::Int64 => "int64",
            TypeTag::UInt64 => "uint64",
            TypeTag::Float64 => "float64",
            TypeTag::Str => "str",
            TypeTag::Bytes => "bytes",
            TypeTag::List => "list",
            TypeTag::Tuple => "tuple",
            TypeTag::Map => "map",
            TypeTag::Foreign(_) => "foreign",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Class tag covering several exact tags at once.
///
/// Used only in terminal sets (see [`TypeSpec`]); registry keys are always
/// exact tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// Int64, UInt64, Float64.
    Numeric,
    /// Str, Bytes.
    Text,
    /// List, Tuple.
    Sequence,
    /// Map.
    Mapping,
}

impl TypeClass {
    pub fn contains(&self, tag: TypeTag) -> bool {
        match self {
            TypeClass::Numeric => {
                matches!(tag, TypeTag::Int64 | TypeTag::UInt64 | TypeTag::Float64)
            }
            TypeClass::Text => matches!(tag, TypeTag::Str | TypeTag::Bytes),
            TypeClass::Sequence => matches!(tag, TypeTag::List | TypeTag::Tuple),
            TypeClass::Mapping => matches!(tag, TypeTag::Map),
        }
    }
}

/// One terminal-set member.
///
/// `Exact` matches by tag identity; `Class` subsumes every tag in the
/// class. Both kinds may appear in the same set, so the caller picks the
/// membership semantics per descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSpec {
    Exact(TypeTag),
    Class(TypeClass),
}

impl TypeSpec {
    pub fn matches(&self, tag: TypeTag) -> bool {
        match self {
            TypeSpec::Exact(t) => *t == tag,
            TypeSpec::Class(c) => c.contains(tag),
        }
    }
}

impl From<TypeTag> for TypeSpec {
    fn from(tag: TypeTag) -> Self {
        TypeSpec::Exact(tag)
    }
}

impl From<TypeClass> for TypeSpec {
    fn from(class: TypeClass) -> Self {
        TypeSpec::Class(class)
    }
}

/// The caller-declared set of accepted types. Reaching any member ends
/// conversion. Fixed for the lifetime of its converter.
#[derive(Debug, Clone)]
pub struct TerminalSet {
    specs: Vec<TypeSpec>,
}

impl TerminalSet {
    /// Panics if `specs` yields no descriptor: a converter that accepts
    /// nothing can never return.
    pub fn new(specs: impl IntoIterator<Item = impl Into<TypeSpec>>) -> Self {
        let specs: Vec<TypeSpec> = specs.into_iter().map(Into::into).collect();
        assert!(
            !specs.is_empty(),
            "terminal set requires at least one type descriptor"
        );
        Self { specs }
    }

    pub fn contains(&self, tag: TypeTag) -> bool {
        self.specs.iter().any(|spec| spec.matches(tag))
    }

    pub fn specs(&self) -> &[TypeSpec] {
        &self.specs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_membership() {
        assert!(TypeClass::Numeric.contains(TypeTag::Int64));
        assert!(TypeClass::Numeric.contains(TypeTag::Float64));
        assert!(!TypeClass::Numeric.contains(TypeTag::Str));
        assert!(TypeClass::Sequence.contains(TypeTag::Tuple));
        assert!(!TypeClass::Sequence.contains(TypeTag::Map));
    }

    #[test]
    fn exact_spec_does_not_subsume() {
        let spec = TypeSpec::Exact(TypeTag::Int64);
        assert!(spec.matches(TypeTag::Int64));
        assert!(!spec.matches(TypeTag::Float64));
    }

    #[test]
    fn mixed_terminal_set() {
        let set = TerminalSet::new([
            TypeSpec::Exact(TypeTag::Str),
            TypeSpec::Class(TypeClass::Numeric),
        ]);
        assert!(set.contains(TypeTag::Str));
        assert!(set.contains(TypeTag::UInt64));
        assert!(!set.contains(TypeTag::Bytes));
        assert!(!set.contains(TypeTag::List));
    }

    #[test]
    fn foreign_tags_are_distinct_per_type() {
        struct A;
        struct B;
        assert_eq!(TypeTag::of::<A>(), TypeTag::of::<A>());
        assert_ne!(TypeTag::of::<A>(), TypeTag::of::<B>());
    }

    #[test]
    #[should_panic(expected = "at least one type descriptor")]
    fn empty_terminal_set_panics() {
        TerminalSet::new(Vec::<TypeSpec>::new());
    }
}
