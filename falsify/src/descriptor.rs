//! Descriptors: structural descriptions of value spaces.

use std::fmt;

use crate::value::Value;

/// A description of a value space, resolved to a strategy by a
/// [`Registry`](crate::registry::Registry)
///
/// Descriptors are immutable and compared structurally, so they double as
/// cache keys for resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Descriptor {
    Bool,
    Int,
    Float,
    Text,
    /// Integers in the inclusive range `low..=high`
    IntRange { low: i64, high: i64 },
    /// Always the given value
    Just(Value),
    /// Positional, heterogeneous members
    Tuple(Vec<Descriptor>),
    /// Variable-length sequence of one element descriptor
    List(Box<Descriptor>),
    Set(Box<Descriptor>),
    /// Key descriptor, value descriptor
    Map(Box<Descriptor>, Box<Descriptor>),
    /// Disjunction of member descriptors
    OneOf(Vec<Descriptor>),
    /// A named variant around a payload descriptor
    Tagged(String, Box<Descriptor>),
    /// An opaque user tag; only user rules can resolve it
    Named(String),
}

/// The shape of a descriptor, used to register kind-wide rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Bool,
    Int,
    Float,
    Text,
    IntRange,
    Just,
    Tuple,
    List,
    Set,
    Map,
    OneOf,
    Tagged,
    Named,
}

impl Descriptor {
    pub fn tuple(members: impl IntoIterator<Item = Descriptor>) -> Self {
        Descriptor::Tuple(members.into_iter().collect())
    }

    pub fn list(element: Descriptor) -> Self {
        Descriptor::List(Box::new(element))
    }

    pub fn set(element: Descriptor) -> Self {
        Descriptor::Set(Box::new(element))
    }

    pub fn map(key: Descriptor, value: Descriptor) -> Self {
        Descriptor::Map(Box::new(key), Box::new(value))
    }

    pub fn one_of(members: impl IntoIterator<Item = Descriptor>) -> Self {
        Descriptor::OneOf(members.into_iter().collect())
    }

    pub fn tagged(tag: impl Into<String>, payload: Descriptor) -> Self {
        Descriptor::Tagged(tag.into(), Box::new(payload))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Descriptor::Named(name.into())
    }

    pub fn int_range(low: i64, high: i64) -> Self {
        Descriptor::IntRange { low, high }
    }

    pub fn just(value: impl Into<Value>) -> Self {
        Descriptor::Just(value.into())
    }

    pub fn kind(&self) -> DescriptorKind {
        match self {
            Descriptor::Bool => DescriptorKind::Bool,
            Descriptor::Int => DescriptorKind::Int,
            Descriptor::Float => DescriptorKind::Float,
            Descriptor::Text => DescriptorKind::Text,
            Descriptor::IntRange { .. } => DescriptorKind::IntRange,
            Descriptor::Just(_) => DescriptorKind::Just,
            Descriptor::Tuple(_) => DescriptorKind::Tuple,
            Descriptor::List(_) => DescriptorKind::List,
            Descriptor::Set(_) => DescriptorKind::Set,
            Descriptor::Map(_, _) => DescriptorKind::Map,
            Descriptor::OneOf(_) => DescriptorKind::OneOf,
            Descriptor::Tagged(_, _) => DescriptorKind::Tagged,
            Descriptor::Named(_) => DescriptorKind::Named,
        }
    }
}

fn write_members(f: &mut fmt::Formatter<'_>, members: &[Descriptor], sep: &str) -> fmt::Result {
    for (idx, member) in members.iter().enumerate() {
        if idx > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", member)?;
    }
    Ok(())
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Bool => write!(f, "bool"),
            Descriptor::Int => write!(f, "int"),
            Descriptor::Float => write!(f, "float"),
            Descriptor::Text => write!(f, "text"),
            Descriptor::IntRange { low, high } => write!(f, "int[{}..={}]", low, high),
            Descriptor::Just(value) => write!(f, "just({})", value),
            Descriptor::Tuple(members) => {
                write!(f, "(")?;
                write_members(f, members, ", ")?;
                write!(f, ")")
            }
            Descriptor::List(element) => write!(f, "[{}]", element),
            Descriptor::Set(element) => write!(f, "{{{}}}", element),
            Descriptor::Map(key, value) => write!(f, "{{{}: {}}}", key, value),
            Descriptor::OneOf(members) => {
                write!(f, "one_of(")?;
                write_members(f, members, " | ")?;
                write!(f, ")")
            }
            Descriptor::Tagged(tag, payload) => match payload.as_ref() {
                Descriptor::Tuple(_) => write!(f, "{}{}", tag, payload),
                other => write!(f, "{}({})", tag, other),
            },
            Descriptor::Named(name) => write!(f, "named:{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_structural_equality() {
        let a = Descriptor::list(Descriptor::tuple([Descriptor::Int, Descriptor::Text]));
        let b = Descriptor::list(Descriptor::tuple([Descriptor::Int, Descriptor::Text]));
        assert_eq!(a, b);

        let mut cache = HashMap::new();
        cache.insert(a, 1);
        assert_eq!(cache.get(&b), Some(&1));
    }

    #[test]
    fn test_kind() {
        assert_eq!(Descriptor::set(Descriptor::Int).kind(), DescriptorKind::Set);
        assert_eq!(Descriptor::named("foo").kind(), DescriptorKind::Named);
        assert_eq!(Descriptor::int_range(0, 3).kind(), DescriptorKind::IntRange);
    }

    #[test]
    fn test_display() {
        let descriptor = Descriptor::map(
            Descriptor::Text,
            Descriptor::one_of([Descriptor::Int, Descriptor::list(Descriptor::Float)]),
        );
        assert_eq!(format!("{}", descriptor), "{text: one_of(int | [float])}");
        let step = Descriptor::tagged("add", Descriptor::tuple([Descriptor::Int]));
        assert_eq!(format!("{}", step), "add(int)");
    }
}
