//! Dynamic values produced, measured and simplified by strategies.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A value governed by a [`Strategy`](crate::strategy::Strategy)
///
/// Equality and hashing are structural. Floats compare by bit pattern, so
/// `NaN` equals itself as a value and `0.0` differs from `-0.0`. Ordering is
/// total (floats use `total_cmp`), which is what keeps set and map values in
/// a canonical order.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Fixed-arity heterogeneous sequence
    Tuple(Vec<Value>),
    /// Variable-length homogeneous sequence
    List(Vec<Value>),
    /// Strictly ascending, duplicate-free elements
    Set(Vec<Value>),
    /// Entries with strictly ascending, unique keys
    Map(Vec<(Value, Value)>),
    /// A named variant wrapping a payload
    Tagged(String, Box<Value>),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Text(_) => 3,
            Value::Tuple(_) => 4,
            Value::List(_) => 5,
            Value::Set(_) => 6,
            Value::Map(_) => 7,
            Value::Tagged(_, _) => 8,
        }
    }

    /// Build a canonical set value from arbitrary elements
    pub fn set_from(elements: impl IntoIterator<Item = Value>) -> Self {
        let mut elements: Vec<Value> = elements.into_iter().collect();
        elements.sort();
        elements.dedup();
        Value::Set(elements)
    }

    /// Build a canonical map value; the first entry for a key wins
    pub fn map_from(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut canonical: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            if let Err(idx) = canonical.binary_search_by(|(k, _)| k.cmp(&key)) {
                canonical.insert(idx, (key, value));
            }
        }
        Value::Map(canonical)
    }

    pub fn tagged(tag: impl Into<String>, payload: Value) -> Self {
        Value::Tagged(tag.into(), Box::new(payload))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a tuple, list or set
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn entries(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Tag and payload of a tagged value
    pub fn tag(&self) -> Option<(&str, &Value)> {
        match self {
            Value::Tagged(tag, payload) => Some((tag, payload)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            // total_cmp orders by bit pattern class, so equal iff bits are equal
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b))
            | (Value::List(a), Value::List(b))
            | (Value::Set(a), Value::Set(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::Tagged(ta, a), Value::Tagged(tb, b)) => ta.cmp(tb).then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => items.hash(state),
            Value::Map(entries) => entries.hash(state),
            Value::Tagged(tag, payload) => {
                tag.hash(state);
                payload.hash(state);
            }
        }
    }
}

fn write_joined<T, F>(f: &mut fmt::Formatter<'_>, items: &[T], mut each: F) -> fmt::Result
where
    F: FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
{
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        each(f, item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_joined(f, items, |f, v| write!(f, "{}", v))?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::List(items) => {
                write!(f, "[")?;
                write_joined(f, items, |f, v| write!(f, "{}", v))?;
                write!(f, "]")
            }
            Value::Set(items) => {
                write!(f, "{{")?;
                write_joined(f, items, |f, v| write!(f, "{}", v))?;
                write!(f, "}}")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                write_joined(f, entries, |f, (k, v)| write!(f, "{}: {}", k, v))?;
                write!(f, "}}")
            }
            Value::Tagged(tag, payload) => match payload.as_ref() {
                Value::Tuple(args) => {
                    write!(f, "{}(", tag)?;
                    write_joined(f, args, |f, v| write!(f, "{}", v))?;
                    write!(f, ")")
                }
                other => write!(f, "{}({})", tag, other),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_eq!(Value::Float(1.5), Value::Float(1.5));
    }

    #[test]
    fn test_hash_agrees_with_eq() {
        let mut seen = HashSet::new();
        seen.insert(Value::Float(f64::NAN));
        seen.insert(Value::Float(f64::NAN));
        seen.insert(Value::List(vec![Value::Int(1), Value::Int(2)]));
        seen.insert(Value::List(vec![Value::Int(1), Value::Int(2)]));
        seen.insert(Value::Tuple(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_set_from_is_canonical() {
        let set = Value::set_from(vec![Value::Int(3), Value::Int(1), Value::Int(3)]);
        assert_eq!(set, Value::Set(vec![Value::Int(1), Value::Int(3)]));
    }

    #[test]
    fn test_map_from_keeps_first_entry() {
        let map = Value::map_from(vec![
            (Value::Int(2), Value::from("b")),
            (Value::Int(1), Value::from("a")),
            (Value::Int(2), Value::from("c")),
        ]);
        assert_eq!(
            map,
            Value::Map(vec![
                (Value::Int(1), Value::from("a")),
                (Value::Int(2), Value::from("b")),
            ])
        );
    }

    #[test]
    fn test_display() {
        let value = Value::Tuple(vec![
            Value::Int(1),
            Value::List(vec![Value::Float(0.5)]),
            Value::tagged("add", Value::Tuple(vec![Value::Int(3)])),
        ]);
        assert_eq!(format!("{}", value), "(1, [0.5], add(3))");
        assert_eq!(format!("{}", Value::Tuple(vec![Value::Bool(true)])), "(true,)");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(4).as_int(), Some(4));
        assert_eq!(Value::Int(4).as_float(), None);
        assert_eq!(Value::from("hi").as_text(), Some("hi"));
        let tagged = Value::tagged("remove", Value::Int(1));
        assert_eq!(tagged.tag(), Some(("remove", &Value::Int(1))));
    }
}
