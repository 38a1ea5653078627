//! Value types that flow through the router.
//!
//! Items have no fixed schema. A [`Value`] is a tagged union over scalars,
//! lists, dictionaries and records; host structs plug into it through
//! [`Record`], which keeps each member's declared name next to its alias tags
//! so field paths can address either.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shared handle to an item. Fan-out clones the handle, not the value.
pub type Item = Arc<Value>;

/// A structured value.
///
/// Equality is exact: values of different variants are never equal, so
/// `Value::Int(18) != Value::Float(18.0)`. The ordering operators of the
/// expression language normalize numbers before comparing; equality does not.
///
/// # Examples
///
/// ```
/// use matchcast::{Record, Value};
///
/// let detail = Record::new("Detail").with_aliased("Age", [("json", "age")], 19);
/// let msg = Record::new("Msg").with("Name", "ok").with_aliased("Detail", [("json", "detail")], detail);
/// let item = Value::from(msg);
///
/// assert!(item.is_record());
/// assert_eq!(item.type_name(), "record");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Absence of a value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Point in time.
    Timestamp(DateTime<Utc>),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Dictionary keyed by string.
    Map(BTreeMap<String, Value>),
    /// Host struct with named, optionally aliased members.
    Record(Record),
}

impl Value {
    /// Builds a dictionary value from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Whether this is `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this is a dictionary.
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Whether this is a record.
    pub const fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// The boolean, if this is one.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The signed integer, if this is one.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// The dictionary, if this is one.
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    /// The record, if this is one.
    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Record(r) => write!(f, "{r}"),
        }
    }
}

/// One member of a [`Record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    aliases: BTreeMap<String, String>,
    value: Value,
}

impl Member {
    /// Declared member name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alias of this member under `scheme` (for example `"json"`), if tagged.
    #[must_use]
    pub fn alias(&self, scheme: &str) -> Option<&str> {
        self.aliases.get(scheme).map(String::as_str)
    }

    /// The member value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}

/// A structured record: an ordered list of named members, each optionally
/// tagged with aliases under one or more naming schemes.
///
/// Records are how a host struct is presented to the field resolver. Two
/// records are equal when their type names and members are equal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    type_name: String,
    members: Vec<Member>,
}

impl Record {
    /// Creates an empty record of the given type.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            members: Vec::new(),
        }
    }

    /// Adds a member without alias tags.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    /// Adds a member tagged with `(scheme, alias)` pairs.
    #[must_use]
    pub fn with_aliased<S, A, I>(mut self, name: impl Into<String>, aliases: I, value: impl Into<Value>) -> Self
    where
        S: Into<String>,
        A: Into<String>,
        I: IntoIterator<Item = (S, A)>,
    {
        self.members.push(Member {
            name: name.into(),
            aliases: aliases
                .into_iter()
                .map(|(s, a)| (s.into(), a.into()))
                .collect(),
            value: value.into(),
        });
        self
    }

    /// Appends a member without alias tags.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.members.push(Member {
            name: name.into(),
            aliases: BTreeMap::new(),
            value: value.into(),
        });
    }

    /// Name of the host type this record stands for.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the record has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Looks up a member value by declared name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members
            .iter()
            .find(|m| m.name == name)
            .map(|m| &m.value)
    }

    /// Finds the member whose alias under `scheme` equals `alias`.
    ///
    /// This is a linear scan over all members on every call.
    #[must_use]
    pub fn member_by_alias(&self, scheme: &str, alias: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.alias(scheme) == Some(alias))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.type_name)?;
        for (i, m) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", m.name, m.value)?;
        }
        write!(f, "}}")
    }
}

// Integer-family values widen to i64 on the way in; u64 keeps its own variant
// so large unsigned values survive equality checks.
macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::UInt(v as u64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// JSON objects become dictionaries; numbers keep the narrowest exact variant.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    n.as_f64().map_or(Self::Null, Self::Float)
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality_is_exact() {
        assert_eq!(Value::from(18), Value::Int(18));
        assert_ne!(Value::Int(18), Value::Float(18.0));
        assert_ne!(Value::Int(18), Value::UInt(18));
        assert_eq!(Value::from(18u8), Value::from(18i64));
    }

    #[test]
    fn test_record_lookup() {
        let r = Record::new("Detail")
            .with("Name", "x")
            .with_aliased("Age", [("json", "age")], 19);

        assert_eq!(r.len(), 2);
        assert_eq!(r.get("Age"), Some(&Value::Int(19)));
        assert_eq!(r.get("age"), None);
        assert_eq!(r.member_by_alias("json", "age").map(Member::name), Some("Age"));
        assert!(r.member_by_alias("yaml", "age").is_none());
    }

    #[test]
    fn test_record_equality_includes_type_name() {
        let a = Record::new("A").with("x", 1);
        let b = Record::new("B").with("x", 1);
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_value_from_json() {
        let json = serde_json::json!({"name": "ok", "detail": {"age": 19, "score": 1.5}, "tags": ["a"]});
        let val = Value::from(json);

        let map = val.as_map().unwrap();
        assert_eq!(map.get("name"), Some(&Value::String("ok".into())));
        let detail = map.get("detail").and_then(Value::as_map).unwrap();
        assert_eq!(detail.get("age"), Some(&Value::Int(19)));
        assert_eq!(detail.get("score"), Some(&Value::Float(1.5)));
        assert_eq!(map.get("tags"), Some(&Value::List(vec![Value::from("a")])));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::Null), "null");
        assert_eq!(format!("{}", Value::from("hi")), "\"hi\"");
        assert_eq!(format!("{}", Value::map([("a", 1)])), "{a: 1}");
        let r = Record::new("Msg").with("Name", "ok");
        assert_eq!(format!("{}", Value::from(r)), "Msg{Name: \"ok\"}");
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }

    #[test]
    fn test_value_serialization() {
        let val = Value::map([("a", Value::from(1)), ("b", Value::from("x"))]);
        let json = serde_json::to_string(&val).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(val, back);
    }
}
