//! Key validation and delimited key paths.
//!
//! A key addresses a value inside a store: `server:http:port` walks
//! `{"server": {"http": {"port": ...}}}`. Keys that cannot name anything
//! (objects, arrays, booleans) are not rejected; they degrade to a sentinel
//! segment that never matches stored data, so lookups simply miss.

use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::fmt;

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: &str = ":";

/// A validated configuration key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Key {
    /// The store root (`None`, `()`, `""` or JSON `null`).
    #[default]
    Root,
    /// A delimited key, not yet split.
    Path(String),
    /// A key of an unsupported type; carries the type name.
    Invalid(&'static str),
    /// An object used as a key. `merge` merges it into the root; everywhere
    /// else it behaves like `Invalid("object")`.
    Object(Map<String, Value>),
}

impl Key {
    /// Sentinel segment substituted for an invalid key of `type_name`.
    pub fn sentinel(type_name: &str) -> String {
        format!("__invalid_valuetype_of_{}__", type_name)
    }

    /// Classify a dynamic value as a key.
    ///
    /// This is the only place key types are inspected; everything downstream
    /// works with the resulting `Key`.
    pub fn validate(value: &Value) -> Key {
        match value {
            Value::Null => Key::Root,
            Value::String(s) => Key::from(s.as_str()),
            Value::Number(n) => Key::Path(number_text(n)),
            Value::Bool(_) => Key::Invalid("boolean"),
            Value::Array(_) => Key::Invalid("object"),
            Value::Object(map) => Key::Object(map.clone()),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Key::Root)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Key::Invalid(_) | Key::Object(_))
    }

    /// The object carried by an object key.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Key::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Textual form: `""` for the root, the sentinel for invalid keys.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Key::Root => Cow::Borrowed(""),
            Key::Path(s) => Cow::Borrowed(s),
            Key::Invalid(ty) => Cow::Owned(Key::sentinel(ty)),
            Key::Object(_) => Cow::Owned(Key::sentinel("object")),
        }
    }

    /// Split into path segments on `separator`.
    ///
    /// An empty separator keeps the whole key as one segment.
    pub fn segments(&self, separator: &str) -> Vec<String> {
        match self {
            Key::Root => Vec::new(),
            Key::Invalid(ty) => vec![Key::sentinel(ty)],
            Key::Object(_) => vec![Key::sentinel("object")],
            Key::Path(s) if separator.is_empty() => vec![s.clone()],
            Key::Path(s) => s.split(separator).map(str::to_owned).collect(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Key::Root
        } else {
            Key::Path(s.to_owned())
        }
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        if s.is_empty() { Key::Root } else { Key::Path(s) }
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::from(s.as_str())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl From<()> for Key {
    fn from(_: ()) -> Self {
        Key::Root
    }
}

impl<T: Into<Key>> From<Option<T>> for Key {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Key::Root)
    }
}

impl From<&Value> for Key {
    fn from(value: &Value) -> Self {
        Key::validate(value)
    }
}

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        Key::validate(&value)
    }
}

macro_rules! key_from_integer {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Key {
            fn from(n: $ty) -> Self {
                Key::Path(n.to_string())
            }
        })*
    };
}

key_from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for Key {
    fn from(n: f64) -> Self {
        Key::Path(float_text(n))
    }
}

fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => float_text(f),
        _ => n.to_string(),
    }
}

/// Natural decimal text: `1.0` is `"1"`, `4.3` is `"4.3"`.
fn float_text(f: f64) -> String {
    if f.is_infinite() {
        if f > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else {
        format!("{}", f)
    }
}

/// Split `key` into path segments using `separator`.
pub fn path(key: impl Into<Key>, separator: &str) -> Vec<String> {
    key.into().segments(separator)
}

/// Join key parts with the default `:` separator.
pub fn key<I, K>(parts: I) -> String
where
    I: IntoIterator<Item = K>,
    K: Into<Key>,
{
    keyed(DEFAULT_SEPARATOR, parts)
}

/// Join key parts with `separator`, replacing invalid parts with their sentinel.
pub fn keyed<I, K>(separator: &str, parts: I) -> String
where
    I: IntoIterator<Item = K>,
    K: Into<Key>,
{
    parts
        .into_iter()
        .map(|part| part.into().as_text().into_owned())
        .collect::<Vec<_>>()
        .join(separator)
}
