//! Nested key/value store.
//!
//! A `Store` owns one JSON object and addresses into it with delimited keys,
//! e.g. `my:nested:key` ==> `{ "my": { "nested": { "key": ... } } }`.
//! Every other source kind is built on top of one.

use crate::error::{ConfigError, ConfigResult};
use crate::key::{DEFAULT_SEPARATOR, Key};
use crate::merge::merge_into;
use crate::parse::parse_values;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Construction options for a [`Store`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Reject writes once constructed.
    #[serde(alias = "readOnly")]
    pub read_only: bool,

    /// Separator between key segments (default `:`).
    #[serde(alias = "logicalSeparator")]
    pub logical_separator: String,

    /// Run string values through [`parse_value`](crate::parse::parse_value) on write.
    #[serde(alias = "parseValues")]
    pub parse_values: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            logical_separator: DEFAULT_SEPARATOR.to_string(),
            parse_values: false,
        }
    }
}

/// In-memory nested configuration store.
#[derive(Debug, Clone)]
pub struct Store {
    /// Always a JSON object.
    root: Value,
    read_only: bool,
    separator: String,
    parse_values: bool,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty, writable store.
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    /// Create an empty store from options.
    pub fn with_options(options: StoreOptions) -> Self {
        let separator = if options.logical_separator.is_empty() {
            DEFAULT_SEPARATOR.to_string()
        } else {
            options.logical_separator
        };
        Self {
            root: Value::Object(Map::new()),
            read_only: options.read_only,
            separator,
            parse_values: options.parse_values,
        }
    }

    /// Deserialize options from a dynamic value (`null` means defaults).
    pub fn from_options(options: &Value) -> ConfigResult<Self> {
        if options.is_null() {
            return Ok(Self::new());
        }
        let options = StoreOptions::deserialize(options)
            .map_err(|e| ConfigError::invalid_options("memory", e))?;
        Ok(Self::with_options(options))
    }

    /// Create a store whose root is a copy of `root`.
    ///
    /// Non-object values give an empty root.
    pub fn seeded(root: &Value, options: StoreOptions) -> Self {
        let mut store = Self::with_options(options);
        if root.is_object() {
            store.root = root.clone();
        }
        store
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn parses_values(&self) -> bool {
        self.parse_values
    }

    /// Run `f` with writes temporarily allowed, then restore the read-only flag.
    ///
    /// Adapters use this to populate themselves while staying read-only to
    /// everyone else.
    pub fn populate<R>(&mut self, f: impl FnOnce(&mut Store) -> R) -> R {
        let read_only = std::mem::replace(&mut self.read_only, false);
        let out = f(self);
        self.read_only = read_only;
        out
    }

    /// Look up `key`. The root key returns the whole root.
    ///
    /// Walking below a scalar is a miss, not an error.
    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        let mut target = &self.root;
        for segment in key.into().segments(&self.separator) {
            target = child(target, &segment)?;
        }
        Some(target)
    }

    /// Store a copy of `value` at `key`, creating intermediate objects.
    ///
    /// Setting the root requires an object, which replaces the root.
    pub fn set(&mut self, key: impl Into<Key>, value: &Value) -> bool {
        if self.read_only {
            return false;
        }
        let segments = key.into().segments(&self.separator);
        self.assign(&segments, value)
    }

    /// Remove `key`. Fails when an intermediate segment is not a container.
    pub fn clear(&mut self, key: impl Into<Key>) -> bool {
        if self.read_only {
            return false;
        }
        let segments = key.into().segments(&self.separator);
        let Some((last, parents)) = segments.split_last() else {
            return true;
        };

        let mut target = &mut self.root;
        for segment in parents {
            match child_mut(target, segment) {
                Some(next) if next.is_object() || next.is_array() => target = next,
                _ => return false,
            }
        }
        remove_child(target, last);
        true
    }

    /// Merge `value` into the object at `key`.
    ///
    /// An object key is merged into the root and `value` is ignored. Falls
    /// back to [`set`](Self::set) when either side is not an object.
    pub fn merge(&mut self, key: impl Into<Key>, value: &Value) -> bool {
        if self.read_only {
            return false;
        }
        let key = key.into();
        if let Some(object) = key.as_object() {
            return self.merge_root(&Value::Object(object.clone()));
        }

        let segments = key.segments(&self.separator);
        let Some((last, parents)) = segments.split_last() else {
            return self.merge_root(value);
        };

        let parse = self.parse_values;
        let Some(container) = walk_mut(&mut self.root, parents) else {
            return false;
        };
        if value.is_object()
            && let Some(Value::Object(existing)) = child_mut(container, last)
        {
            merge_into(existing, value);
            return true;
        }
        put(container, last, value, parse)
    }

    /// Merge `value` straight into the root.
    ///
    /// Arrays merge their indices as keys. Scalars and null are rejected.
    pub fn merge_root(&mut self, value: &Value) -> bool {
        if self.read_only || !(value.is_object() || value.is_array()) {
            return false;
        }
        if let Value::Object(root) = &mut self.root {
            merge_into(root, value);
        }
        true
    }

    /// Drop everything.
    pub fn reset(&mut self) -> bool {
        if self.read_only {
            return false;
        }
        self.root = Value::Object(Map::new());
        true
    }

    /// The current root object.
    pub fn load_sync(&self) -> &Value {
        &self.root
    }

    fn assign(&mut self, segments: &[String], value: &Value) -> bool {
        let Some((last, parents)) = segments.split_last() else {
            return self.replace_root(value);
        };
        let parse = self.parse_values;
        match walk_mut(&mut self.root, parents) {
            Some(container) => put(container, last, value, parse),
            None => false,
        }
    }

    fn replace_root(&mut self, value: &Value) -> bool {
        if !value.is_object() {
            return false;
        }
        self.root = value.clone();
        true
    }
}

/// Canonical array index: `"2"` is an index, `"02"` and `"x"` are not.
fn array_index(segment: &str) -> Option<usize> {
    let index: usize = segment.parse().ok()?;
    (index.to_string() == segment).then_some(index)
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(array_index(segment)?),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => match array_index(segment) {
            Some(index) => items.get_mut(index),
            None => None,
        },
        _ => None,
    }
}

/// Slot for `segment` under `target`, creating it if needed.
///
/// Arrays are entered by index, and only an existing index or the next one
/// (which appends). Any other segment under an array is refused so the
/// array is kept. Scalars on the way are replaced by an empty object.
fn child_slot<'a>(target: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match target {
        Value::Array(items) => {
            let index = array_index(segment).filter(|&index| index <= items.len())?;
            if index == items.len() {
                items.push(Value::Null);
            }
            items.get_mut(index)
        }
        Value::Object(map) => Some(map.entry(segment).or_insert(Value::Null)),
        _ => {
            *target = Value::Object(Map::new());
            target.as_object_mut().map(|map| map.entry(segment).or_insert(Value::Null))
        }
    }
}

/// Walk `segments` down from `target`, creating objects as needed.
///
/// `None` when an array refuses a segment. Nothing is created before that
/// point, since only existing arrays refuse and new containers are objects.
fn walk_mut<'a>(mut target: &'a mut Value, segments: &[String]) -> Option<&'a mut Value> {
    for segment in segments {
        target = child_slot(target, segment)?;
    }
    Some(target)
}

fn remove_child(target: &mut Value, segment: &str) {
    match target {
        Value::Object(map) => {
            map.remove(segment);
        }
        // Keep later indices stable
        Value::Array(items) => {
            if let Some(slot) = array_index(segment).and_then(|index| items.get_mut(index)) {
                *slot = Value::Null;
            }
        }
        _ => {}
    }
}

fn put(container: &mut Value, segment: &str, value: &Value, parse: bool) -> bool {
    let value = if parse {
        parse_values(value)
    } else {
        Some(value.clone())
    };
    match value {
        Some(value) => match child_slot(container, segment) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        },
        // "undefined" after parsing
        None => {
            if container.is_object() || container.is_array() {
                remove_child(container, segment);
            } else {
                *container = Value::Object(Map::new());
            }
            true
        }
    }
}
