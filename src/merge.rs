//! Deep merge for configuration values.
//!
//! Objects merge key by key; arrays and scalars replace whatever was there.
//! Merging never modifies its inputs: results are built from clones, so a
//! store never shares data with the caller that handed it a value.

use crate::error::{ConfigError, ConfigResult};
use serde_json::{Map, Value};

/// Deep merge `overlay` onto `base`, returning a new value.
///
/// - Arrays in overlay replace base's value entirely (no element-wise merge)
/// - Objects in overlay merge recursively; an array in base is discarded first
/// - Scalars and nulls in overlay overwrite base
///
/// When either side is not an object the overlay wins outright.
///
/// # Example
/// ```
/// use serde_json::json;
/// use confstack::merge::merge;
///
/// let base = json!({
///     "server": { "port": 8080, "host": "localhost" },
///     "features": ["a", "b"]
/// });
/// let overlay = json!({
///     "server": { "port": 9000 },
///     "features": ["c"]
/// });
/// let result = merge(&base, &overlay);
/// assert_eq!(result, json!({
///     "server": { "port": 9000, "host": "localhost" },
///     "features": ["c"]
/// }));
/// ```
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(_)) => {
            let mut out = base_map.clone();
            merge_into(&mut out, overlay);
            Value::Object(out)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Fold `values` left to right onto an empty object.
///
/// `merge_all(&[a, b, c])` equals `merge(&merge(&a, &b), &c)` for objects.
pub fn merge_all<'a>(values: impl IntoIterator<Item = &'a Value>) -> Value {
    let mut out = Map::new();
    for value in values {
        merge_into(&mut out, value);
    }
    Value::Object(out)
}

/// Like [`merge_all`] for a list that arrives as a dynamic value.
///
/// Anything but a JSON array is a caller bug and is reported as
/// [`ErrorCode::InvalidMergeInput`](crate::error::ErrorCode::InvalidMergeInput).
pub fn try_merge_all(values: &Value) -> ConfigResult<Value> {
    match values {
        Value::Array(items) => Ok(merge_all(items)),
        _ => Err(ConfigError::invalid_merge_input()),
    }
}

/// Merge the keys of `overlay` into `target` in place.
///
/// Arrays contribute their indices as keys (`"0"`, `"1"`, ...). That keeps
/// older callers that merged lists at the root working; scalars and nulls
/// contribute nothing.
pub fn merge_into(target: &mut Map<String, Value>, overlay: &Value) {
    match overlay {
        Value::Object(map) => {
            for (key, value) in map {
                merge_entry(target, key, value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                merge_entry(target, &index.to_string(), value);
            }
        }
        _ => {}
    }
}

fn merge_entry(target: &mut Map<String, Value>, key: &str, value: &Value) {
    match value {
        Value::Object(_) => match target.get_mut(key) {
            Some(Value::Object(existing)) => merge_into(existing, value),
            // No cross-type merging: arrays and scalars are replaced
            _ => {
                target.insert(key.to_owned(), value.clone());
            }
        },
        _ => {
            target.insert(key.to_owned(), value.clone());
        }
    }
}
