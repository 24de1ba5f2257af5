//! Value coercion helpers shared by the env and argv sources.

use crate::error::{ConfigError, ConfigResult, ErrorCode};
use serde_json::{Map, Value};

/// Interpret a raw string as JSON when possible.
///
/// `"3600"` becomes a number, `"true"` a boolean, `"{\"a\":1}"` an object.
/// Text that is not valid JSON is kept as a string. The literal
/// `"undefined"` yields `None`, meaning "no value".
pub fn parse_value(raw: &str) -> Option<Value> {
    if raw == "undefined" {
        return None;
    }
    Some(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned())))
}

/// Apply [`parse_value`] to string values; other values pass through.
pub fn parse_values(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => parse_value(s),
        other => Some(other.clone()),
    }
}

/// Key/value pair produced by a transform callback.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub key: String,
    pub value: Value,
}

impl Pair {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Callback used to rename or drop entries while loading a source.
pub type TransformFn = Box<dyn Fn(&str, &Value) -> Option<Pair>>;

/// Run `f` over every entry of `map`.
///
/// Entries for which `f` returns `None` are dropped. A pair with an empty
/// key is rejected.
pub fn transform<F>(map: &Map<String, Value>, f: F) -> ConfigResult<Map<String, Value>>
where
    F: Fn(&str, &Value) -> Option<Pair>,
{
    let mut out = Map::new();
    for (key, value) in map {
        let Some(pair) = f(key, value) else {
            continue;
        };
        if pair.key.is_empty() {
            return Err(ConfigError::new(
                ErrorCode::InvalidOptions,
                format!(
                    "Transform function passed to store returned an invalid format: {{\"key\":\"\",\"value\":{}}}",
                    pair.value
                ),
            ));
        }
        out.insert(pair.key, pair.value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value_undefined_is_none() {
        assert_eq!(parse_value("undefined"), None);
    }

    #[test]
    fn test_parse_value_json() {
        assert_eq!(parse_value("null"), Some(Value::Null));
        assert_eq!(parse_value("{\"a\": 1}"), Some(json!({"a": 1})));
        assert_eq!(parse_value("[\"a\", 1]"), Some(json!(["a", 1])));
        assert_eq!(parse_value("123"), Some(json!(123)));
        assert_eq!(parse_value("0.5"), Some(json!(0.5)));
        assert_eq!(parse_value("\"{\\\"a\\\": 1}\""), Some(json!("{\"a\": 1}")));
    }

    #[test]
    fn test_parse_value_keeps_invalid_json_as_string() {
        assert_eq!(parse_value("anull"), Some(json!("anull")));
        assert_eq!(parse_value("a{\"a\": 1}"), Some(json!("a{\"a\": 1}")));
        assert_eq!(parse_value("5.1a"), Some(json!("5.1a")));
    }

    #[test]
    fn test_parse_values_ignores_non_strings() {
        assert_eq!(parse_values(&json!(5)), Some(json!(5)));
        assert_eq!(parse_values(&json!("true")), Some(json!(true)));
    }

    #[test]
    fn test_transform_renames_and_drops() {
        let map = json!({"KEEP": "a", "DROP": "b"});
        let out = transform(map.as_object().unwrap(), |key, value| {
            (key == "KEEP").then(|| Pair::new("kept", value.clone()))
        })
        .unwrap();
        assert_eq!(Value::Object(out), json!({"kept": "a"}));
    }

    #[test]
    fn test_transform_rejects_empty_key() {
        let map = json!({"A": 1});
        let err = transform(map.as_object().unwrap(), |_, _| Some(Pair::new("", 1))).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOptions);
        assert!(err.to_string().contains("invalid format"));
    }
}
