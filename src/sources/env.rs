//! Environment variable source.
//!
//! Reads the process environment on `load`. Variables can be narrowed with a
//! whitelist and/or a regex, renamed with a transform, and nested by splitting
//! their names on a separator (`APP__HTTP__PORT` ==> `APP:HTTP:PORT`).

use super::{Source, delegate_to_store};
use crate::error::{ConfigError, ConfigResult};
use crate::key::keyed;
use crate::parse::{TransformFn, transform};
use crate::store::{Store, StoreOptions};
use regex_lite::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

const WHITELIST_ERROR: &str = "Env parameter whitelist was not an array or contained non-string elements";
const MATCH_ERROR: &str = "Env parameter match was not a valid RegExp";

/// Options for an [`Env`] source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnvOptions {
    /// Variable names to accept (case-insensitive). Empty accepts all.
    pub whitelist: Vec<String>,

    /// Regex a variable name must match. Combined with the whitelist as "either".
    #[serde(rename = "match")]
    pub pattern: Option<String>,

    /// Lower-case variable names before anything else.
    #[serde(alias = "lowerCase")]
    pub lower_case: bool,

    /// Split variable names on this to build nested keys.
    pub separator: String,

    /// Parse values as JSON where possible.
    #[serde(alias = "parseValues")]
    pub parse_values: bool,

    #[serde(alias = "logicalSeparator")]
    pub logical_separator: Option<String>,
}

impl EnvOptions {
    /// Read options from a dynamic value.
    ///
    /// A bare array is shorthand for a whitelist; `null` means defaults.
    pub fn from_value(options: &Value) -> ConfigResult<Self> {
        match options {
            Value::Null => Ok(Self::default()),
            Value::Array(_) => Ok(Self {
                whitelist: whitelist_from(options)?,
                ..Default::default()
            }),
            Value::Object(map) => {
                if let Some(list) = map.get("whitelist") {
                    whitelist_from(list)?;
                }
                if let Some(pattern) = map.get("match")
                    && !pattern.is_string()
                    && !pattern.is_null()
                {
                    return Err(ConfigError::invalid_options("env", MATCH_ERROR));
                }
                Self::deserialize(options).map_err(|e| ConfigError::invalid_options("env", e))
            }
            _ => Err(ConfigError::invalid_options("env", "expected an object or array")),
        }
    }
}

fn whitelist_from(value: &Value) -> ConfigResult<Vec<String>> {
    let invalid = || ConfigError::invalid_options("env", WHITELIST_ERROR);
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(str::to_owned).ok_or_else(invalid))
        .collect()
}

/// Source backed by environment variables. Read-only outside of `load`.
pub struct Env {
    store: Store,
    whitelist: Vec<String>,
    pattern: Option<Regex>,
    lower_case: bool,
    separator: String,
    transform: Option<TransformFn>,
    /// Injected variables; `None` reads the real environment.
    vars: Option<Vec<(String, String)>>,
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("store", &self.store)
            .field("whitelist", &self.whitelist)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("lower_case", &self.lower_case)
            .field("separator", &self.separator)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl Env {
    pub fn new(options: EnvOptions) -> ConfigResult<Self> {
        let pattern = options
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|_| ConfigError::invalid_options("env", MATCH_ERROR))?;

        let store = Store::with_options(StoreOptions {
            read_only: true,
            logical_separator: options.logical_separator.unwrap_or_default(),
            parse_values: options.parse_values,
        });

        Ok(Self {
            store,
            whitelist: options.whitelist.iter().map(|s| s.to_lowercase()).collect(),
            pattern,
            lower_case: options.lower_case,
            separator: options.separator,
            transform: None,
            vars: None,
        })
    }

    pub fn from_options(options: &Value) -> ConfigResult<Self> {
        Self::new(EnvOptions::from_value(options)?)
    }

    /// Rename or drop variables before they are stored.
    pub fn with_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Value) -> Option<crate::parse::Pair> + 'static,
    {
        self.transform = Some(Box::new(f));
        self
    }

    /// Read from `vars` instead of the process environment.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn accepts(&self, name: &str) -> bool {
        let listed = || self.whitelist.iter().any(|w| *w == name.to_lowercase());
        match &self.pattern {
            Some(re) if self.whitelist.is_empty() => re.is_match(name),
            Some(re) => re.is_match(name) || listed(),
            None => self.whitelist.is_empty() || listed(),
        }
    }

    fn read_vars(&self) -> Map<String, Value> {
        let vars = match &self.vars {
            Some(vars) => vars.clone(),
            None => std::env::vars().collect(),
        };
        vars.into_iter()
            .map(|(name, value)| {
                let name = if self.lower_case { name.to_lowercase() } else { name };
                (name, Value::String(value))
            })
            .collect()
    }
}

impl Source for Env {
    fn kind(&self) -> &str {
        "env"
    }

    delegate_to_store!();

    fn load(&mut self) -> ConfigResult<()> {
        let mut vars = self.read_vars();
        if let Some(f) = &self.transform {
            let before = vars.len();
            vars = transform(&vars, f)?;
            debug!(dropped = before - vars.len(), "Applied environment transform");
        }

        let selected: Vec<(String, Value)> = vars
            .into_iter()
            .filter(|(name, _)| self.accepts(name))
            .collect();
        debug!(count = selected.len(), "Loading environment variables");

        let separator = self.separator.clone();
        self.store.populate(|store| {
            store.reset();
            for (name, value) in &selected {
                let key = if separator.is_empty() {
                    name.clone()
                } else {
                    keyed(store.separator(), name.split(separator.as_str()))
                };
                store.set(key, value);
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use crate::parse::Pair;
    use serde_json::json;

    fn test_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SOMETHING", "foobar"),
            ("SOMEBOOL", "true"),
            ("SOMENULL", "null"),
            ("SOMEUNDEF", "undefined"),
            ("SOMEINT", "3600"),
            ("SOMEFLOAT", "0.5"),
            ("SOMEBAD", "5.1a"),
            ("ANOTHER__TEST__THIS", "foobar"),
        ]
    }

    fn loaded(options: Value) -> Env {
        let mut env = Env::from_options(&options).unwrap().with_vars(test_vars());
        env.load().unwrap();
        env
    }

    fn get<'a>(env: &'a Env, key: &str) -> Option<&'a Value> {
        Source::get(env, &Key::from(key))
    }

    #[test]
    fn test_reads_everything_as_strings_by_default() {
        let env = loaded(Value::Null);
        assert_eq!(get(&env, "SOMETHING"), Some(&json!("foobar")));
        assert_eq!(get(&env, "SOMEBOOL"), Some(&json!("true")));
        assert_eq!(get(&env, "SOMENULL"), Some(&json!("null")));
        assert_eq!(get(&env, "SOMEUNDEF"), Some(&json!("undefined")));
        assert_eq!(get(&env, "SOMEINT"), Some(&json!("3600")));
        assert_eq!(get(&env, "ANOTHER__TEST__THIS"), Some(&json!("foobar")));
    }

    #[test]
    fn test_parse_values() {
        let env = loaded(json!({"parseValues": true}));
        assert_eq!(get(&env, "SOMETHING"), Some(&json!("foobar")));
        assert_eq!(get(&env, "SOMEBOOL"), Some(&json!(true)));
        assert_eq!(get(&env, "SOMENULL"), Some(&Value::Null));
        assert_eq!(get(&env, "SOMEUNDEF"), None);
        assert_eq!(get(&env, "SOMEINT"), Some(&json!(3600)));
        assert_eq!(get(&env, "SOMEFLOAT"), Some(&json!(0.5)));
        assert_eq!(get(&env, "SOMEBAD"), Some(&json!("5.1a")));
    }

    #[test]
    fn test_lower_case() {
        let env = loaded(json!({"lowerCase": true}));
        assert_eq!(get(&env, "SOMETHING"), None);
        assert_eq!(get(&env, "something"), Some(&json!("foobar")));
        assert_eq!(get(&env, "another__test__this"), Some(&json!("foobar")));
    }

    #[test]
    fn test_transform() {
        let mut env = Env::new(EnvOptions::default())
            .unwrap()
            .with_vars(test_vars())
            .with_transform(|key, _| {
                let mut chars = key.chars();
                let first = chars.next()?;
                Some(Pair::new(
                    format!("{}{}", first.to_ascii_uppercase(), chars.as_str().to_lowercase()),
                    1,
                ))
            });
        env.load().unwrap();
        assert_eq!(get(&env, "Something"), Some(&json!(1)));
        assert_eq!(get(&env, "Another__test__this"), Some(&json!(1)));
        assert_eq!(get(&env, "SOMETHING"), None);
    }

    #[test]
    fn test_match() {
        let env = loaded(json!({"match": "^SOME"}));
        assert_eq!(
            env.store().load_sync(),
            &json!({
                "SOMETHING": "foobar",
                "SOMEBOOL": "true",
                "SOMENULL": "null",
                "SOMEUNDEF": "undefined",
                "SOMEINT": "3600",
                "SOMEFLOAT": "0.5",
                "SOMEBAD": "5.1a",
            })
        );
    }

    #[test]
    fn test_whitelist_is_case_insensitive() {
        let env = loaded(json!({"whitelist": ["another__test__this"]}));
        assert_eq!(env.store().load_sync(), &json!({"ANOTHER__TEST__THIS": "foobar"}));

        let env = loaded(json!(["ANOTHER__TEST__THIS"]));
        assert_eq!(env.store().load_sync(), &json!({"ANOTHER__TEST__THIS": "foobar"}));
    }

    #[test]
    fn test_whitelist_with_match() {
        let env = loaded(json!({"whitelist": ["another__test__this"], "match": "^SOMEBOOL"}));
        assert_eq!(
            env.store().load_sync(),
            &json!({"ANOTHER__TEST__THIS": "foobar", "SOMEBOOL": "true"})
        );
    }

    #[test]
    fn test_separator_nests_keys() {
        let env = loaded(json!({
            "whitelist": ["another__test__this", "somebool"],
            "separator": "__",
        }));
        assert_eq!(get(&env, "ANOTHER:TEST:THIS"), Some(&json!("foobar")));
        assert_eq!(
            env.store().load_sync(),
            &json!({"ANOTHER": {"TEST": {"THIS": "foobar"}}, "SOMEBOOL": "true"})
        );
    }

    #[test]
    fn test_stays_read_only() {
        let env = loaded(json!({"whitelist": ["another__test__this"]}));
        assert!(Source::is_read_only(&env));
    }

    #[test]
    fn test_invalid_whitelist() {
        for bad in [json!({"whitelist": "another__test__this"}), json!({"whitelist": ["a", 123]})] {
            let err = Env::from_options(&bad).unwrap_err();
            assert!(err.to_string().contains("whitelist was not an array"));
        }
    }

    #[test]
    fn test_invalid_match() {
        for bad in [json!({"match": 1234}), json!({"match": {}}), json!({"match": "("})] {
            let err = Env::from_options(&bad).unwrap_err();
            assert!(err.to_string().contains("match was not a valid RegExp"));
        }
    }

    #[test]
    fn test_string_match_becomes_regex() {
        let env = Env::from_options(&json!({"match": "asdf"})).unwrap();
        assert!(env.accepts("asdf"));
        assert!(!env.accepts("test"));
    }
}
