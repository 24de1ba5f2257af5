//! Kind registry.
//!
//! Maps a kind name (`"file"`, `"env"`, ...) to a factory that builds a source
//! from a dynamic options value. Custom kinds can be registered at any time.

use crate::error::{ConfigError, ConfigResult};
use crate::sources::{Argv, Env, File, Literal, Source};
use crate::store::Store;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Builds a source from its options.
pub type Factory = Box<dyn Fn(&Value) -> ConfigResult<Box<dyn Source>>>;

/// Registry of source kinds.
pub struct SourceRegistry {
    factories: HashMap<String, Factory>,
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SourceRegistry {
    /// A registry with no kinds.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with every built-in kind.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("memory", |options| Ok(Box::new(Store::from_options(options)?)));
        registry.register("file", |options| Ok(Box::new(File::from_options(options)?)));
        for kind in ["literal", "defaults", "overrides"] {
            registry.register(kind, |options| Ok(Box::new(Literal::new(options))));
        }
        registry.register("env", |options| Ok(Box::new(Env::from_options(options)?)));
        registry.register("argv", |options| Ok(Box::new(Argv::from_options(options)?)));
        registry
    }

    /// Add or replace a kind.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Value) -> ConfigResult<Box<dyn Source>> + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build a source of `kind`.
    pub fn create(&self, kind: &str, options: &Value) -> ConfigResult<Box<dyn Source>> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| ConfigError::unknown_kind(kind))?;
        factory(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::key::Key;
    use serde_json::json;

    #[test]
    fn test_builtin_kinds() {
        let registry = SourceRegistry::builtin();
        assert_eq!(
            registry.kinds(),
            vec!["argv", "defaults", "env", "file", "literal", "memory", "overrides"]
        );
    }

    #[test]
    fn test_create_builtin() {
        let registry = SourceRegistry::default();
        let source = registry.create("defaults", &json!({"a": 1})).unwrap();
        assert_eq!(source.kind(), "literal");
        assert!(source.is_read_only());
        assert_eq!(source.get(&Key::from("a")), Some(&json!(1)));

        let source = registry.create("memory", &Value::Null).unwrap();
        assert!(!source.is_read_only());
    }

    #[test]
    fn test_unknown_kind() {
        let err = SourceRegistry::empty().create("memory", &Value::Null).err().unwrap();
        assert_eq!(err.code, ErrorCode::UnknownKind);
    }

    #[test]
    fn test_register_custom_kind() {
        let mut registry = SourceRegistry::empty();
        registry.register("fixed", |_| {
            let mut store = Store::new();
            store.set("fixed", &json!(true));
            Ok(Box::new(store))
        });
        assert!(registry.contains("fixed"));
        let source = registry.create("fixed", &Value::Null).unwrap();
        assert_eq!(source.get(&Key::from("fixed")), Some(&json!(true)));
    }

    #[test]
    fn test_factory_errors_propagate() {
        let err = SourceRegistry::builtin()
            .create("env", &json!({"whitelist": 1}))
            .err().unwrap();
        assert_eq!(err.code, ErrorCode::InvalidOptions);
    }
}
