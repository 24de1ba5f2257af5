//! Layered configuration.
//!
//! A `ConfigStack` holds named sources in priority order (first added wins)
//! and answers lookups across all of them:
//! - reads return the first scalar or array found, or deep-merge every object
//!   found so higher priority leaves win
//! - writes go to the first writable source that accepts them
//! - `clear` removes the key everywhere and reports whether it is gone

use crate::error::{ConfigError, ConfigResult};
use crate::key::Key;
use crate::merge::merge_all;
use crate::registry::SourceRegistry;
use crate::sources::Source;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Ordered collection of configuration sources.
#[derive(Default)]
pub struct ConfigStack {
    registry: SourceRegistry,
    sources: Vec<(String, Box<dyn Source>)>,
}

impl fmt::Debug for ConfigStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStack")
            .field("registry", &self.registry)
            .field("sources", &self.names())
            .finish()
    }
}

/// Generates `use_kind` shortcuts named after the kind.
macro_rules! kind_shortcuts {
    ($($method:ident => $kind:literal),* $(,)?) => {
        $(
            #[doc = concat!("Add a `", $kind, "` source named `", $kind, "`.")]
            pub fn $method(&mut self, options: &Value) -> ConfigResult<&mut Self> {
                self.use_kind($kind, None, options)
            }
        )*
    };
}

impl ConfigStack {
    /// An empty stack with the built-in kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty stack using `registry` to build sources by kind.
    pub fn with_registry(registry: SourceRegistry) -> Self {
        Self {
            registry,
            sources: Vec::new(),
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Register (or replace) a source kind.
    pub fn register_kind<F>(&mut self, kind: &str, factory: F) -> &mut Self
    where
        F: Fn(&Value) -> ConfigResult<Box<dyn Source>> + 'static,
    {
        self.registry.register(kind, factory);
        self
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Load `source` and append it under `name`.
    ///
    /// A source already registered under `name` is dropped first. Load errors
    /// propagate and leave the stack untouched.
    pub fn add(&mut self, name: impl Into<String>, mut source: Box<dyn Source>) -> ConfigResult<&mut Self> {
        let name = name.into();
        source.load()?;

        if let Some(index) = self.position(&name) {
            let (_, old) = self.sources.remove(index);
            debug!(name = %name, kind = old.kind(), "Evicted source");
        }
        debug!(name = %name, kind = source.kind(), priority = self.sources.len(), "Added source");
        self.sources.push((name, source));
        Ok(self)
    }

    /// Build a source of `kind` from `options` and add it.
    ///
    /// The name defaults to the kind.
    pub fn use_kind(&mut self, kind: &str, name: Option<&str>, options: &Value) -> ConfigResult<&mut Self> {
        let source = self.registry.create(kind, options)?;
        self.add(name.unwrap_or(kind), source)
    }

    kind_shortcuts! {
        memory => "memory",
        literal => "literal",
        defaults => "defaults",
        overrides => "overrides",
        env => "env",
        argv => "argv",
        file => "file",
    }

    /// Source registered under `name`.
    pub fn source(&self, name: &str) -> Option<&dyn Source> {
        self.sources
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, source)| source.as_ref())
    }

    pub fn source_mut(&mut self, name: &str) -> Option<&mut dyn Source> {
        for (n, source) in &mut self.sources {
            if n == name {
                let source: &mut dyn Source = source.as_mut();
                return Some(source);
            }
        }
        None
    }

    /// Source registered under `name`, as its concrete type.
    pub fn source_as<T: Source>(&self, name: &str) -> Option<&T> {
        self.source(name)?.downcast_ref::<T>()
    }

    /// Source names, highest priority first.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sources.iter().position(|(n, _)| n == name)
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Resolve `key` across every source.
    ///
    /// `null` counts as absent. A scalar or array from the highest priority
    /// source that has the key is returned as is; otherwise all objects found
    /// are merged with higher priority values on top.
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        let key = key.into();
        let mut hits: Vec<&Value> = Vec::new();
        for (_, source) in &self.sources {
            let Some(found) = source.get(&key).filter(|v| !v.is_null()) else {
                continue;
            };
            if hits.is_empty() && !found.is_object() {
                return Some(found.clone());
            }
            hits.push(found);
        }

        if hits.is_empty() {
            return None;
        }
        Some(merge_all(hits.into_iter().rev()))
    }

    /// Write to the first writable source that accepts the value.
    pub fn set(&mut self, key: impl Into<Key>, value: &Value) -> bool {
        let key = key.into();
        for (name, source) in &mut self.sources {
            if !source.is_read_only() && source.set(&key, value) {
                debug!(source = %name, key = %key, "Set value");
                return true;
            }
        }
        false
    }

    /// Merge into the first writable source that accepts the value.
    pub fn merge(&mut self, key: impl Into<Key>, value: &Value) -> bool {
        let key = key.into();
        for (name, source) in &mut self.sources {
            if !source.is_read_only() && source.merge(&key, value) {
                debug!(source = %name, key = %key, "Merged value");
                return true;
            }
        }
        false
    }

    /// Clear `key` in every source. False if some source still provides it.
    pub fn clear(&mut self, key: impl Into<Key>) -> bool {
        let key = key.into();
        for (_, source) in &mut self.sources {
            source.clear(&key);
        }
        self.get(&key).is_none()
    }

    /// First key that resolves, in the order given.
    pub fn any<I, K>(&self, keys: I) -> Option<Value>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        keys.into_iter().find_map(|key| self.get(key))
    }

    /// Fail unless every key resolves. The error lists all missing keys.
    pub fn required<I, K>(&self, keys: I) -> ConfigResult<&Self>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let missing: Vec<String> = keys
            .into_iter()
            .map(Into::into)
            .filter(|key: &Key| self.get(key).is_none())
            .map(|key| key.to_string())
            .collect();

        if missing.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::missing_keys(missing))
        }
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Reload every source, highest priority first.
    pub fn load(&mut self) -> ConfigResult<()> {
        for (name, source) in &mut self.sources {
            debug!(source = %name, kind = source.kind(), "Loading source");
            source.load()?;
        }
        Ok(())
    }

    /// Persist every source, highest priority first.
    pub fn save(&self) -> ConfigResult<()> {
        for (name, source) in &self.sources {
            debug!(source = %name, kind = source.kind(), "Saving source");
            source.save()?;
        }
        Ok(())
    }
}
