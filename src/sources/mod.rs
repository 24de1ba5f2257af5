//! Configuration sources.
//!
//! A source is anything that can answer keyed lookups and, unless read-only,
//! accept writes. Every built-in kind wraps a [`Store`] and delegates to it:
//! - `memory`   - a plain [`Store`]
//! - `literal`  - read-only data given up front (also `defaults`, `overrides`)
//! - `env`      - process environment variables
//! - `argv`     - command-line arguments
//! - `file`     - a JSON or YAML file on disk

/// Implements the read/write part of [`Source`] by forwarding to a `store` field.
macro_rules! delegate_to_store {
    () => {
        fn is_read_only(&self) -> bool {
            self.store.is_read_only()
        }

        fn get(&self, key: &$crate::key::Key) -> Option<&serde_json::Value> {
            self.store.get(key)
        }

        fn set(&mut self, key: &$crate::key::Key, value: &serde_json::Value) -> bool {
            self.store.set(key, value)
        }

        fn clear(&mut self, key: &$crate::key::Key) -> bool {
            self.store.clear(key)
        }

        fn merge(&mut self, key: &$crate::key::Key, value: &serde_json::Value) -> bool {
            self.store.merge(key, value)
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

pub(crate) use delegate_to_store;

mod argv;
mod env;
mod file;
mod literal;

pub use argv::{Argv, ArgvOptions};
pub use env::{Env, EnvOptions};
pub use file::{File, FileFormat, FileOptions};
pub use literal::Literal;

use crate::error::ConfigResult;
use crate::key::Key;
use crate::store::Store;
use serde_json::Value;
use std::any::Any;

/// Contract every source registered in a [`ConfigStack`](crate::ConfigStack) meets.
///
/// `load` and `save` are optional hooks; the defaults do nothing, which is
/// right for sources that live entirely in memory.
pub trait Source: Any {
    /// Short name of the source kind, e.g. `"memory"` or `"file"`.
    fn kind(&self) -> &str;

    /// Read-only sources are skipped when routing writes.
    fn is_read_only(&self) -> bool;

    fn get(&self, key: &Key) -> Option<&Value>;

    fn set(&mut self, key: &Key, value: &Value) -> bool;

    fn clear(&mut self, key: &Key) -> bool;

    /// Merge `value` into the object at `key`.
    fn merge(&mut self, _key: &Key, _value: &Value) -> bool {
        false
    }

    /// Populate from the backing medium.
    fn load(&mut self) -> ConfigResult<()> {
        Ok(())
    }

    /// Persist to the backing medium.
    fn save(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<'a> dyn Source + 'a {
    /// Downcast to a concrete source type.
    pub fn downcast_ref<T: Source>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Source>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl Source for Store {
    fn kind(&self) -> &str {
        "memory"
    }

    fn is_read_only(&self) -> bool {
        Store::is_read_only(self)
    }

    fn get(&self, key: &Key) -> Option<&Value> {
        Store::get(self, key)
    }

    fn set(&mut self, key: &Key, value: &Value) -> bool {
        Store::set(self, key, value)
    }

    fn clear(&mut self, key: &Key) -> bool {
        Store::clear(self, key)
    }

    fn merge(&mut self, key: &Key, value: &Value) -> bool {
        Store::merge(self, key, value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
