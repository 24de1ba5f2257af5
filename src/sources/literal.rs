//! Read-only source seeded from a value known up front.
//!
//! Registered as `literal`, `defaults` and `overrides`; the only difference
//! between those is where the caller places them in the stack.

use super::{Source, delegate_to_store};
use crate::store::{Store, StoreOptions};
use serde_json::Value;

/// Read-only data given at construction.
#[derive(Debug, Clone)]
pub struct Literal {
    store: Store,
}

impl Literal {
    /// Copy `data` into a new read-only source. Non-objects give an empty one.
    pub fn new(data: &Value) -> Self {
        let options = StoreOptions {
            read_only: true,
            ..Default::default()
        };
        Self {
            store: Store::seeded(data, options),
        }
    }

    /// The wrapped store.
    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl Source for Literal {
    fn kind(&self) -> &str {
        "literal"
    }

    delegate_to_store!();
}
