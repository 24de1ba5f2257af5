//! Command-line argument source.
//!
//! Recognizes `--key value`, bare `--flag` (stored as `true`) and, when
//! enabled, `--key=value`. Anything not starting with the prefix is skipped.

use super::{Source, delegate_to_store};
use crate::error::{ConfigError, ConfigResult};
use crate::key::keyed;
use crate::store::{Store, StoreOptions};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

const DEFAULT_PREFIX: &str = "--";

/// Options for an [`Argv`] source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArgvOptions {
    /// Marks an argument as a key. Empty means `--`.
    pub prefix: String,

    /// Split keys on this to build nested keys.
    pub separator: String,

    #[serde(alias = "lowerCase")]
    pub lower_case: bool,

    #[serde(alias = "parseValues")]
    pub parse_values: bool,

    /// Accept `--key=value` instead of `--key value`.
    #[serde(alias = "useEqualsign")]
    pub use_equalsign: bool,

    #[serde(alias = "logicalSeparator")]
    pub logical_separator: Option<String>,
}

/// Source backed by command-line arguments. Read-only outside of `load`.
#[derive(Debug, Clone)]
pub struct Argv {
    store: Store,
    prefix: String,
    separator: String,
    lower_case: bool,
    use_equalsign: bool,
    /// Injected arguments; `None` reads the process arguments.
    args: Option<Vec<String>>,
}

impl Argv {
    pub fn new(options: ArgvOptions) -> Self {
        let prefix = if options.prefix.is_empty() {
            DEFAULT_PREFIX.to_string()
        } else {
            options.prefix
        };
        let store = Store::with_options(StoreOptions {
            read_only: true,
            logical_separator: options.logical_separator.unwrap_or_default(),
            parse_values: options.parse_values,
        });
        Self {
            store,
            prefix,
            separator: options.separator,
            lower_case: options.lower_case,
            use_equalsign: options.use_equalsign,
            args: None,
        }
    }

    pub fn from_options(options: &Value) -> ConfigResult<Self> {
        if options.is_null() {
            return Ok(Self::new(ArgvOptions::default()));
        }
        let options =
            ArgvOptions::deserialize(options).map_err(|e| ConfigError::invalid_options("argv", e))?;
        Ok(Self::new(options))
    }

    /// Parse `args` instead of the process arguments. Excludes the program name.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn read_args(&self) -> Vec<String> {
        match &self.args {
            Some(args) => args.clone(),
            None => std::env::args().skip(1).collect(),
        }
    }

    /// Turn the raw arguments into key/value pairs, in order.
    fn pairs(&self, args: &[String]) -> Vec<(String, Value)> {
        let mut pairs = Vec::new();
        let mut i = 0;
        while i < args.len() {
            let Some(name) = args[i].strip_prefix(self.prefix.as_str()) else {
                i += 1;
                continue;
            };

            if self.use_equalsign {
                // A leading '=' leaves no key
                if let Some((name, value)) = name.split_once('=')
                    && !name.is_empty()
                {
                    pairs.push((name.to_string(), Value::String(value.to_string())));
                }
            } else {
                match args.get(i + 1) {
                    Some(next) if !next.is_empty() && !next.starts_with(self.prefix.as_str()) => {
                        pairs.push((name.to_string(), Value::String(next.clone())));
                        i += 1;
                    }
                    _ => pairs.push((name.to_string(), Value::Bool(true))),
                }
            }
            i += 1;
        }
        pairs
    }

    fn key_for(&self, name: &str, logical: &str) -> String {
        let name = if self.lower_case {
            name.to_lowercase()
        } else {
            name.to_string()
        };
        if self.separator.is_empty() {
            name
        } else {
            keyed(logical, name.split(self.separator.as_str()))
        }
    }
}

impl Source for Argv {
    fn kind(&self) -> &str {
        "argv"
    }

    delegate_to_store!();

    fn load(&mut self) -> ConfigResult<()> {
        let args = self.read_args();
        let logical = self.store.separator().to_string();
        let pairs: Vec<(String, Value)> = self
            .pairs(&args)
            .into_iter()
            .map(|(name, value)| (self.key_for(&name, &logical), value))
            .collect();
        debug!(count = pairs.len(), "Loading command-line arguments");

        self.store.populate(|store| {
            store.reset();
            for (key, value) in &pairs {
                store.set(key, value);
            }
        });
        Ok(())
    }
}
