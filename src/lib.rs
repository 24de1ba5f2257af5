//! Hierarchical configuration library.
//!
//! Layers configuration from memory, literals, environment variables,
//! command-line arguments and files into one keyed view. Keys are delimited
//! paths (`server:http:port`); the first source added has the highest priority.
//!
//! ```no_run
//! use confstack::ConfigStack;
//! use serde_json::json;
//!
//! let mut config = ConfigStack::new();
//! config
//!     .argv(&json!({ "separator": "__" }))?
//!     .env(&json!({ "separator": "__", "parseValues": true }))?
//!     .file(&json!("config.json"))?
//!     .defaults(&json!({ "server": { "port": 8080 } }))?;
//!
//! config.required(["server:port"])?;
//! let port = config.get("server:port");
//! # Ok::<(), confstack::ConfigError>(())
//! ```

pub mod cli;
pub mod error;
pub mod format;
pub mod key;
pub mod merge;
pub mod parse;
pub mod registry;
pub mod sources;
pub mod stack;
pub mod store;

pub use error::{ConfigError, ConfigResult, ErrorCode};
pub use key::{Key, key, keyed, path};
pub use merge::{merge, merge_all, try_merge_all};
pub use registry::{Factory, SourceRegistry};
pub use sources::{Argv, Env, File, Literal, Source};
pub use stack::ConfigStack;
pub use store::{Store, StoreOptions};
