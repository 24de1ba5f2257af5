//! CLI command definitions for confstack
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::error::ConfigResult;
use crate::format::OutputFormat;
use crate::stack::ConfigStack;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use std::path::PathBuf;

/// Layered configuration lookup: files, environment and defaults
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to layer in (repeatable; earlier files take priority)
    #[arg(short, long = "file", value_name = "PATH", global = true)]
    pub files: Vec<PathBuf>,

    /// Include environment variables, above the files
    #[arg(short, long, global = true)]
    pub env: bool,

    /// Separator that nests environment variable names (e.g. "__")
    #[arg(long, value_name = "SEP", global = true)]
    pub env_separator: Option<String>,

    /// Only include environment variables matching this regex
    #[arg(long, value_name = "REGEX", global = true)]
    pub env_match: Option<String>,

    /// JSON object used as the lowest priority defaults
    #[arg(short, long, value_name = "JSON", global = true)]
    pub defaults: Option<String>,

    /// Output format for values
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value at KEY
    Get {
        /// Key such as `server:port`
        key: String,
    },

    /// Print the first of the KEYS that has a value
    Any {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Fail unless every key has a value
    Required {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Print the merged configuration
    Dump,

    /// Write VALUE at KEY into the first file and save it
    Set {
        key: String,

        /// Parsed as JSON when possible, otherwise stored as a string
        value: String,
    },

    /// List the sources in priority order
    Sources,
}

/// Name of the source created for the `index`-th `--file`.
pub fn file_source_name(index: usize) -> String {
    format!("file{}", index)
}

impl Cli {
    /// Build the stack described by the global flags.
    ///
    /// Priority, highest first: files, environment, defaults.
    pub fn build_stack(&self) -> ConfigResult<ConfigStack> {
        let mut stack = ConfigStack::new();

        for (index, path) in self.files.iter().enumerate() {
            let name = file_source_name(index);
            stack.use_kind("file", Some(&name), &json!({ "file": path }))?;
        }

        if self.env {
            let mut options = json!({ "parseValues": true });
            if let Some(separator) = &self.env_separator {
                options["separator"] = json!(separator);
            }
            if let Some(pattern) = &self.env_match {
                options["match"] = json!(pattern);
            }
            stack.env(&options)?;
        }

        if let Some(raw) = &self.defaults {
            let defaults: Value = serde_json::from_str(raw).map_err(|e| {
                crate::error::ConfigError::invalid_options("defaults", e)
            })?;
            stack.defaults(&defaults)?;
        }

        Ok(stack)
    }
}
