//! Structured error types for configuration operations.
//!
//! Expected conditions (missing keys, read-only stores, invalid key types) are
//! reported through return values. `ConfigError` is reserved for misuse and for
//! failures raised by source adapters while loading or saving.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Caller errors
    InvalidMergeInput,
    MissingRequiredKeys,
    InvalidOptions,
    UnknownKind,

    // Adapter errors
    Io,
    Parse,
    Serialize,
}

/// Structured error for configuration operations.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ConfigError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ConfigError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            keys: None,
            path: None,
        }
    }

    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    // Convenience constructors

    pub fn invalid_merge_input() -> Self {
        Self::new(
            ErrorCode::InvalidMergeInput,
            "merge called with non-array of objects",
        )
    }

    pub fn missing_keys(missing: Vec<String>) -> Self {
        Self::new(
            ErrorCode::MissingRequiredKeys,
            format!("Missing required keys: {}", missing.join(", ")),
        )
        .with_keys(missing)
    }

    pub fn invalid_options(kind: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidOptions,
            format!("Invalid options for {} source: {}", kind, reason),
        )
    }

    pub fn unknown_kind(kind: &str) -> Self {
        Self::new(
            ErrorCode::UnknownKind,
            format!("Unknown source kind: {}", kind),
        )
    }

    pub fn io(path: &Path, err: std::io::Error) -> Self {
        Self::new(
            ErrorCode::Io,
            format!("Failed to access {}: {}", path.display(), err),
        )
        .with_path(path)
    }

    pub fn parse(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::Parse,
            format!("Error parsing your configuration file: [{}]: {}", path.display(), err),
        )
        .with_path(path)
    }

    pub fn serialize(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::Serialize,
            format!("Failed to serialize {}: {}", path.display(), err),
        )
        .with_path(path)
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
