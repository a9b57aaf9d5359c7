//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric environment variable could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Retry attempts must be at least one.
    #[error("retry attempts must be at least 1")]
    ZeroRetryAttempts,

    /// Service URLs must be non-empty `http(s)://` URLs.
    #[error("invalid {name} '{value}': expected an http:// or https:// URL")]
    InvalidUrl { name: &'static str, value: String },

    /// Store domain must be a bare host name.
    #[error("invalid store domain '{value}': expected a host name without scheme")]
    InvalidStoreDomain { value: String },

    /// A required setting was not provided.
    #[error("missing required environment variable: {name}")]
    MissingEnvVar { name: &'static str },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
