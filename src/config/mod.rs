//! Environment-backed configuration.
//!
//! Every setting has a default except the knowledge source path. Override
//! with `PARROT_EVAL_*` environment variables; the CLI may override again.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_INTERVAL};
use crate::evaluation::RetryPolicy;
use crate::service::ServiceSettings;

/// Harness configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Search service base URL. Default: `http://127.0.0.1:8999`.
    pub service_url: String,

    /// Host of the vector store behind the service. Default: `127.0.0.1`.
    pub store_domain: String,

    /// Directory holding the benchmark split files. Default: `./datasets/kilt_data`.
    pub data_dir: PathBuf,

    /// Root for run outputs. Default: `./outputs/kilt`.
    pub output_root: PathBuf,

    /// KILT knowledge-source dump (JSONL). Required to run.
    pub knowledge_source_path: Option<PathBuf>,

    /// Scoring service base URL. Default: `http://127.0.0.1:8800`.
    pub scorer_url: String,

    /// Scoring attempts per run. Default: `3`.
    pub retry_attempts: u32,

    /// Pause between scoring attempts. Default: 120 s.
    pub retry_interval: Duration,

    /// Per-request HTTP timeout. Default: 300 s.
    pub request_timeout: Duration,
}

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8999";
pub const DEFAULT_STORE_DOMAIN: &str = "127.0.0.1";
pub const DEFAULT_SCORER_URL: &str = "http://127.0.0.1:8800";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            store_domain: DEFAULT_STORE_DOMAIN.to_string(),
            data_dir: PathBuf::from("./datasets/kilt_data"),
            output_root: PathBuf::from("./outputs/kilt"),
            knowledge_source_path: None,
            scorer_url: DEFAULT_SCORER_URL.to_string(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    const ENV_SERVICE_URL: &'static str = "PARROT_EVAL_SERVICE_URL";
    const ENV_STORE_DOMAIN: &'static str = "PARROT_EVAL_STORE_DOMAIN";
    const ENV_DATA_DIR: &'static str = "PARROT_EVAL_DATA_DIR";
    const ENV_OUTPUT_DIR: &'static str = "PARROT_EVAL_OUTPUT_DIR";
    const ENV_KNOWLEDGE_SOURCE: &'static str = "PARROT_EVAL_KNOWLEDGE_SOURCE";
    const ENV_SCORER_URL: &'static str = "PARROT_EVAL_SCORER_URL";
    const ENV_RETRY_ATTEMPTS: &'static str = "PARROT_EVAL_RETRY_ATTEMPTS";
    const ENV_RETRY_INTERVAL_SECS: &'static str = "PARROT_EVAL_RETRY_INTERVAL_SECS";
    const ENV_REQUEST_TIMEOUT_SECS: &'static str = "PARROT_EVAL_REQUEST_TIMEOUT_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            service_url: Self::parse_string_from_env(Self::ENV_SERVICE_URL, defaults.service_url),
            store_domain: Self::parse_string_from_env(
                Self::ENV_STORE_DOMAIN,
                defaults.store_domain,
            ),
            data_dir: Self::parse_path_from_env(Self::ENV_DATA_DIR, defaults.data_dir),
            output_root: Self::parse_path_from_env(Self::ENV_OUTPUT_DIR, defaults.output_root),
            knowledge_source_path: Self::parse_optional_path_from_env(Self::ENV_KNOWLEDGE_SOURCE),
            scorer_url: Self::parse_string_from_env(Self::ENV_SCORER_URL, defaults.scorer_url),
            retry_attempts: Self::parse_u32_from_env(
                Self::ENV_RETRY_ATTEMPTS,
                defaults.retry_attempts,
            )?,
            retry_interval: Self::parse_secs_from_env(
                Self::ENV_RETRY_INTERVAL_SECS,
                defaults.retry_interval,
            )?,
            request_timeout: Self::parse_secs_from_env(
                Self::ENV_REQUEST_TIMEOUT_SECS,
                defaults.request_timeout,
            )?,
        })
    }

    /// Validates URLs, paths and basic invariants (does not create directories
    /// or touch the network).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_attempts == 0 {
            return Err(ConfigError::ZeroRetryAttempts);
        }

        Self::validate_url(Self::ENV_SERVICE_URL, &self.service_url)?;
        Self::validate_url(Self::ENV_SCORER_URL, &self.scorer_url)?;

        let domain = self.store_domain.trim();
        if domain.is_empty() || domain.contains("://") || domain.contains('/') {
            return Err(ConfigError::InvalidStoreDomain {
                value: self.store_domain.clone(),
            });
        }

        for dir in [&self.data_dir, &self.output_root] {
            if dir.exists() && !dir.is_dir() {
                return Err(ConfigError::NotADirectory { path: dir.clone() });
            }
        }

        if let Some(ref path) = self.knowledge_source_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    /// The knowledge source path, which a run cannot do without.
    pub fn require_knowledge_source(&self) -> Result<&Path, ConfigError> {
        self.knowledge_source_path
            .as_deref()
            .ok_or(ConfigError::MissingEnvVar {
                name: Self::ENV_KNOWLEDGE_SOURCE,
            })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_interval)
    }

    /// Search client settings; `rerank` is a per-run choice.
    pub fn service_settings(&self, rerank: Option<bool>) -> ServiceSettings {
        ServiceSettings {
            service_url: self.service_url.clone(),
            store_domain: self.store_domain.clone(),
            rerank,
            timeout: self.request_timeout,
        }
    }

    fn validate_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
        let trimmed = value.trim();
        let rest = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"));
        match rest {
            Some(host) if !host.is_empty() => Ok(()),
            _ => Err(ConfigError::InvalidUrl {
                name,
                value: value.to_string(),
            }),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_u32_from_env(var_name: &'static str, default: u32) -> Result<u32, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                    source,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_secs_from_env(var_name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map(Duration::from_secs)
                .map_err(|source| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                    source,
                }),
            Err(_) => Ok(default),
        }
    }
}
