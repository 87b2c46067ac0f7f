//! Configuration loading, validation, and management for Clinidraft.
//!
//! Loads configuration from `~/.clinidraft/config.toml` with environment
//! variable overrides. Validates all settings at startup; the resulting
//! [`AppConfig`] is treated as immutable for the life of the process.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.clinidraft/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language-model backend selection
    #[serde(default)]
    pub model: ModelConfig,

    /// Length shaping, timeouts and retry policy
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Response cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Evidence source backend
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Additional compliance lexicon terms
    #[serde(default)]
    pub compliance: ComplianceConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Backend name ("template" is the built-in offline model)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier reported in result metadata
    #[serde(default = "default_model")]
    pub name: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_provider() -> String {
    "template".into()
}
fn default_model() -> String {
    "template-v1".into()
}
fn default_temperature() -> f32 {
    0.3
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            name: default_model(),
            temperature: default_temperature(),
        }
    }
}

/// Ceiling on `generation.max_expansion_passes`.
pub const MAX_EXPANSION_PASSES: u32 = 3;

/// Ceiling on `generation.max_retries`.
pub const MAX_RETRIES: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Drafts shorter than `lower_tolerance × target` get one expansion pass
    #[serde(default = "default_lower_tolerance")]
    pub lower_tolerance: f64,

    /// Drafts longer than `upper_tolerance × target` are truncated
    #[serde(default = "default_upper_tolerance")]
    pub upper_tolerance: f64,

    #[serde(default = "default_max_expansion_passes")]
    pub max_expansion_passes: u32,

    /// Deadline for a single language-model call
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Retries after the first failed call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles for each further retry
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_lower_tolerance() -> f64 {
    0.9
}
fn default_upper_tolerance() -> f64 {
    1.1
}
fn default_max_expansion_passes() -> u32 {
    1
}
fn default_generation_timeout() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    1
}
fn default_backoff_ms() -> u64 {
    500
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            lower_tolerance: default_lower_tolerance(),
            upper_tolerance: default_upper_tolerance(),
            max_expansion_passes: default_max_expansion_passes(),
            timeout_secs: default_generation_timeout(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_ttl() -> u64 {
    3600
}
fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Backends queried together for each lookup. Built in: "literature",
    /// "trials" and "genes" (deterministic, offline).
    #[serde(default = "default_source_backends")]
    pub backends: Vec<String>,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

fn default_source_backends() -> Vec<String> {
    vec!["literature".into(), "trials".into(), "genes".into()]
}
fn default_max_results() -> usize {
    5
}
fn default_source_timeout() -> u64 {
    10
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            backends: default_source_backends(),
            max_results: default_max_results(),
            timeout_secs: default_source_timeout(),
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Extra phrases treated as absolute medical claims
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_unsafe_terms: Vec<String>,

    /// Extra phrases treated as high-risk topics
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_sensitive_terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.clinidraft/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `CLINIDRAFT_PROVIDER`
    /// - `CLINIDRAFT_MODEL`
    /// - `CLINIDRAFT_CACHE_TTL_SECS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup function.
    fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(provider) = lookup("CLINIDRAFT_PROVIDER") {
            self.model.provider = provider;
        }
        if let Some(model) = lookup("CLINIDRAFT_MODEL") {
            self.model.name = model;
        }
        if let Some(ttl) = lookup("CLINIDRAFT_CACHE_TTL_SECS") {
            self.cache.ttl_secs = ttl.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "CLINIDRAFT_CACHE_TTL_SECS must be a whole number of seconds, got '{ttl}'"
                ))
            })?;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".clinidraft")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        let g = &self.generation;
        if !(g.lower_tolerance > 0.0 && g.lower_tolerance <= 1.0) {
            return Err(ConfigError::ValidationError(
                "generation.lower_tolerance must be in (0.0, 1.0]".into(),
            ));
        }
        if !(g.upper_tolerance >= 1.0 && g.upper_tolerance.is_finite()) {
            return Err(ConfigError::ValidationError(
                "generation.upper_tolerance must be a finite number >= 1.0".into(),
            ));
        }
        if g.max_expansion_passes > MAX_EXPANSION_PASSES {
            return Err(ConfigError::ValidationError(format!(
                "generation.max_expansion_passes must be at most {MAX_EXPANSION_PASSES}"
            )));
        }
        if g.max_retries > MAX_RETRIES {
            return Err(ConfigError::ValidationError(format!(
                "generation.max_retries must be at most {MAX_RETRIES}"
            )));
        }
        if g.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "generation.timeout_secs must be > 0".into(),
            ));
        }

        if self.sources.max_results == 0 {
            return Err(ConfigError::ValidationError(
                "sources.max_results must be > 0".into(),
            ));
        }
        if self.sources.backends.is_empty() {
            return Err(ConfigError::ValidationError(
                "sources.backends must name at least one backend".into(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML (for `clinidraft config`).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
