//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is a single TOML file. Every field has a built-in
//! default, so a missing file is not fatal: the worker logs a warning and
//! starts with compiled defaults.
//!
//! # Config File Priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`SENTI_CONFIG`)
//! 3. User config dir (`~/.config/senti/senti-worker.toml` on Linux)
//! 4. System config (`/etc/senti/senti-worker.toml`, unix only)
//! 5. Compiled defaults
//!
//! Individual fields can then be overridden from the command line via
//! [`ConfigOverrides`].

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SENTI_CONFIG";

/// File name searched for in the config directories
pub const CONFIG_FILE_NAME: &str = "senti-worker.toml";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Job queue connection
    #[serde(default)]
    pub queue: QueueConfig,

    /// Batching pipeline settings
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Language code → model registration
    ///
    /// Default: `en` → `cardiffnlp/twitter-roberta-base-sentiment`
    #[serde(default = "default_models")]
    pub models: BTreeMap<String, ModelConfig>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig::default(),
            pipeline: PipelineSettings::default(),
            logging: LoggingConfig::default(),
            models: default_models(),
        }
    }
}

/// Job queue connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Endpoint used for both polling (GET) and result submission (POST)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Sleep between poll cycles in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl QueueConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Batching pipeline settings
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    /// Maximum whitespace-delimited words per inference batch
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// Maximum subword tokens per document; longer input is truncated by the tokenizer
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,

    /// What to do with the documents of a batch whose inference call failed
    #[serde(default)]
    pub chunk_failure_policy: ChunkFailurePolicy,

    /// Language used when a job descriptor carries no `languageCode`
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
            max_sequence_length: default_max_sequence_length(),
            chunk_failure_policy: ChunkFailurePolicy::default(),
            default_language: default_language(),
        }
    }
}

/// Handling of a batch whose inference call failed as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkFailurePolicy {
    /// Record one error entry for the batch; its documents are not reported
    #[default]
    Drop,
    /// Re-score each document of the batch on its own
    RetryIndividually,
    /// Fail the whole request
    Abort,
}

impl fmt::Display for ChunkFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChunkFailurePolicy::Drop => "drop",
            ChunkFailurePolicy::RetryIndividually => "retry_individually",
            ChunkFailurePolicy::Abort => "abort",
        };
        write!(f, "{name}")
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// One language's model registration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// HuggingFace Hub repository id
    pub repo: String,

    /// Model-native label → canonical label (`negative`, `neutral`, `positive`)
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

const CANONICAL_LABELS: [&str; 3] = ["negative", "neutral", "positive"];

fn default_endpoint() -> String {
    "http://localhost:5001/api/SentimentRequest".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_words() -> usize {
    5000
}

fn default_max_sequence_length() -> usize {
    512
}

fn default_language() -> String {
    "en".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_models() -> BTreeMap<String, ModelConfig> {
    let labels = [
        ("LABEL_0", "negative"),
        ("LABEL_1", "neutral"),
        ("LABEL_2", "positive"),
    ]
    .into_iter()
    .map(|(native, canonical)| (native.to_string(), canonical.to_string()))
    .collect();

    let mut models = BTreeMap::new();
    models.insert(
        "en".to_string(),
        ModelConfig {
            repo: "cardiffnlp/twitter-roberta-base-sentiment".to_string(),
            labels,
        },
    );
    models
}

impl TomlConfig {
    /// Check invariants that serde defaults cannot express
    pub fn validate(&self) -> Result<()> {
        if self.queue.endpoint.trim().is_empty() {
            return Err(Error::Config("queue.endpoint must not be empty".to_string()));
        }
        if self.queue.poll_interval_ms == 0 {
            return Err(Error::Config(
                "queue.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.pipeline.max_sequence_length == 0 {
            return Err(Error::Config(
                "pipeline.max_sequence_length must be greater than zero".to_string(),
            ));
        }
        if self.pipeline.default_language.trim().is_empty() {
            return Err(Error::Config(
                "pipeline.default_language must not be empty".to_string(),
            ));
        }
        if self.models.is_empty() {
            return Err(Error::Config(
                "at least one [models.<language>] entry is required".to_string(),
            ));
        }
        for (language, model) in &self.models {
            if model.repo.trim().is_empty() {
                return Err(Error::Config(format!(
                    "models.{language}.repo must not be empty"
                )));
            }
            let mut claimed: BTreeMap<String, &str> = BTreeMap::new();
            for (native, canonical) in &model.labels {
                let canonical = canonical.trim().to_ascii_lowercase();
                if !CANONICAL_LABELS.contains(&canonical.as_str()) {
                    return Err(Error::Config(format!(
                        "models.{language}.labels.{native}: unknown label '{canonical}'"
                    )));
                }
                if let Some(previous) = claimed.insert(canonical.clone(), native) {
                    return Err(Error::Config(format!(
                        "models.{language}.labels: '{previous}' and '{native}' both map to '{canonical}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Apply command-line / environment overrides on top of file values
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(endpoint) = &overrides.endpoint {
            self.queue.endpoint = endpoint.clone();
        }
        if let Some(interval) = overrides.poll_interval_ms {
            self.queue.poll_interval_ms = interval;
        }
        if let Some(max_words) = overrides.max_words {
            self.pipeline.max_words = max_words;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
    }
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub max_words: Option<usize>,
    pub log_level: Option<String>,
}

/// Read, parse and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Where [`ConfigResolver::load`] took the configuration from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// Config file resolver following the priority order in the module docs
pub struct ConfigResolver {
    module_name: String,
}

impl ConfigResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
        }
    }

    /// Locate the config file to load, if any
    ///
    /// Explicit paths (CLI, env) are returned even when missing so that
    /// [`ConfigResolver::load`] can report them; discovered paths only when present.
    pub fn resolve_path(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3-4: Well-known locations
        self.candidate_paths().into_iter().find(|p| p.exists())
    }

    /// Resolve and load configuration, falling back to compiled defaults
    ///
    /// Nothing is logged here since tracing is usually not installed yet;
    /// pass the returned source to [`ConfigResolver::report`] once it is.
    pub fn load(&self, cli_arg: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
        match self.resolve_path(cli_arg) {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                let config = load_toml_config(&path)?;
                Ok((config, ConfigSource::File(path)))
            }
            None => Ok((TomlConfig::default(), ConfigSource::Defaults)),
        }
    }

    /// Log where the configuration came from
    pub fn report(&self, source: &ConfigSource) {
        match source {
            ConfigSource::File(path) => {
                info!("{}: loaded configuration from {}", self.module_name, path.display())
            }
            ConfigSource::Defaults => warn!(
                "{}: no config file found, using compiled defaults",
                self.module_name
            ),
        }
    }

    fn candidate_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("senti").join(CONFIG_FILE_NAME));
        }
        if cfg!(unix) {
            paths.push(PathBuf::from("/etc/senti").join(CONFIG_FILE_NAME));
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.queue.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.pipeline.max_words, 5000);
        assert_eq!(config.pipeline.max_sequence_length, 512);
        assert_eq!(config.pipeline.chunk_failure_policy, ChunkFailurePolicy::Drop);
        assert_eq!(config.logging.level, "info");
        assert!(config.models.contains_key("en"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config.queue.endpoint, default_endpoint());
        assert_eq!(config.models["en"].labels["LABEL_2"], "positive");
    }

    #[test]
    fn test_validate_rejects_non_injective_labels() {
        let mut config = TomlConfig::default();
        let labels = &mut config.models.get_mut("en").unwrap().labels;
        labels.insert("LABEL_1".to_string(), "negative".to_string());

        let err = config.validate().unwrap_err();
        assert!(
            matches!(&err, Error::Config(msg) if msg.contains("LABEL_0") && msg.contains("LABEL_1"))
        );
    }

    #[test]
    fn test_policy_parses_snake_case() {
        let config: TomlConfig =
            toml::from_str("[pipeline]\nchunk_failure_policy = \"retry_individually\"\n").unwrap();
        assert_eq!(
            config.pipeline.chunk_failure_policy,
            ChunkFailurePolicy::RetryIndividually
        );
        assert_eq!(ChunkFailurePolicy::Abort.to_string(), "abort");
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = TomlConfig::default();
        config.queue.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = TomlConfig::default();
        config.apply_overrides(&ConfigOverrides {
            endpoint: Some("http://queue:9000/jobs".to_string()),
            poll_interval_ms: Some(250),
            max_words: None,
            log_level: Some("debug".to_string()),
        });
        assert_eq!(config.queue.endpoint, "http://queue:9000/jobs");
        assert_eq!(config.queue.poll_interval_ms, 250);
        assert_eq!(config.pipeline.max_words, 5000);
        assert_eq!(config.logging.level, "debug");
    }
}
