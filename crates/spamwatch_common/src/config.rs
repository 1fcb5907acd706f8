//! Configuration management for spamwatch.
//!
//! Loads settings from a TOML file (`--config`, `$SPAMWATCH_CONFIG`, or
//! /etc/spamwatch/config.toml) or uses defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/spamwatch/config.toml";

/// Environment variable overriding the config file path
pub const CONFIG_ENV: &str = "SPAMWATCH_CONFIG";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the network weights (JSON)
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Path to the tokenizer exported by `Tokenizer.to_json()`
    #[serde(default = "default_tokenizer_path")]
    pub tokenizer_path: PathBuf,

    /// Fixed sequence length fed to the network
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Probabilities strictly above this are spam
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/cnn_spam_model.json")
}

fn default_tokenizer_path() -> PathBuf {
    PathBuf::from("models/cnn_tokenizer.json")
}

fn default_max_length() -> usize {
    100
}

fn default_threshold() -> f32 {
    0.5
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            tokenizer_path: default_tokenizer_path(),
            max_length: default_max_length(),
            threshold: default_threshold(),
        }
    }
}

/// Prediction history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Entries kept before the oldest is evicted
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

fn default_history_capacity() -> usize {
    100
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

/// Request validation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_min_message_chars")]
    pub min_message_chars: usize,

    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Messages read from an uploaded file beyond this are ignored
    #[serde(default = "default_max_file_messages")]
    pub max_file_messages: usize,

    /// Request body cap, uploads included
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_min_message_chars() -> usize {
    10
}

fn default_max_message_chars() -> usize {
    5000
}

fn default_max_batch_size() -> usize {
    100
}

fn default_max_file_messages() -> usize {
    100
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_message_chars: default_min_message_chars(),
            max_message_chars: default_max_message_chars(),
            max_batch_size: default_max_batch_size(),
            max_file_messages: default_max_file_messages(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Offline evaluation scores of the deployed model, reported by `/statistics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    #[serde(default = "default_precision")]
    pub precision: f64,
    #[serde(default = "default_recall")]
    pub recall: f64,
    #[serde(default = "default_f1_score")]
    pub f1_score: f64,
}

fn default_accuracy() -> f64 {
    0.9847
}

fn default_precision() -> f64 {
    0.9823
}

fn default_recall() -> f64 {
    0.9756
}

fn default_f1_score() -> f64 {
    0.9789
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            accuracy: default_accuracy(),
            precision: default_precision(),
            recall: default_recall(),
            f1_score: default_f1_score(),
        }
    }
}

/// Full spamwatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpamwatchConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl SpamwatchConfig {
    /// Load config from an explicit path, `$SPAMWATCH_CONFIG`, or the system
    /// path, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(CONFIG_PATH));

        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        Self::load_from_path(&path).unwrap_or_else(|e| {
            warn!("Config unusable, using defaults: {:#}", e);
            Self::default()
        })
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: SpamwatchConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SpamwatchConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(config.model.max_length, 100);
        assert_eq!(config.model.threshold, 0.5);
        assert_eq!(config.history.capacity, 100);
        assert_eq!(config.limits.min_message_chars, 10);
        assert_eq!(config.limits.max_message_chars, 5000);
        assert_eq!(config.limits.max_batch_size, 100);
        assert_eq!(config.metrics.accuracy, 0.9847);
        assert_eq!(config.metrics.f1_score, 0.9789);
    }

    #[test]
    fn test_parse_toml_partial() {
        let toml_str = r#"
[server]
bind = "127.0.0.1:9000"

[model]
max_length = 64
"#;
        let config: SpamwatchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.model.max_length, 64);
        // Defaults for missing fields
        assert_eq!(config.model.threshold, 0.5);
        assert_eq!(config.model.tokenizer_path, PathBuf::from("models/cnn_tokenizer.json"));
        assert_eq!(config.history.capacity, 100);
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let example = include_str!("../../../config/spamwatch.example.toml");
        let config: SpamwatchConfig = toml::from_str(example).unwrap();
        let defaults = SpamwatchConfig::default();
        assert_eq!(config.server.bind, defaults.server.bind);
        assert_eq!(config.model.model_path, defaults.model.model_path);
        assert_eq!(config.limits.max_upload_bytes, defaults.limits.max_upload_bytes);
        assert_eq!(config.metrics.recall, defaults.metrics.recall);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[history]\ncapacity = 5").unwrap();
        let config = SpamwatchConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.history.capacity, 5);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[history\ncapacity = ").unwrap();
        assert!(SpamwatchConfig::load_from_path(file.path()).is_err());
        let config = SpamwatchConfig::load(Some(file.path()));
        assert_eq!(config.history.capacity, 100);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SpamwatchConfig::load(Some(&dir.path().join("absent.toml")));
        assert_eq!(config.server.bind, "0.0.0.0:8000");
    }
}
