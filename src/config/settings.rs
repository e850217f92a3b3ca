use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use thiserror::Error;

/// Accepted range for the staged-diff commit guard, 100 KB to 100 MB.
pub const MAX_DIFF_BYTES_RANGE: RangeInclusive<u64> = 100_000..=100_000_000;

/// Accepted range for the AI request timeout, 5 seconds to 5 minutes.
pub const AI_TIMEOUT_RANGE: RangeInclusive<f64> = 5.0..=300.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Application configuration, persisted as a TOML document.
///
/// Missing keys fall back to defaults; keys this version does not recognize
/// ride along in `extra` and survive a load/save round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Commit guard: refuse to commit when the staged diff exceeds this
    #[serde(default = "default_max_diff_bytes")]
    pub max_diff_bytes: u64,

    #[serde(default = "default_ai_timeout_seconds")]
    pub ai_timeout_seconds: f64,

    /// Git binary path or command name on PATH
    #[serde(default = "default_git_executable")]
    pub git_executable: String,

    /// Base URL of the local model endpoint
    #[serde(default = "default_ai_host")]
    pub ai_host: String,

    #[serde(default = "default_ai_model")]
    pub ai_model: String,

    #[serde(flatten)]
    pub extra: toml::Table,
}

fn default_max_diff_bytes() -> u64 {
    2_000_000
}

fn default_ai_timeout_seconds() -> f64 {
    30.0
}

fn default_git_executable() -> String {
    std::env::var("GIT_EXECUTABLE").unwrap_or_else(|_| "git".to_string())
}

fn default_ai_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ai_model() -> String {
    "llama3.2".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_diff_bytes: default_max_diff_bytes(),
            ai_timeout_seconds: default_ai_timeout_seconds(),
            git_executable: default_git_executable(),
            ai_host: default_ai_host(),
            ai_model: default_ai_model(),
            extra: toml::Table::new(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("gitpal"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(Self::config_path()?)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration, falling back silently to defaults on any failure.
    /// A broken or missing config file must never keep the assistant from
    /// starting.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        // Validate before saving
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !MAX_DIFF_BYTES_RANGE.contains(&self.max_diff_bytes) {
            return Err(ConfigError::InvalidValue(format!(
                "max_diff_bytes must be between {} and {}",
                MAX_DIFF_BYTES_RANGE.start(),
                MAX_DIFF_BYTES_RANGE.end()
            )));
        }

        if !AI_TIMEOUT_RANGE.contains(&self.ai_timeout_seconds) {
            return Err(ConfigError::InvalidValue(format!(
                "ai_timeout_seconds must be between {} and {}",
                AI_TIMEOUT_RANGE.start(),
                AI_TIMEOUT_RANGE.end()
            )));
        }

        if self.git_executable.is_empty() {
            return Err(ConfigError::InvalidValue(
                "git_executable must not be empty".to_string(),
            ));
        }

        if self.ai_host.is_empty() || self.ai_model.is_empty() {
            return Err(ConfigError::InvalidValue(
                "ai_host and ai_model must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_diff_bytes, 2_000_000);
        assert_eq!(config.ai_timeout_seconds, 30.0);
        assert_eq!(config.ai_host, "http://localhost:11434");
        assert!(!config.ai_model.is_empty());
        assert!(config.extra.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let config: Config = toml::from_str("max_diff_bytes = 500000\n").unwrap();
        assert_eq!(config.max_diff_bytes, 500_000);
        assert_eq!(config.ai_timeout_seconds, 30.0);
        assert_eq!(config.ai_host, "http://localhost:11434");
    }

    #[test]
    fn test_unknown_keys_are_preserved() {
        let document = "max_diff_bytes = 500000\nfuture_feature = \"enabled\"\n";
        let config: Config = toml::from_str(document).unwrap();

        assert_eq!(
            config.extra.get("future_feature").and_then(|v| v.as_str()),
            Some("enabled")
        );

        // And they survive re-serialization
        let serialized = toml::to_string(&config).unwrap();
        assert!(serialized.contains("future_feature"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_guard() {
        let mut config = Config::default();

        config.max_diff_bytes = 99_999;
        assert!(config.validate().is_err());

        config.max_diff_bytes = 100_000_001;
        assert!(config.validate().is_err());

        config.max_diff_bytes = 100_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_timeout() {
        let mut config = Config::default();

        config.ai_timeout_seconds = 4.9;
        assert!(config.validate().is_err());

        config.ai_timeout_seconds = 300.1;
        assert!(config.validate().is_err());

        config.ai_timeout_seconds = 300.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_executable() {
        let mut config = Config::default();
        config.git_executable = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serialize_deserialize_round_trip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config.max_diff_bytes, parsed.max_diff_bytes);
        assert_eq!(config.ai_host, parsed.ai_host);
        assert_eq!(config.ai_model, parsed.ai_model);
    }

    #[test]
    fn test_malformed_document_falls_back_in_load_or_default() {
        // load_or_default must not propagate parse errors; exercise the parse
        // path directly since the default location is the real user home.
        let result: Result<Config, _> = toml::from_str("max_diff_bytes = \"lots\"");
        assert!(result.is_err());

        let config = Config::load_or_default();
        assert!(config.max_diff_bytes >= *MAX_DIFF_BYTES_RANGE.start());
    }
}
