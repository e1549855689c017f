//! Configuration loader for Memory-Trainer
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File looked up when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "memory-trainer.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_target")]
    pub target: TargetConfig,

    #[serde(default = "default_scanner")]
    pub scanner: ScannerConfig,

    #[serde(default = "default_memory")]
    pub memory: MemoryConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Target process selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_process_fragments")]
    pub process_fragments: Vec<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl TargetConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_enrich_first")]
    pub enrich_first: bool,
    #[serde(default = "default_detail_read_size")]
    pub detail_read_size: usize,
}

/// Memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
    #[serde(default = "default_max_region_scan_size")]
    pub max_region_scan_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_with_target")]
    pub with_target: bool,
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults only when the file is absent.
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(&self) -> Result<Config, ConfigError> {
        match self.load() {
            Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from the default location
pub fn load_config() -> Result<Config, ConfigError> {
    ConfigLoader::new(DEFAULT_CONFIG_FILE).load_or_default()
}

// Default functions for serde
fn default_target() -> TargetConfig {
    let defaults = default_config();
    TargetConfig {
        process_fragments: defaults.target.process_fragments,
        poll_interval_ms: defaults.target.poll_interval_ms,
    }
}

fn default_scanner() -> ScannerConfig {
    let defaults = default_config();
    ScannerConfig {
        max_concurrency: defaults.scanner.max_concurrency,
        enrich_first: defaults.scanner.enrich_first,
        detail_read_size: defaults.scanner.detail_read_size,
    }
}

fn default_memory() -> MemoryConfig {
    let defaults = default_config();
    MemoryConfig {
        max_read_size: defaults.memory.max_read_size,
        max_region_scan_size: defaults.memory.max_region_scan_size,
    }
}

fn default_logging() -> LoggingConfig {
    let defaults = default_config();
    LoggingConfig {
        level: defaults.logging.level,
        with_target: defaults.logging.with_target,
    }
}

// Individual field defaults
fn default_process_fragments() -> Vec<String> {
    default_config().target.process_fragments
}

fn default_poll_interval_ms() -> u64 {
    default_config().target.poll_interval_ms
}

fn default_max_concurrency() -> usize {
    default_config().scanner.max_concurrency
}

fn default_enrich_first() -> bool {
    default_config().scanner.enrich_first
}

fn default_detail_read_size() -> usize {
    default_config().scanner.detail_read_size
}

fn default_max_read_size() -> usize {
    default_config().memory.max_read_size
}

fn default_max_region_scan_size() -> usize {
    default_config().memory.max_region_scan_size
}

fn default_log_level() -> String {
    default_config().logging.level
}

fn default_with_target() -> bool {
    default_config().logging.with_target
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target: default_target(),
            scanner: default_scanner(),
            memory: default_memory(),
            logging: default_logging(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        default_memory()
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        default_scanner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.target.process_fragments, vec!["project64", "pj64"]);
        assert_eq!(config.target.poll_interval(), Duration::from_secs(1));
        assert!(config.scanner.max_concurrency > 0);
        assert_eq!(config.memory.max_read_size, 1024);
    }

    #[test]
    fn test_load_missing_file() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let result = loader.load();
        assert!(matches!(result.unwrap_err(), ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_or_default() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let config = loader.load_or_default().unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_or_default_keeps_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[scanner\nmax_concurrency = ").unwrap();

        let result = ConfigLoader::new(&config_path).load_or_default();
        assert!(matches!(result.unwrap_err(), ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::default();
        config.target.process_fragments = vec!["mupen".to_string()];
        config.scanner.max_concurrency = 3;
        let loader = ConfigLoader::new(&config_path);

        loader.save(&config).unwrap();
        assert!(config_path.exists());

        let loaded = loader.load().unwrap();
        assert_eq!(loaded.target.process_fragments, vec!["mupen"]);
        assert_eq!(loaded.scanner.max_concurrency, 3);
        assert_eq!(loaded.memory.max_read_size, config.memory.max_read_size);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
            [target]
            process_fragments = ["Project64"]

            [memory]
            max_read_size = 4096
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.target.process_fragments, vec!["Project64"]);
        assert_eq!(config.memory.max_read_size, 4096);
        // Check defaults are applied
        assert_eq!(config.target.poll_interval_ms, 1000);
        assert_eq!(config.memory.max_region_scan_size, 104857600);
        assert!(config.scanner.enrich_first);
    }
}
