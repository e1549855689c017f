//! Configuration validator for Memory-Trainer
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, MemoryConfig, ScannerConfig, TargetConfig};

const MAX_READ_SIZE_LIMIT: usize = 1024 * 1024;
const MIN_REGION_SCAN_SIZE: usize = 4096;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_target(&config.target)?;
        Self::validate_memory(&config.memory)?;
        Self::validate_scanner(&config.scanner, &config.memory)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    /// Validates target selection
    fn validate_target(target: &TargetConfig) -> Result<(), ConfigError> {
        if target.process_fragments.is_empty() {
            return Err(ConfigError::Invalid(
                "At least one process name fragment is required".to_string(),
            ));
        }

        if target.process_fragments.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "Process name fragments cannot be blank".to_string(),
            ));
        }

        if !(10..=60000).contains(&target.poll_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "Poll interval must be between 10 and 60000 ms, got {}",
                target.poll_interval_ms
            )));
        }

        Ok(())
    }

    /// Validates scanner configuration
    fn validate_scanner(scanner: &ScannerConfig, memory: &MemoryConfig) -> Result<(), ConfigError> {
        if scanner.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "Scanner concurrency must be at least 1".to_string(),
            ));
        }

        if scanner.max_concurrency > 256 {
            return Err(ConfigError::Invalid(
                "Scanner concurrency cannot exceed 256".to_string(),
            ));
        }

        // The detail read must cover the 64-bit interpretations
        if scanner.detail_read_size < 8 || scanner.detail_read_size > memory.max_read_size {
            return Err(ConfigError::Invalid(format!(
                "Detail read size must be between 8 and {} bytes, got {}",
                memory.max_read_size, scanner.detail_read_size
            )));
        }

        Ok(())
    }

    /// Validates memory configuration
    fn validate_memory(memory: &MemoryConfig) -> Result<(), ConfigError> {
        if memory.max_read_size < 4 || memory.max_read_size > MAX_READ_SIZE_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "Maximum read size must be between 4 and {} bytes",
                MAX_READ_SIZE_LIMIT
            )));
        }

        if memory.max_region_scan_size < MIN_REGION_SCAN_SIZE {
            return Err(ConfigError::Invalid(format!(
                "Region scan size must be at least {} bytes",
                MIN_REGION_SCAN_SIZE
            )));
        }

        Ok(())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
