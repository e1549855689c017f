//! Configuration module for Memory-Trainer
//!
//! Provides configuration loading, validation, and default settings
//! for the scan and write engine and the command line tool.

mod defaults;
mod loader;
mod validator;

pub use defaults::{default_config, ConfigDefaults};
pub use loader::{load_config, ConfigLoader, DEFAULT_CONFIG_FILE};
pub use validator::{validate_config, ConfigValidator};

// Re-export the configuration structures
pub use loader::{Config, LoggingConfig, MemoryConfig, ScannerConfig, TargetConfig};

// Configuration-related error type
pub use loader::ConfigError;

// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_module_exports() {
        let _config = default_config();
        let loader = ConfigLoader::new("test.toml");
        assert_eq!(loader.path(), std::path::Path::new("test.toml"));

        let error_result: ConfigResult<String> = Err(ConfigError::Invalid("test".to_string()));
        assert!(error_result.is_err());
    }

    #[test]
    fn test_validate_config_export() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_config_error_from_io() {
        use std::io;
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let config_error: ConfigError = io_error.into();
        assert!(matches!(config_error, ConfigError::Io(_)));
    }
}
