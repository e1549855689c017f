//! Default configuration values for Memory-Trainer

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub target: TargetDefaults,
    pub scanner: ScannerDefaults,
    pub memory: MemoryDefaults,
    pub logging: LoggingDefaults,
}

/// Default target selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDefaults {
    pub process_fragments: Vec<String>,
    pub poll_interval_ms: u64,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub max_concurrency: usize,
    pub enrich_first: bool,
    pub detail_read_size: usize,
}

/// Default memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDefaults {
    pub max_read_size: usize,
    pub max_region_scan_size: usize,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
    pub with_target: bool,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        target: TargetDefaults {
            process_fragments: vec!["project64".to_string(), "pj64".to_string()],
            poll_interval_ms: 1000,
        },
        scanner: ScannerDefaults {
            // Confirmation reads are I/O bound
            max_concurrency: (num_cpus::get() * 2).min(64),
            enrich_first: true,
            detail_read_size: 16,
        },
        memory: MemoryDefaults {
            max_read_size: 1024,
            max_region_scan_size: 104857600, // 100MB
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
            with_target: false,
        },
    }
}
