//! Core module containing fundamental types for Memory-Trainer
//!
//! This module provides the foundational building blocks used throughout
//! the crate, including address handling, typed values, scan and write
//! records, and the error taxonomy.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address, DecodedValue, ErrorKind, MemoryError, MemoryResult, NumericValue, ProcessHandle,
    ProcessId, ScanEntry, ScanReport, TypedValue, ValueType, VerificationRecord,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
