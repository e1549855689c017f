//! Memory-Trainer library: scan, decode and verified-write engine for
//! emulator trainer tooling

pub mod config;
pub mod core;
pub mod memory;
pub mod native;
pub mod process;

// Re-export main types from core module
pub use crate::core::types::{
    Address, DecodedValue, ErrorKind, MemoryError, MemoryResult, NumericValue, ProcessHandle,
    ProcessId, ReadResult, ScanEntry, ScanReport, ScanSummary, TypedValue, ValueType,
    VerificationRecord,
};

pub use memory::{MemoryAccessor, MemoryOperations, ScanResultAggregator, WriteVerifier};
pub use native::{NativeMemory, SimulatedMemory, SimulatedProcess};
pub use process::TargetLocator;

// Version information
pub use crate::core::{AUTHORS, VERSION};
