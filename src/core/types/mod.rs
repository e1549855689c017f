//! Core type definitions for Memory-Trainer
//!
//! Request-scoped value objects shared by the codec, the accessor and the
//! scan and write engines. Nothing here outlives a single operation.

mod address;
mod error;
mod process_info;
mod scan_result;
mod value;

// Re-export all public types
pub use address::Address;
pub use error::{ErrorKind, MemoryError, MemoryResult};
pub use process_info::ProcessHandle;
pub use scan_result::{
    hex_dump, ReadResult, ScanEntry, ScanReport, ScanSummary, VerificationRecord,
};
pub use value::{DecodedValue, NumericValue, TypedValue, ValueType};

// Common type aliases
pub type ProcessId = u32;
