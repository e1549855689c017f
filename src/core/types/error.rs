//! Custom error types for Memory-Trainer

use super::address::Address;
use super::value::ValueType;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Main error type for memory operations
///
/// Cloneable and serializable so a failure can travel inside a
/// [`ScanEntry`](super::ScanEntry) or a
/// [`VerificationRecord`](super::VerificationRecord).
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MemoryError {
    #[error("Invalid numeric input '{input}': {reason}")]
    Parse { input: String, reason: String },

    #[error("Cannot encode {value} as {value_type}: {reason}")]
    Encode {
        value_type: ValueType,
        value: String,
        reason: String,
    },

    #[error("Failed to read {size} bytes at {address}: {reason}")]
    ReadFailed {
        address: Address,
        size: usize,
        reason: String,
    },

    #[error("Failed to write memory at {address}: {reason}")]
    WriteFailed { address: Address, reason: String },

    #[error("Write to {address} succeeded but verification read failed: {reason}")]
    ReadbackFailed { address: Address, reason: String },

    #[error("Buffer too small: expected {expected}, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("Invalid request size {requested}: must be between 1 and {maximum} bytes")]
    RequestTooLarge { requested: usize, maximum: usize },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Process enumeration failed: {0}")]
    EnumerationFailed(String),

    #[error("Scan failed for process {pid}: {reason}")]
    ScanFailed { pid: u32, reason: String },

    #[error("Native memory capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Closed error taxonomy, one tag per failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Parse,
    Encode,
    Read,
    Write,
    Readback,
    Decode,
    Request,
    Process,
    Scan,
    Capability,
    Task,
}

impl MemoryError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MemoryError::Parse { .. } => ErrorKind::Parse,
            MemoryError::Encode { .. } => ErrorKind::Encode,
            MemoryError::ReadFailed { .. } => ErrorKind::Read,
            MemoryError::WriteFailed { .. } => ErrorKind::Write,
            MemoryError::ReadbackFailed { .. } => ErrorKind::Readback,
            MemoryError::BufferTooSmall { .. } => ErrorKind::Decode,
            MemoryError::RequestTooLarge { .. } => ErrorKind::Request,
            MemoryError::InvalidRequest(_) => ErrorKind::Request,
            MemoryError::ProcessNotFound(_) => ErrorKind::Process,
            MemoryError::EnumerationFailed(_) => ErrorKind::Process,
            MemoryError::ScanFailed { .. } => ErrorKind::Scan,
            MemoryError::CapabilityUnavailable(_) => ErrorKind::Capability,
            MemoryError::TaskFailed(_) => ErrorKind::Task,
        }
    }

    /// True for failures raised before any memory was touched
    pub fn is_preflight(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Parse | ErrorKind::Encode | ErrorKind::Request
        )
    }

    /// Creates a parse error for operator input
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        MemoryError::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates an encode error
    pub fn encode(
        value_type: ValueType,
        value: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        MemoryError::Encode {
            value_type,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a read failed error
    pub fn read_failed(address: Address, size: usize, reason: impl Into<String>) -> Self {
        MemoryError::ReadFailed {
            address,
            size,
            reason: reason.into(),
        }
    }

    /// Creates a write failed error
    pub fn write_failed(address: Address, reason: impl Into<String>) -> Self {
        MemoryError::WriteFailed {
            address,
            reason: reason.into(),
        }
    }

    /// Creates a read-back verification error
    pub fn readback_failed(address: Address, reason: impl Into<String>) -> Self {
        MemoryError::ReadbackFailed {
            address,
            reason: reason.into(),
        }
    }

    /// Creates a buffer too small error
    pub fn buffer_too_small(expected: usize, actual: usize) -> Self {
        MemoryError::BufferTooSmall { expected, actual }
    }

    /// Creates a scan failed error
    pub fn scan_failed(pid: u32, reason: impl Into<String>) -> Self {
        MemoryError::ScanFailed {
            pid,
            reason: reason.into(),
        }
    }
}

impl From<tokio::task::JoinError> for MemoryError {
    fn from(err: tokio::task::JoinError) -> Self {
        MemoryError::TaskFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MemoryError::parse("abc", "not a number");
        assert_eq!(err.to_string(), "Invalid numeric input 'abc': not a number");

        let err = MemoryError::read_failed(Address::new(0x1000), 4, "page fault");
        assert_eq!(
            err.to_string(),
            "Failed to read 4 bytes at 0x1000: page fault"
        );
    }

    #[test]
    fn test_all_error_variants() {
        let errors: Vec<(MemoryError, &str)> = vec![
            (
                MemoryError::encode(ValueType::UInt8, 300, "out of range"),
                "Cannot encode 300 as uint8: out of range",
            ),
            (
                MemoryError::write_failed(Address::new(0x2000), "write protected"),
                "Failed to write memory at 0x2000: write protected",
            ),
            (
                MemoryError::readback_failed(Address::new(0x2000), "page gone"),
                "Write to 0x2000 succeeded but verification read failed: page gone",
            ),
            (
                MemoryError::buffer_too_small(4, 3),
                "Buffer too small: expected 4, got 3",
            ),
            (
                MemoryError::RequestTooLarge {
                    requested: 2048,
                    maximum: 1024,
                },
                "Invalid request size 2048: must be between 1 and 1024 bytes",
            ),
            (
                MemoryError::ProcessNotFound("project64".to_string()),
                "Process not found: project64",
            ),
            (
                MemoryError::EnumerationFailed("access denied".to_string()),
                "Process enumeration failed: access denied",
            ),
            (
                MemoryError::InvalidRequest("poll interval must be non-zero".to_string()),
                "Invalid request: poll interval must be non-zero",
            ),
            (
                MemoryError::scan_failed(42, "access denied"),
                "Scan failed for process 42: access denied",
            ),
            (
                MemoryError::CapabilityUnavailable("unsupported OS".to_string()),
                "Native memory capability unavailable: unsupported OS",
            ),
        ];

        for (error, expected) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_kinds() {
        assert_eq!(MemoryError::parse("x", "y").kind(), ErrorKind::Parse);
        assert_eq!(
            MemoryError::buffer_too_small(4, 3).kind(),
            ErrorKind::Decode
        );
        assert_eq!(
            MemoryError::readback_failed(Address::null(), "r").kind(),
            ErrorKind::Readback
        );
        assert!(MemoryError::encode(ValueType::Int8, 1000, "range").is_preflight());
        assert!(!MemoryError::write_failed(Address::null(), "w").is_preflight());
    }

    #[test]
    fn test_serialized_shape() {
        let err = MemoryError::read_failed(Address::new(0x10), 4, "short read");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "read_failed");
        assert_eq!(json["detail"]["address"], 0x10);
        assert_eq!(json["detail"]["reason"], "short read");

        let json = serde_json::to_value(MemoryError::TaskFailed("x".into())).unwrap();
        assert_eq!(json["kind"], "task_failed");
        assert_eq!(json["detail"], "x");
    }
}
