//! Native process-memory capability
//!
//! The raw primitives that touch another process's address space live behind
//! [`NativeMemory`]. The rest of the crate only orchestrates, decodes and
//! verifies on top of this contract:
//!
//! - `list_processes() -> [{pid, name}]`
//! - `scan_for_value(pid, value) -> [address]`
//! - `read_bytes(pid, address, size) -> bytes | error`
//! - `write_bytes(pid, address, bytes) -> bool | error`
//!
//! Backends may signal a rejected write either with `Ok(false)` or with an
//! error; [`MemoryAccessor`](crate::memory::MemoryAccessor) folds both into
//! one failure.

#[cfg(target_os = "linux")]
pub mod linux;
pub mod simulated;
#[cfg(windows)]
pub mod windows;

pub use simulated::{SimulatedMemory, SimulatedProcess};

use crate::config::MemoryConfig;
use crate::core::types::{Address, MemoryError, MemoryResult, ProcessHandle, ProcessId};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by native backends
#[derive(Debug, Error)]
pub enum NativeError {
    #[error("process {0} is not running or cannot be opened")]
    ProcessUnavailable(ProcessId),

    #[error("address {0} is not mapped or not accessible")]
    Unmapped(Address),

    #[error("{operation} failed: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Os(String),

    #[error("native capability unsupported: {0}")]
    Unsupported(String),
}

impl NativeError {
    pub fn io(operation: &'static str, source: std::io::Error) -> Self {
        NativeError::Io { operation, source }
    }
}

pub type NativeResult<T> = Result<T, NativeError>;

/// The external capability every memory operation is built on.
///
/// Every call is blocking I/O across a process boundary. Implementations must
/// not cache process handles between calls.
pub trait NativeMemory: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Checks that the capability is usable at all
    fn probe(&self) -> NativeResult<()>;

    /// Lists running processes
    fn list_processes(&self) -> NativeResult<Vec<ProcessHandle>>;

    /// Returns every address holding the 32-bit little-endian `value`, in
    /// ascending address order
    fn scan_for_value(&self, pid: ProcessId, value: u32) -> NativeResult<Vec<Address>>;

    /// Reads up to `size` bytes; may return fewer
    fn read_bytes(&self, pid: ProcessId, address: Address, size: usize) -> NativeResult<Vec<u8>>;

    /// Writes all of `data`, returning `false` if the OS rejected it
    fn write_bytes(&self, pid: ProcessId, address: Address, data: &[u8]) -> NativeResult<bool>;
}

/// Returns the backend for the host OS.
///
/// Fails with [`MemoryError::CapabilityUnavailable`] when the platform has no
/// backend or the backend's probe fails.
pub fn platform(config: &MemoryConfig) -> MemoryResult<Arc<dyn NativeMemory>> {
    let backend = platform_backend(config)?;
    backend.probe().map_err(|e| {
        MemoryError::CapabilityUnavailable(format!("{} backend: {}", backend.name(), e))
    })?;
    Ok(backend)
}

#[cfg(target_os = "linux")]
fn platform_backend(config: &MemoryConfig) -> MemoryResult<Arc<dyn NativeMemory>> {
    Ok(Arc::new(linux::ProcMemory::new(config.max_region_scan_size)))
}

#[cfg(windows)]
fn platform_backend(config: &MemoryConfig) -> MemoryResult<Arc<dyn NativeMemory>> {
    Ok(Arc::new(windows::WindowsMemory::new(config.max_region_scan_size)))
}

#[cfg(not(any(target_os = "linux", windows)))]
fn platform_backend(_config: &MemoryConfig) -> MemoryResult<Arc<dyn NativeMemory>> {
    Err(MemoryError::CapabilityUnavailable(format!(
        "no native memory backend for {}",
        std::env::consts::OS
    )))
}

/// Offsets of little-endian `value` at 4-byte aligned positions in `buffer`
pub(crate) fn aligned_matches(buffer: &[u8], value: u32) -> impl Iterator<Item = usize> + '_ {
    let needle = value.to_le_bytes();
    buffer
        .chunks_exact(4)
        .enumerate()
        .filter(move |(_, chunk)| *chunk == needle)
        .map(|(index, _)| index * 4)
}
