//! Contract wrapper around the native read/write primitives
//!
//! Every [`NativeError`] is converted into a [`MemoryError`] here and nowhere
//! else. There are no retries: a failed call is surfaced immediately and the
//! caller decides whether it is terminal or per-item.

use crate::config::MemoryConfig;
use crate::core::types::{
    hex_dump, Address, MemoryError, MemoryResult, ProcessHandle, ProcessId,
};
use crate::native::{self, NativeMemory};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cheap to clone; clones share the same backend
#[derive(Clone)]
pub struct MemoryAccessor {
    native: Arc<dyn NativeMemory>,
}

impl MemoryAccessor {
    /// Wraps a backend, failing with [`MemoryError::CapabilityUnavailable`]
    /// if its probe fails
    pub fn new(native: Arc<dyn NativeMemory>) -> MemoryResult<Self> {
        native.probe().map_err(|e| {
            MemoryError::CapabilityUnavailable(format!("{} backend: {}", native.name(), e))
        })?;
        debug!("Using {} memory backend", native.name());
        Ok(MemoryAccessor { native })
    }

    /// Accessor over the host platform's backend
    pub fn platform(config: &MemoryConfig) -> MemoryResult<Self> {
        Self::new(native::platform(config)?)
    }

    pub fn backend_name(&self) -> &'static str {
        self.native.name()
    }

    pub fn list_processes(&self) -> MemoryResult<Vec<ProcessHandle>> {
        self.native
            .list_processes()
            .map_err(|e| MemoryError::EnumerationFailed(e.to_string()))
    }

    /// Runs the raw scan primitive once
    pub fn scan(&self, pid: ProcessId, value: u32) -> MemoryResult<Vec<Address>> {
        self.native
            .scan_for_value(pid, value)
            .map_err(|e| MemoryError::scan_failed(pid, e.to_string()))
    }

    /// Reads exactly `size` bytes. A short read is an error, not a truncated success.
    pub fn read(&self, pid: ProcessId, address: Address, size: usize) -> MemoryResult<Vec<u8>> {
        let bytes = self
            .native
            .read_bytes(pid, address, size)
            .map_err(|e| MemoryError::read_failed(address, size, e.to_string()))?;

        if bytes.len() < size {
            return Err(MemoryError::read_failed(
                address,
                size,
                format!("short read: got {} of {} bytes", bytes.len(), size),
            ));
        }

        debug!("Read {} bytes at {}: {}", size, address, hex_dump(&bytes));
        Ok(bytes)
    }

    /// Writes `data`, folding a `false` result and a raised error into one failure
    pub fn write(&self, pid: ProcessId, address: Address, data: &[u8]) -> MemoryResult<()> {
        match self.native.write_bytes(pid, address, data) {
            Ok(true) => {
                debug!("Wrote {} bytes at {}: {}", data.len(), address, hex_dump(data));
                Ok(())
            }
            Ok(false) => {
                warn!("Write of {} bytes at {} rejected", data.len(), address);
                Err(MemoryError::write_failed(
                    address,
                    "write rejected by the target process",
                ))
            }
            Err(e) => {
                warn!("Write of {} bytes at {} failed: {}", data.len(), address, e);
                Err(MemoryError::write_failed(address, e.to_string()))
            }
        }
    }
}

impl fmt::Debug for MemoryAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAccessor")
            .field("backend", &self.native.name())
            .finish()
    }
}
