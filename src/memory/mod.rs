//! Scan, confirm, decode and verified-write engine
//!
//! This module provides:
//! - [`codec`]: little-endian encoding and multi-interpretation decoding
//! - [`MemoryAccessor`]: error normalization over the native primitives
//! - [`ScanResultAggregator`]: concurrent per-candidate confirmation
//! - [`WriteVerifier`]: write followed by an independent read-back
//! - [`MemoryOperations`]: the call surface used by front ends

pub mod accessor;
pub mod codec;
pub mod scanner;
pub mod writer;

pub use accessor::MemoryAccessor;
pub use scanner::{ScanResultAggregator, CONFIRM_WIDTH};
pub use writer::WriteVerifier;

use crate::config::Config;
use crate::core::types::{
    Address, DecodedValue, MemoryError, MemoryResult, NumericValue, ProcessHandle, ProcessId,
    ReadResult, ScanReport, ValueType, VerificationRecord,
};
use crate::native::NativeMemory;
use crate::process::TargetLocator;
use std::sync::Arc;
use tokio::task;
use tracing::error;

/// Stable operation surface over one native backend.
///
/// Holds no per-process state; every call names its target pid.
#[derive(Debug, Clone)]
pub struct MemoryOperations {
    accessor: MemoryAccessor,
    aggregator: ScanResultAggregator,
    verifier: WriteVerifier,
    locator: TargetLocator,
    max_read_size: usize,
    enrich: bool,
}

impl MemoryOperations {
    /// Builds the engine over `native`; fails if the capability is unusable
    pub fn new(native: Arc<dyn NativeMemory>, config: &Config) -> MemoryResult<Self> {
        let accessor = MemoryAccessor::new(native)?;
        Ok(MemoryOperations {
            aggregator: ScanResultAggregator::new(accessor.clone(), &config.scanner),
            verifier: WriteVerifier::new(accessor.clone()),
            locator: TargetLocator::new(accessor.clone(), &config.target),
            max_read_size: config.memory.max_read_size,
            enrich: config.scanner.enrich_first,
            accessor,
        })
    }

    /// Builds the engine over the host platform's backend
    pub fn platform(config: &Config) -> MemoryResult<Self> {
        Self::new(crate::native::platform(&config.memory)?, config)
    }

    pub fn accessor(&self) -> &MemoryAccessor {
        &self.accessor
    }

    pub fn locator(&self) -> &TargetLocator {
        &self.locator
    }

    pub async fn list_processes(&self) -> MemoryResult<Vec<ProcessHandle>> {
        let accessor = self.accessor.clone();
        task::spawn_blocking(move || accessor.list_processes()).await?
    }

    pub async fn locate(&self) -> MemoryResult<ProcessHandle> {
        self.locator.locate().await
    }

    /// Scans for a 32-bit pattern and confirms every candidate
    pub async fn scan(&self, pid: ProcessId, target: u32) -> MemoryResult<ScanReport> {
        self.aggregator.scan(pid, target).await.map_err(|e| {
            error!("Scan of process {} failed: {}", pid, e);
            e
        })
    }

    /// Scans for an operator number; it must fit `i32::MIN..=u32::MAX`
    pub async fn scan_value(&self, pid: ProcessId, value: NumericValue) -> MemoryResult<ScanReport> {
        let target = codec::scan_pattern(value)?;
        self.scan(pid, target).await
    }

    /// Detail read of the first confirmed entry, when enabled and available
    pub async fn enrich_first(
        &self,
        pid: ProcessId,
        report: &ScanReport,
    ) -> Option<MemoryResult<ReadResult>> {
        if !self.enrich {
            return None;
        }
        self.aggregator.enrich_first(pid, report).await
    }

    /// Encodes, writes and verifies a typed value
    pub async fn write_typed(
        &self,
        pid: ProcessId,
        address: Address,
        value_type: ValueType,
        value: NumericValue,
    ) -> MemoryResult<VerificationRecord> {
        self.verifier.write(pid, address, value_type, value).await
    }

    /// Reads `size` raw bytes, with every interpretation when at least four
    /// were read
    pub async fn read_typed(
        &self,
        pid: ProcessId,
        address: Address,
        size: usize,
    ) -> MemoryResult<ReadResult> {
        if size == 0 || size > self.max_read_size {
            return Err(MemoryError::RequestTooLarge {
                requested: size,
                maximum: self.max_read_size,
            });
        }

        let accessor = self.accessor.clone();
        let bytes = task::spawn_blocking(move || accessor.read(pid, address, size))
            .await?
            .map_err(|e| {
                error!("Read at {} failed: {}", address, e);
                e
            })?;
        Ok(scanner::read_result(address, bytes))
    }

    /// Reads exactly `width(value_type)` bytes and decodes them
    pub async fn read_value(
        &self,
        pid: ProcessId,
        address: Address,
        value_type: ValueType,
    ) -> MemoryResult<DecodedValue> {
        let accessor = self.accessor.clone();
        let width = value_type.width();
        let bytes = task::spawn_blocking(move || accessor.read(pid, address, width)).await??;
        codec::decode(value_type, &bytes, 0)
    }
}
