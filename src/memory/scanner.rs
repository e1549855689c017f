//! Scan, confirm and decode
//!
//! A raw scan yields candidate addresses. Each candidate is re-read and
//! decoded independently; a candidate that cannot be confirmed becomes a
//! failed [`ScanEntry`] and never aborts the batch.

use super::accessor::MemoryAccessor;
use super::codec;
use crate::config::ScannerConfig;
use crate::core::types::{
    Address, MemoryResult, ProcessId, ReadResult, ScanEntry, ScanReport, ValueType,
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task;
use tracing::{debug, info, warn};

/// Bytes re-read per candidate; the scan target is always 32-bit
pub const CONFIRM_WIDTH: usize = 4;

/// Drives one scan and fans confirmation reads out over a bounded set of
/// blocking tasks
#[derive(Debug, Clone)]
pub struct ScanResultAggregator {
    accessor: MemoryAccessor,
    max_concurrency: usize,
    detail_read_size: usize,
}

impl ScanResultAggregator {
    pub fn new(accessor: MemoryAccessor, config: &ScannerConfig) -> Self {
        ScanResultAggregator {
            accessor,
            max_concurrency: config.max_concurrency.max(1),
            detail_read_size: config.detail_read_size,
        }
    }

    /// Scans `pid` for `target` and confirms every candidate.
    ///
    /// Only a failure of the raw scan itself is an error. Zero candidates is
    /// an empty report.
    pub async fn scan(&self, pid: ProcessId, target: u32) -> MemoryResult<ScanReport> {
        info!(
            "Scanning process {} for value {} (0x{:X})",
            pid, target as i32, target
        );

        let accessor = self.accessor.clone();
        let candidates = task::spawn_blocking(move || accessor.scan(pid, target)).await??;
        info!("Found {} addresses", candidates.len());

        let entries = self.confirm_all(pid, candidates).await;
        let report = ScanReport::new(pid, target, entries);

        info!(
            "Successfully read {} out of {} addresses",
            report.summary.confirmed, report.summary.total
        );
        if report.summary.failed > 0 {
            warn!(
                "{} candidate addresses could not be confirmed",
                report.summary.failed
            );
        }
        Ok(report)
    }

    /// Confirms `candidates` concurrently. The output has one entry per
    /// candidate, in candidate order, whatever order the reads complete in.
    pub async fn confirm_all(&self, pid: ProcessId, candidates: Vec<Address>) -> Vec<ScanEntry> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(candidates.len());

        for &address in &candidates {
            // The semaphore is never closed
            let permit = semaphore.clone().acquire_owned().await.ok();
            let accessor = self.accessor.clone();
            handles.push(task::spawn_blocking(move || {
                let _permit = permit;
                confirm(&accessor, pid, address)
            }));
        }

        let mut entries = Vec::with_capacity(handles.len());
        for (address, handle) in candidates.into_iter().zip(handles) {
            let entry = handle.await.unwrap_or_else(|e| {
                warn!("Confirmation task for {} failed: {}", address, e);
                ScanEntry::failed(address, None, e.into())
            });
            entries.push(entry);
        }
        entries
    }

    /// Best-effort detail read of the first confirmed entry.
    ///
    /// `None` when nothing was confirmed. A failure here is returned on its
    /// own and leaves `report` untouched.
    pub async fn enrich_first(
        &self,
        pid: ProcessId,
        report: &ScanReport,
    ) -> Option<MemoryResult<ReadResult>> {
        let address = report.first_confirmed()?.address();
        let accessor = self.accessor.clone();
        let size = self.detail_read_size;

        let result = match task::spawn_blocking(move || accessor.read(pid, address, size)).await {
            Ok(read) => read.map(|bytes| read_result(address, bytes)),
            Err(e) => Err(e.into()),
        };

        match &result {
            Ok(detail) => debug!("Detail for {}: {}", address, hex::encode(&detail.raw_bytes)),
            Err(e) => warn!("Detail read for {} failed: {}", address, e),
        }
        Some(result)
    }
}

fn confirm(accessor: &MemoryAccessor, pid: ProcessId, address: Address) -> ScanEntry {
    let bytes = match accessor.read(pid, address, CONFIRM_WIDTH) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read address {}: {}", address, e);
            return ScanEntry::failed(address, None, e);
        }
    };

    match codec::decode(ValueType::Int32, &bytes, 0) {
        Ok(decoded) => ScanEntry::confirmed(address, bytes, decoded),
        Err(e) => {
            warn!("Failed to decode address {}: {}", address, e);
            ScanEntry::failed(address, Some(bytes), e)
        }
    }
}

/// Pairs raw bytes with their interpretations when there are enough of them
pub(crate) fn read_result(address: Address, raw_bytes: Vec<u8>) -> ReadResult {
    let decoded = codec::decode(ValueType::Int32, &raw_bytes, 0).ok();
    ReadResult {
        address,
        raw_bytes,
        decoded,
    }
}
