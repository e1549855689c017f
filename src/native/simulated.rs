//! In-process simulated backend
//!
//! Holds fake processes with byte regions at fixed base addresses and lets
//! callers inject the failure modes real targets produce: unreadable
//! addresses, short reads, rejected or failing writes and slow reads. Used by
//! the test suite, the benches and the CLI's `--simulate` mode.

use super::{aligned_matches, NativeError, NativeMemory, NativeResult};
use crate::core::types::{Address, ProcessHandle, ProcessId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// A fake process: a name plus byte regions keyed by base address
#[derive(Debug, Clone, Default)]
pub struct SimulatedProcess {
    pub pid: ProcessId,
    pub name: String,
    regions: BTreeMap<u64, Vec<u8>>,
}

impl SimulatedProcess {
    pub fn new(pid: ProcessId, name: impl Into<String>) -> Self {
        SimulatedProcess {
            pid,
            name: name.into(),
            regions: BTreeMap::new(),
        }
    }

    /// Maps `bytes` at `base`
    pub fn with_region(mut self, base: u64, bytes: Vec<u8>) -> Self {
        self.regions.insert(base, bytes);
        self
    }

    /// Maps a zeroed region of `size` bytes at `base`
    pub fn with_zeroed(self, base: u64, size: usize) -> Self {
        self.with_region(base, vec![0; size])
    }

    fn region_containing(&self, address: u64) -> Option<(u64, &Vec<u8>)> {
        let (&base, bytes) = self.regions.range(..=address).next_back()?;
        (address - base < bytes.len() as u64).then_some((base, bytes))
    }

    fn region_containing_mut(&mut self, address: u64) -> Option<(u64, &mut Vec<u8>)> {
        let (&base, bytes) = self.regions.range_mut(..=address).next_back()?;
        (address - base < bytes.len() as u64).then_some((base, bytes))
    }
}

#[derive(Debug, Default)]
struct Faults {
    failing_reads: HashSet<u64>,
    short_reads: HashMap<u64, usize>,
    rejected_writes: HashSet<u64>,
    failing_writes: HashSet<u64>,
    read_latency: HashMap<u64, Duration>,
    scripted_scan: Option<Vec<Address>>,
    scan_failure: Option<String>,
    listing_failure: Option<String>,
}

/// Thread-safe simulated [`NativeMemory`] with call counters
#[derive(Debug, Default)]
pub struct SimulatedMemory {
    processes: Mutex<BTreeMap<ProcessId, SimulatedProcess>>,
    faults: Mutex<Faults>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    scans: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread must not wedge the others
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimulatedMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small fake emulator session for `--simulate` and the benches.
    ///
    /// PID 4242 (`Project64.exe`) maps 64 KiB of RDRAM at `0x80000000` with
    /// 1234 stored at `0x80000010` and `0x80000200`, 9999 at `0x80000400`
    /// and the float 100.0 at `0x80000800`.
    pub fn demo() -> Self {
        let mut rdram = vec![0u8; 0x10000];
        rdram[0x10..0x14].copy_from_slice(&1234u32.to_le_bytes());
        rdram[0x200..0x204].copy_from_slice(&1234u32.to_le_bytes());
        rdram[0x400..0x404].copy_from_slice(&9999u32.to_le_bytes());
        rdram[0x800..0x804].copy_from_slice(&100.0f32.to_le_bytes());

        SimulatedMemory::new()
            .with_process(SimulatedProcess::new(1, "init"))
            .with_process(
                SimulatedProcess::new(4242, "Project64.exe").with_region(0x8000_0000, rdram),
            )
    }

    pub fn with_process(self, process: SimulatedProcess) -> Self {
        self.add_process(process);
        self
    }

    /// Adds or replaces a process at runtime
    pub fn add_process(&self, process: SimulatedProcess) {
        lock(&self.processes).insert(process.pid, process);
    }

    pub fn remove_process(&self, pid: ProcessId) {
        lock(&self.processes).remove(&pid);
    }

    /// Current bytes at `address`, bypassing faults and counters
    pub fn peek(&self, pid: ProcessId, address: u64, size: usize) -> Option<Vec<u8>> {
        let processes = lock(&self.processes);
        let (base, bytes) = processes.get(&pid)?.region_containing(address)?;
        let start = (address - base) as usize;
        bytes.get(start..start + size).map(<[u8]>::to_vec)
    }

    /// Every read at `address` fails
    pub fn fail_reads_at(&self, address: u64) -> &Self {
        lock(&self.faults).failing_reads.insert(address);
        self
    }

    /// Reads at `address` return at most `available` bytes
    pub fn short_reads_at(&self, address: u64, available: usize) -> &Self {
        lock(&self.faults).short_reads.insert(address, available);
        self
    }

    /// Writes at `address` report `false` without touching memory
    pub fn reject_writes_at(&self, address: u64) -> &Self {
        lock(&self.faults).rejected_writes.insert(address);
        self
    }

    /// Writes at `address` raise an error
    pub fn fail_writes_at(&self, address: u64) -> &Self {
        lock(&self.faults).failing_writes.insert(address);
        self
    }

    /// Reads at `address` block for `delay` before completing
    pub fn delay_reads_at(&self, address: u64, delay: Duration) -> &Self {
        lock(&self.faults).read_latency.insert(address, delay);
        self
    }

    /// Scans return exactly `addresses` regardless of memory contents
    pub fn script_scan(&self, addresses: Vec<Address>) -> &Self {
        lock(&self.faults).scripted_scan = Some(addresses);
        self
    }

    /// Scans raise an error with `reason`
    pub fn fail_scans(&self, reason: impl Into<String>) -> &Self {
        lock(&self.faults).scan_failure = Some(reason.into());
        self
    }

    /// Process enumeration raises an error with `reason`
    pub fn fail_listing(&self, reason: impl Into<String>) -> &Self {
        lock(&self.faults).listing_failure = Some(reason.into());
        self
    }

    /// Clears an injected enumeration failure
    pub fn restore_listing(&self) -> &Self {
        lock(&self.faults).listing_failure = None;
        self
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

impl NativeMemory for SimulatedMemory {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn probe(&self) -> NativeResult<()> {
        Ok(())
    }

    fn list_processes(&self) -> NativeResult<Vec<ProcessHandle>> {
        if let Some(reason) = &lock(&self.faults).listing_failure {
            return Err(NativeError::Os(reason.clone()));
        }
        Ok(lock(&self.processes)
            .values()
            .map(|p| ProcessHandle::new(p.pid, p.name.clone()))
            .collect())
    }

    fn scan_for_value(&self, pid: ProcessId, value: u32) -> NativeResult<Vec<Address>> {
        self.scans.fetch_add(1, Ordering::SeqCst);

        {
            let faults = lock(&self.faults);
            if let Some(reason) = &faults.scan_failure {
                return Err(NativeError::Os(reason.clone()));
            }
            if let Some(scripted) = &faults.scripted_scan {
                return Ok(scripted.clone());
            }
        }

        let processes = lock(&self.processes);
        let process = processes
            .get(&pid)
            .ok_or(NativeError::ProcessUnavailable(pid))?;

        // BTreeMap iteration keeps regions, and so results, in address order
        Ok(process
            .regions
            .iter()
            .flat_map(|(&base, bytes)| {
                aligned_matches(bytes, value).map(move |offset| Address::new(base + offset as u64))
            })
            .collect())
    }

    fn read_bytes(&self, pid: ProcessId, address: Address, size: usize) -> NativeResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let raw = address.as_u64();

        let (delay, limit) = {
            let faults = lock(&self.faults);
            if faults.failing_reads.contains(&raw) {
                return Err(NativeError::Os(format!("simulated read failure at {}", address)));
            }
            (
                faults.read_latency.get(&raw).copied(),
                faults.short_reads.get(&raw).copied(),
            )
        };

        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let processes = lock(&self.processes);
        let process = processes
            .get(&pid)
            .ok_or(NativeError::ProcessUnavailable(pid))?;
        let (base, bytes) = process
            .region_containing(raw)
            .ok_or(NativeError::Unmapped(address))?;

        let start = (raw - base) as usize;
        let mut end = bytes.len().min(start.saturating_add(size));
        if let Some(limit) = limit {
            end = end.min(start + limit);
        }
        Ok(bytes[start..end].to_vec())
    }

    fn write_bytes(&self, pid: ProcessId, address: Address, data: &[u8]) -> NativeResult<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let raw = address.as_u64();

        {
            let faults = lock(&self.faults);
            if faults.failing_writes.contains(&raw) {
                return Err(NativeError::Os(format!("simulated write failure at {}", address)));
            }
            if faults.rejected_writes.contains(&raw) {
                return Ok(false);
            }
        }

        let mut processes = lock(&self.processes);
        let process = processes
            .get_mut(&pid)
            .ok_or(NativeError::ProcessUnavailable(pid))?;
        let (base, bytes) = process
            .region_containing_mut(raw)
            .ok_or(NativeError::Unmapped(address))?;

        let start = (raw - base) as usize;
        match bytes.get_mut(start..start + data.len()) {
            Some(target) => {
                target.copy_from_slice(data);
                Ok(true)
            }
            // Straddles the end of the region
            None => Ok(false),
        }
    }
}
