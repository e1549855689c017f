//! Linux backend over procfs (`/proc/<pid>/maps` and `/proc/<pid>/mem`)

use super::{aligned_matches, NativeError, NativeMemory, NativeResult};
use crate::core::types::{Address, ProcessHandle, ProcessId};
use rayon::prelude::*;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;
use std::path::Path;
use tracing::{debug, warn};

/// A readable mapping from `/proc/<pid>/maps`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRegion {
    pub start: u64,
    pub end: u64,
    pub readable: bool,
    pub pathname: String,
}

impl MapRegion {
    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Kernel pseudo-mappings that fault on read
    fn is_special(&self) -> bool {
        matches!(self.pathname.as_str(), "[vvar]" | "[vsyscall]" | "[vvar_vclock]")
    }
}

/// Parses one line of `/proc/<pid>/maps`
pub fn parse_maps_line(line: &str) -> Option<MapRegion> {
    let mut fields = line.split_whitespace();
    let range = fields.next()?;
    let perms = fields.next()?;
    // offset, dev, inode
    let pathname = fields.nth(3).unwrap_or("").to_string();

    let (start, end) = range.split_once('-')?;
    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;

    Some(MapRegion {
        start,
        end,
        readable: perms.starts_with('r'),
        pathname,
    })
}

/// procfs-based memory backend
#[derive(Debug, Clone)]
pub struct ProcMemory {
    max_region_size: usize,
}

impl ProcMemory {
    pub fn new(max_region_size: usize) -> Self {
        ProcMemory { max_region_size }
    }

    fn mem_path(pid: ProcessId) -> String {
        format!("/proc/{}/mem", pid)
    }

    fn open_mem(pid: ProcessId, write: bool) -> NativeResult<File> {
        OpenOptions::new()
            .read(true)
            .write(write)
            .open(Self::mem_path(pid))
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => NativeError::ProcessUnavailable(pid),
                _ => NativeError::io("open process memory", e),
            })
    }

    /// Readable regions of the target, in address order
    pub fn regions(&self, pid: ProcessId) -> NativeResult<Vec<MapRegion>> {
        let maps = fs::read_to_string(format!("/proc/{}/maps", pid)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => NativeError::ProcessUnavailable(pid),
            _ => NativeError::io("read process maps", e),
        })?;

        Ok(maps
            .lines()
            .filter_map(parse_maps_line)
            .filter(|region| region.readable && !region.is_special() && region.size() > 0)
            .collect())
    }

    fn scan_region(&self, file: &File, region: &MapRegion, value: u32) -> Vec<Address> {
        let mut size = region.size() as usize;
        if size > self.max_region_size {
            debug!(
                "Region 0x{:X} too large ({} MB), limiting to {} MB",
                region.start,
                size / (1024 * 1024),
                self.max_region_size / (1024 * 1024)
            );
            size = self.max_region_size;
        }

        let mut buffer = vec![0u8; size];
        let read = match file.read_at(&mut buffer, region.start) {
            Ok(read) => read,
            Err(e) => {
                debug!("Failed to read region 0x{:X}: {}", region.start, e);
                return Vec::new();
            }
        };

        aligned_matches(&buffer[..read], value)
            .map(|offset| Address::new(region.start + offset as u64))
            .collect()
    }
}

impl NativeMemory for ProcMemory {
    fn name(&self) -> &'static str {
        "procfs"
    }

    fn probe(&self) -> NativeResult<()> {
        if Path::new("/proc/self/mem").exists() {
            Ok(())
        } else {
            Err(NativeError::Unsupported("procfs is not mounted".to_string()))
        }
    }

    fn list_processes(&self) -> NativeResult<Vec<ProcessHandle>> {
        let entries = fs::read_dir("/proc").map_err(|e| NativeError::io("list /proc", e))?;

        let mut processes: Vec<ProcessHandle> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str()?.parse::<ProcessId>().ok())
            .filter_map(|pid| {
                // The process may exit between listing and reading its name
                let name = fs::read_to_string(format!("/proc/{}/comm", pid)).ok()?;
                Some(ProcessHandle::new(pid, name.trim_end()))
            })
            .collect();

        processes.sort_by_key(|p| p.pid);
        Ok(processes)
    }

    fn scan_for_value(&self, pid: ProcessId, value: u32) -> NativeResult<Vec<Address>> {
        let regions = self.regions(pid)?;
        let file = Self::open_mem(pid, false)?;

        // Collecting an indexed parallel iterator keeps region order
        let per_region: Vec<Vec<Address>> = regions
            .par_iter()
            .map(|region| self.scan_region(&file, region, value))
            .collect();

        let results: Vec<Address> = per_region.into_iter().flatten().collect();
        debug!(
            "Scan completed. Scanned {} memory regions. Found {} matches.",
            regions.len(),
            results.len()
        );
        Ok(results)
    }

    fn read_bytes(&self, pid: ProcessId, address: Address, size: usize) -> NativeResult<Vec<u8>> {
        let file = Self::open_mem(pid, false)?;
        let mut buffer = vec![0u8; size];
        let read = file.read_at(&mut buffer, address.as_u64()).map_err(|e| match e.raw_os_error() {
            // EIO / EFAULT: unmapped or protected page
            Some(5) | Some(14) => NativeError::Unmapped(address),
            _ => NativeError::io("read process memory", e),
        })?;
        buffer.truncate(read);
        Ok(buffer)
    }

    fn write_bytes(&self, pid: ProcessId, address: Address, data: &[u8]) -> NativeResult<bool> {
        let file = Self::open_mem(pid, true)?;
        match file.write_at(data, address.as_u64()) {
            Ok(written) if written == data.len() => Ok(true),
            Ok(written) => {
                warn!(
                    "Incomplete memory write: requested {} bytes, but wrote {} bytes",
                    data.len(),
                    written
                );
                Ok(false)
            }
            Err(e) => match e.raw_os_error() {
                Some(5) | Some(14) => Err(NativeError::Unmapped(address)),
                _ => Err(NativeError::io("write process memory", e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_maps_line() {
        let region = parse_maps_line(
            "7f1c2a000000-7f1c2a021000 rw-p 00000000 00:00 0                          [heap]",
        )
        .unwrap();
        assert_eq!(region.start, 0x7f1c2a000000);
        assert_eq!(region.end, 0x7f1c2a021000);
        assert_eq!(region.size(), 0x21000);
        assert!(region.readable);
        assert_eq!(region.pathname, "[heap]");

        let anon = parse_maps_line("00400000-00401000 ---p 00000000 00:00 0").unwrap();
        assert!(!anon.readable);
        assert_eq!(anon.pathname, "");

        assert!(parse_maps_line("garbage").is_none());
        assert!(parse_maps_line("zz-10 r--p 0 0 0").is_none());
    }

    #[test]
    fn test_special_regions_skipped() {
        let vvar = parse_maps_line("7ffd1000-7ffd5000 r--p 00000000 00:00 0 [vvar]").unwrap();
        assert!(vvar.is_special());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_read_own_memory() {
        let backend = ProcMemory::new(100 * 1024 * 1024);
        let value: u32 = 0x12345678;
        let address = Address::new(&value as *const u32 as u64);

        let bytes = backend.read_bytes(std::process::id(), address, 4).unwrap();
        assert_eq!(bytes, value.to_le_bytes().to_vec());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_current_process_listed() {
        let backend = ProcMemory::new(1024);
        let processes = backend.list_processes().unwrap();
        assert!(processes.iter().any(|p| p.pid == std::process::id()));
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_missing_process() {
        let backend = ProcMemory::new(1024);
        let err = backend.read_bytes(u32::MAX, Address::new(0x1000), 4).unwrap_err();
        assert!(matches!(err, NativeError::ProcessUnavailable(_)));
    }
}
