//! Windows backend over kernel32 (`ReadProcessMemory`, `VirtualQueryEx`, ToolHelp32)

use super::{aligned_matches, NativeError, NativeMemory, NativeResult};
use crate::core::types::{Address, ProcessHandle, ProcessId};
use rayon::prelude::*;
use std::mem;
use tracing::{debug, warn};
use winapi::shared::minwindef::{FALSE, LPCVOID, LPVOID};
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::memoryapi::{ReadProcessMemory, VirtualQueryEx, WriteProcessMemory};
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::sysinfoapi::{GetSystemInfo, SYSTEM_INFO};
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Process32First, Process32Next, PROCESSENTRY32, TH32CS_SNAPPROCESS,
};
use winapi::um::winnt::{
    HANDLE, MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_EXECUTE_READ, PAGE_EXECUTE_READWRITE,
    PAGE_GUARD, PAGE_NOACCESS, PAGE_READONLY, PAGE_READWRITE, PROCESS_QUERY_INFORMATION,
    PROCESS_VM_OPERATION, PROCESS_VM_READ, PROCESS_VM_WRITE,
};

const ERROR_PARTIAL_COPY: u32 = 299;
const ERROR_INVALID_ADDRESS: u32 = 487;
const ERROR_NOACCESS: u32 = 998;

/// Closes the wrapped handle on drop
struct OwnedHandle(HANDLE);

// Process handles may be used from any thread
unsafe impl Send for OwnedHandle {}
unsafe impl Sync for OwnedHandle {}

impl OwnedHandle {
    fn open(pid: ProcessId, access: u32) -> NativeResult<Self> {
        let handle = unsafe { OpenProcess(access, FALSE, pid) };
        if handle.is_null() {
            Err(NativeError::ProcessUnavailable(pid))
        } else {
            Ok(OwnedHandle(handle))
        }
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        if !self.0.is_null() && self.0 != INVALID_HANDLE_VALUE {
            unsafe {
                CloseHandle(self.0);
            }
        }
    }
}

fn last_error() -> u32 {
    unsafe { GetLastError() }
}

fn access_error(address: Address, operation: &str) -> NativeError {
    match last_error() {
        ERROR_PARTIAL_COPY | ERROR_INVALID_ADDRESS | ERROR_NOACCESS => {
            NativeError::Unmapped(address)
        }
        code => NativeError::Os(format!("{} failed with error code {}", operation, code)),
    }
}

/// A committed, readable region from `VirtualQueryEx`
#[derive(Debug, Clone, Copy)]
struct Region {
    base: u64,
    size: usize,
}

fn is_scannable(mbi: &MEMORY_BASIC_INFORMATION) -> bool {
    let readable = PAGE_READWRITE | PAGE_READONLY | PAGE_EXECUTE_READ | PAGE_EXECUTE_READWRITE;
    mbi.State == MEM_COMMIT
        && mbi.Protect != PAGE_NOACCESS
        && mbi.Protect & PAGE_GUARD == 0
        && mbi.Protect & readable != 0
}

/// kernel32-based memory backend
#[derive(Debug, Clone)]
pub struct WindowsMemory {
    max_region_size: usize,
}

impl WindowsMemory {
    pub fn new(max_region_size: usize) -> Self {
        WindowsMemory { max_region_size }
    }

    fn regions(&self, handle: &OwnedHandle) -> Vec<Region> {
        let mut info: SYSTEM_INFO = unsafe { mem::zeroed() };
        unsafe { GetSystemInfo(&mut info) };

        let mut address = info.lpMinimumApplicationAddress as u64;
        let max_address = info.lpMaximumApplicationAddress as u64;
        let mut regions = Vec::new();

        while address < max_address {
            let mut mbi: MEMORY_BASIC_INFORMATION = unsafe { mem::zeroed() };
            let queried = unsafe {
                VirtualQueryEx(
                    handle.0,
                    address as LPCVOID,
                    &mut mbi,
                    mem::size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            };
            if queried == 0 || mbi.RegionSize == 0 {
                break;
            }

            if is_scannable(&mbi) {
                regions.push(Region {
                    base: mbi.BaseAddress as u64,
                    size: mbi.RegionSize,
                });
            }
            address = mbi.BaseAddress as u64 + mbi.RegionSize as u64;
        }

        regions
    }

    fn scan_region(&self, handle: &OwnedHandle, region: Region, value: u32) -> Vec<Address> {
        let mut size = region.size;
        if size > self.max_region_size {
            debug!(
                "Region 0x{:X} too large ({} MB), limiting to {} MB",
                region.base,
                size / (1024 * 1024),
                self.max_region_size / (1024 * 1024)
            );
            size = self.max_region_size;
        }

        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0;
        let ok = unsafe {
            ReadProcessMemory(
                handle.0,
                region.base as LPCVOID,
                buffer.as_mut_ptr() as LPVOID,
                size,
                &mut bytes_read,
            )
        };
        if ok == FALSE && bytes_read == 0 {
            return Vec::new();
        }

        aligned_matches(&buffer[..bytes_read], value)
            .map(|offset| Address::new(region.base + offset as u64))
            .collect()
    }
}

impl NativeMemory for WindowsMemory {
    fn name(&self) -> &'static str {
        "kernel32"
    }

    fn probe(&self) -> NativeResult<()> {
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
        if snapshot.is_null() || snapshot == INVALID_HANDLE_VALUE {
            return Err(NativeError::Unsupported(
                "cannot create a process snapshot".to_string(),
            ));
        }
        drop(OwnedHandle(snapshot));
        Ok(())
    }

    fn list_processes(&self) -> NativeResult<Vec<ProcessHandle>> {
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
        if snapshot.is_null() || snapshot == INVALID_HANDLE_VALUE {
            return Err(NativeError::Os(
                "Failed to create process snapshot".to_string(),
            ));
        }
        let snapshot = OwnedHandle(snapshot);

        let mut processes = Vec::new();
        let mut entry: PROCESSENTRY32 = unsafe { mem::zeroed() };
        entry.dwSize = mem::size_of::<PROCESSENTRY32>() as u32;

        let mut more = unsafe { Process32First(snapshot.0, &mut entry) } != FALSE;
        while more {
            let name_bytes = &entry.szExeFile;
            let end = name_bytes
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(name_bytes.len());
            let name: Vec<u8> = name_bytes[..end].iter().map(|&c| c as u8).collect();
            processes.push(ProcessHandle::new(
                entry.th32ProcessID,
                String::from_utf8_lossy(&name),
            ));

            more = unsafe { Process32Next(snapshot.0, &mut entry) } != FALSE;
        }

        Ok(processes)
    }

    fn scan_for_value(&self, pid: ProcessId, value: u32) -> NativeResult<Vec<Address>> {
        let handle = OwnedHandle::open(pid, PROCESS_VM_READ | PROCESS_QUERY_INFORMATION)?;
        let regions = self.regions(&handle);

        let per_region: Vec<Vec<Address>> = regions
            .par_iter()
            .map(|region| self.scan_region(&handle, *region, value))
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
        let handle = OwnedHandle::open(pid, PROCESS_VM_READ)?;
        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0;

        let ok = unsafe {
            ReadProcessMemory(
                handle.0,
                address.as_u64() as LPCVOID,
                buffer.as_mut_ptr() as LPVOID,
                size,
                &mut bytes_read,
            )
        };
        if ok == FALSE && bytes_read == 0 {
            return Err(access_error(address, "ReadProcessMemory"));
        }

        buffer.truncate(bytes_read);
        Ok(buffer)
    }

    fn write_bytes(&self, pid: ProcessId, address: Address, data: &[u8]) -> NativeResult<bool> {
        let handle = OwnedHandle::open(
            pid,
            PROCESS_VM_WRITE | PROCESS_VM_OPERATION | PROCESS_QUERY_INFORMATION,
        )?;
        let mut bytes_written = 0;

        let ok = unsafe {
            WriteProcessMemory(
                handle.0,
                address.as_u64() as LPVOID,
                data.as_ptr() as LPCVOID,
                data.len(),
                &mut bytes_written,
            )
        };
        if ok == FALSE {
            return Err(access_error(address, "WriteProcessMemory"));
        }
        if bytes_written != data.len() {
            warn!(
                "Incomplete memory write: requested {} bytes, but wrote {} bytes",
                data.len(),
                bytes_written
            );
            return Ok(false);
        }
        Ok(true)
    }
}
