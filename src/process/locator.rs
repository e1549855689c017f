//! Target process selection by name fragment

use crate::config::TargetConfig;
use crate::core::types::{MemoryError, MemoryResult, ProcessHandle, ProcessId};
use crate::memory::MemoryAccessor;
use std::time::Duration;
use tokio::task;
use tracing::{debug, info};

/// Finds the emulator among running processes
#[derive(Debug, Clone)]
pub struct TargetLocator {
    accessor: MemoryAccessor,
    fragments: Vec<String>,
    poll_interval: Duration,
}

impl TargetLocator {
    pub fn new(accessor: MemoryAccessor, config: &TargetConfig) -> Self {
        TargetLocator {
            accessor,
            fragments: config.process_fragments.clone(),
            poll_interval: config.poll_interval(),
        }
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// First process, in enumeration order, whose name contains any fragment
    pub fn find<'a>(&self, processes: &'a [ProcessHandle]) -> Option<&'a ProcessHandle> {
        processes
            .iter()
            .find(|p| self.fragments.iter().any(|f| p.matches_fragment(f)))
    }

    /// Every process matching any fragment
    pub fn find_all<'a>(&self, processes: &'a [ProcessHandle]) -> Vec<&'a ProcessHandle> {
        processes
            .iter()
            .filter(|p| self.fragments.iter().any(|f| p.matches_fragment(f)))
            .collect()
    }

    /// Enumerates processes once and picks the target
    pub async fn locate(&self) -> MemoryResult<ProcessHandle> {
        let accessor = self.accessor.clone();
        let processes = task::spawn_blocking(move || accessor.list_processes()).await??;

        match self.find(&processes) {
            Some(process) => {
                info!("Found target process: {}", process);
                Ok(process.clone())
            }
            None => Err(MemoryError::ProcessNotFound(format!(
                "no process name contains any of {:?}",
                self.fragments
            ))),
        }
    }

    /// Looks up a process by PID
    pub async fn by_pid(&self, pid: ProcessId) -> MemoryResult<ProcessHandle> {
        let accessor = self.accessor.clone();
        let processes = task::spawn_blocking(move || accessor.list_processes()).await??;
        processes
            .into_iter()
            .find(|p| p.pid == pid)
            .ok_or_else(|| MemoryError::ProcessNotFound(format!("PID: {}", pid)))
    }

    /// Polls [`locate`](Self::locate) every `interval` until the target shows
    /// up or `timeout` elapses.
    ///
    /// Only "nothing matched yet" is retried; an enumeration failure ends the
    /// wait with its own reason.
    pub async fn wait(&self, interval: Duration, timeout: Duration) -> MemoryResult<ProcessHandle> {
        if interval.is_zero() {
            return Err(MemoryError::InvalidRequest(
                "poll interval must be non-zero".to_string(),
            ));
        }

        let poll = async {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match self.locate().await {
                    Ok(process) => return Ok(process),
                    Err(MemoryError::ProcessNotFound(reason)) => {
                        debug!("Target not found yet: {}", reason)
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(MemoryError::ProcessNotFound(format!(
                "no process matching {:?} appeared within {:?}",
                self.fragments, timeout
            ))),
        }
    }
}
