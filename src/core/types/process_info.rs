//! Process identification types

use super::ProcessId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A running process as reported by the native enumeration primitive.
///
/// Request-scoped: nothing caches an OS handle behind it, so a process that
/// exits simply makes the next memory call fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessHandle {
    pub pid: ProcessId,
    pub name: String,
}

impl ProcessHandle {
    pub fn new(pid: ProcessId, name: impl Into<String>) -> Self {
        ProcessHandle {
            pid,
            name: name.into(),
        }
    }

    /// Case-insensitive substring match against a name fragment
    pub fn matches_fragment(&self, fragment: &str) -> bool {
        let fragment = fragment.trim();
        !fragment.is_empty()
            && self
                .name
                .to_lowercase()
                .contains(&fragment.to_lowercase())
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (PID: {})", self.name, self.pid)
    }
}
