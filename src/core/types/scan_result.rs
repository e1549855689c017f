//! Scan, read and write result types

use super::{Address, DecodedValue, MemoryError, ValueType};
use serde::{Serialize, Serializer};

/// Renders raw bytes as a lowercase hex string
fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

fn serialize_hex_opt<S: Serializer>(
    bytes: &Option<Vec<u8>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(bytes) => serialize_hex(bytes, serializer),
        None => serializer.serialize_none(),
    }
}

/// Space separated hex dump (`de ad be ef`)
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One confirmed or failed candidate from a scan.
///
/// Built only through [`ScanEntry::confirmed`] and [`ScanEntry::failed`], so
/// exactly one of `decoded` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEntry {
    address: Address,
    #[serde(serialize_with = "serialize_hex_opt")]
    raw_bytes: Option<Vec<u8>>,
    decoded: Option<DecodedValue>,
    error: Option<MemoryError>,
}

impl ScanEntry {
    /// Creates an entry whose bytes were re-read and decoded
    pub fn confirmed(address: Address, raw_bytes: Vec<u8>, decoded: DecodedValue) -> Self {
        ScanEntry {
            address,
            raw_bytes: Some(raw_bytes),
            decoded: Some(decoded),
            error: None,
        }
    }

    /// Creates an entry whose confirmation failed
    pub fn failed(address: Address, raw_bytes: Option<Vec<u8>>, error: MemoryError) -> Self {
        ScanEntry {
            address,
            raw_bytes,
            decoded: None,
            error: Some(error),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.raw_bytes.as_deref()
    }

    pub fn decoded(&self) -> Option<&DecodedValue> {
        self.decoded.as_ref()
    }

    pub fn error(&self) -> Option<&MemoryError> {
        self.error.as_ref()
    }

    pub fn is_confirmed(&self) -> bool {
        self.decoded.is_some()
    }
}

/// Aggregate counts over a scan's entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total: usize,
    pub confirmed: usize,
    pub failed: usize,
}

impl ScanSummary {
    pub fn from_entries(entries: &[ScanEntry]) -> Self {
        let confirmed = entries.iter().filter(|e| e.is_confirmed()).count();
        ScanSummary {
            total: entries.len(),
            confirmed,
            failed: entries.len() - confirmed,
        }
    }
}

/// Result of a single scan-and-confirm pass
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub pid: u32,
    /// 32-bit pattern that was scanned for
    pub target: u32,
    pub entries: Vec<ScanEntry>,
    pub summary: ScanSummary,
}

impl ScanReport {
    /// Creates a report, computing the summary from the entries
    pub fn new(pid: u32, target: u32, entries: Vec<ScanEntry>) -> Self {
        let summary = ScanSummary::from_entries(&entries);
        ScanReport {
            pid,
            target,
            entries,
            summary,
        }
    }

    /// First entry that decoded successfully, in scan order
    pub fn first_confirmed(&self) -> Option<&ScanEntry> {
        self.entries.iter().find(|e| e.is_confirmed())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bytes read from a single address plus their interpretations
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResult {
    pub address: Address,
    #[serde(serialize_with = "serialize_hex")]
    pub raw_bytes: Vec<u8>,
    /// Present when at least four bytes were read
    pub decoded: Option<DecodedValue>,
}

/// Outcome of an encode, write and read-back cycle.
///
/// `write_succeeded == false` means no read-back was attempted. A failed
/// read-back after a successful write is reported through `error`, never by
/// clearing `write_succeeded`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub address: Address,
    pub value_type: ValueType,
    #[serde(serialize_with = "serialize_hex")]
    pub written_bytes: Vec<u8>,
    pub write_succeeded: bool,
    pub read_back: Option<DecodedValue>,
    pub error: Option<MemoryError>,
}

impl VerificationRecord {
    /// True when the write landed and the read-back decoded
    pub fn is_verified(&self) -> bool {
        self.write_succeeded && self.read_back.is_some()
    }
}
