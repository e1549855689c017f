//! Typed writes with read-back verification

use super::accessor::MemoryAccessor;
use super::codec;
use crate::core::types::{
    Address, MemoryError, MemoryResult, NumericValue, ProcessId, ValueType, VerificationRecord,
};
use tokio::task;
use tracing::{debug, info, warn};

/// Encodes, writes, then reads the value back.
///
/// The write primitive's own success flag is not trusted on its own; the
/// independent read-back is the check. The target keeps running, so the
/// read-back may already observe a newer value than the one written.
#[derive(Debug, Clone)]
pub struct WriteVerifier {
    accessor: MemoryAccessor,
}

impl WriteVerifier {
    pub fn new(accessor: MemoryAccessor) -> Self {
        WriteVerifier { accessor }
    }

    /// Writes `value` as `value_type` at `address`.
    ///
    /// Encoding failures are returned as `Err` before memory is touched. A
    /// failed write yields a record with `write_succeeded == false` and no
    /// read-back attempt.
    pub async fn write(
        &self,
        pid: ProcessId,
        address: Address,
        value_type: ValueType,
        value: NumericValue,
    ) -> MemoryResult<VerificationRecord> {
        let bytes = codec::encode(value_type, value)?;
        debug!(
            "Writing {} as {} at {}: {}",
            value,
            value_type,
            address,
            hex::encode(&bytes)
        );

        let accessor = self.accessor.clone();
        let data = bytes.clone();
        let written = task::spawn_blocking(move || accessor.write(pid, address, &data)).await?;

        if let Err(e) = written {
            warn!("Write of {} to {} failed: {}", value, address, e);
            return Ok(VerificationRecord {
                address,
                value_type,
                written_bytes: bytes,
                write_succeeded: false,
                read_back: None,
                error: Some(e),
            });
        }

        let accessor = self.accessor.clone();
        let width = value_type.width();
        let read = task::spawn_blocking(move || accessor.read(pid, address, width)).await?;

        let record = match read.and_then(|raw| codec::decode(value_type, &raw, 0)) {
            Ok(decoded) => {
                info!("Wrote {} to {}, read back {}", value, address, decoded.value);
                VerificationRecord {
                    address,
                    value_type,
                    written_bytes: bytes,
                    write_succeeded: true,
                    read_back: Some(decoded),
                    error: None,
                }
            }
            Err(e) => {
                warn!("Verification read at {} failed: {}", address, e);
                VerificationRecord {
                    address,
                    value_type,
                    written_bytes: bytes,
                    write_succeeded: true,
                    read_back: None,
                    error: Some(MemoryError::readback_failed(address, e.to_string())),
                }
            }
        };
        Ok(record)
    }
}
