//! End-to-end tests over the demo session and a config file on disk

use memory_trainer::config::{validate_config, ConfigLoader};
use memory_trainer::core::types::*;
use memory_trainer::memory::codec;
use memory_trainer::{MemoryOperations, SimulatedMemory};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn demo_with_config(contents: &str) -> MemoryOperations {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("memory-trainer.toml");
    fs::write(&path, contents).unwrap();

    let config = ConfigLoader::new(&path).load().unwrap();
    validate_config(&config).unwrap();
    MemoryOperations::new(Arc::new(SimulatedMemory::demo()), &config).unwrap()
}

#[tokio::test]
async fn test_locate_scan_enrich_write_cycle() {
    let ops = demo_with_config("");

    let target = ops.locate().await.unwrap();
    assert_eq!(target.pid, 4242);

    let value = codec::parse_number("1234").unwrap();
    let report = ops.scan_value(target.pid, value).await.unwrap();
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.confirmed, 2);

    let detail = ops.enrich_first(target.pid, &report).await.unwrap().unwrap();
    assert_eq!(detail.address, Address::new(0x8000_0010));
    assert_eq!(detail.raw_bytes.len(), 16);
    assert_eq!(detail.decoded.unwrap().as_int64, Some(1234));

    let record = ops
        .write_typed(target.pid, detail.address, ValueType::Int32, NumericValue::Integer(5000))
        .await
        .unwrap();
    assert!(record.is_verified());

    let rescan = ops.scan_value(target.pid, value).await.unwrap();
    assert_eq!(rescan.summary.total, 1);
    assert_eq!(rescan.entries[0].address(), Address::new(0x8000_0200));
}

#[tokio::test]
async fn test_float_value_found_by_read() {
    let ops = demo_with_config("");
    let decoded = ops
        .read_value(4242, Address::new(0x8000_0800), ValueType::Float32)
        .await
        .unwrap();
    assert_eq!(decoded.value, TypedValue::Float32(100.0));
    assert_eq!(decoded.hex_uint32.as_deref(), Some("0x42C80000"));
}

#[tokio::test]
async fn test_configured_fragments_drive_location() {
    let ops = demo_with_config(
        r#"
        [target]
        process_fragments = ["mupen64"]
        "#,
    );
    let err = ops.locate().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Process);

    let ops = demo_with_config(
        r#"
        [target]
        process_fragments = ["INIT"]
        "#,
    );
    assert_eq!(ops.locate().await.unwrap().pid, 1);
}

#[tokio::test]
async fn test_configured_read_limit() {
    let ops = demo_with_config(
        r#"
        [memory]
        max_read_size = 64

        [scanner]
        detail_read_size = 32
        "#,
    );

    assert!(ops.read_typed(4242, Address::new(0x8000_0000), 64).await.is_ok());
    let err = ops
        .read_typed(4242, Address::new(0x8000_0000), 65)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        MemoryError::RequestTooLarge {
            requested: 65,
            maximum: 64
        }
    );

    let report = ops.scan(4242, 9999).await.unwrap();
    let detail = ops.enrich_first(4242, &report).await.unwrap().unwrap();
    assert_eq!(detail.raw_bytes.len(), 32);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    fs::write(&path, "[scanner]\nmax_concurrency = 0\n").unwrap();

    let config = ConfigLoader::new(&path).load().unwrap();
    assert!(validate_config(&config).is_err());
}

#[tokio::test]
async fn test_scan_for_missing_process_is_a_scan_error() {
    let ops = demo_with_config("");
    let err = ops.scan(9, 1234).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Scan);
}
