//! Scan confirmation tests against the simulated backend

use memory_trainer::config::Config;
use memory_trainer::core::types::*;
use memory_trainer::{MemoryOperations, SimulatedMemory, SimulatedProcess};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::{Duration, Instant};

const PID: ProcessId = 4242;

fn process_with(values: &[(u64, u32)]) -> SimulatedProcess {
    let mut memory = vec![0u8; 0x3000];
    for &(address, value) in values {
        let offset = address as usize;
        memory[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
    SimulatedProcess::new(PID, "Project64.exe").with_region(0, memory)
}

fn setup(process: SimulatedProcess) -> (Arc<SimulatedMemory>, MemoryOperations) {
    let sim = Arc::new(SimulatedMemory::new().with_process(process));
    let ops = MemoryOperations::new(sim.clone(), &Config::default()).unwrap();
    (sim, ops)
}

#[tokio::test]
async fn test_partial_failure_isolation() {
    let (a, b, c) = (0x100u64, 0x200u64, 0x300u64);
    let (sim, ops) = setup(process_with(&[(a, 7), (b, 7), (c, 7)]));
    sim.script_scan(vec![Address::new(a), Address::new(b), Address::new(c)]);
    sim.fail_reads_at(b);

    let report = ops.scan(PID, 7).await.unwrap();

    assert_eq!(report.entries.len(), 3);
    assert!(report.entries[0].decoded().is_some());
    assert!(report.entries[0].error().is_none());
    assert!(report.entries[1].decoded().is_none());
    assert_eq!(report.entries[1].error().unwrap().kind(), ErrorKind::Read);
    assert!(report.entries[2].decoded().is_some());
    assert_eq!(
        report.summary,
        ScanSummary {
            total: 3,
            confirmed: 2,
            failed: 1
        }
    );
}

#[tokio::test]
async fn test_confirmed_values_are_not_refiltered() {
    let (sim, ops) = setup(process_with(&[(0x1000, 1234), (0x2000, 9999)]));
    sim.script_scan(vec![Address::new(0x1000), Address::new(0x2000)]);

    let report = ops.scan(PID, 1234).await.unwrap();

    assert_eq!(report.entries.len(), 2);
    let first = &report.entries[0];
    assert_eq!(first.address(), Address::new(0x1000));
    assert_eq!(first.decoded().unwrap().as_int32, Some(1234));
    assert!(first.error().is_none());

    let second = &report.entries[1];
    assert_eq!(second.address(), Address::new(0x2000));
    assert_eq!(second.decoded().unwrap().as_int32, Some(9999));
    assert!(second.error().is_none());
}

#[tokio::test]
async fn test_empty_candidate_set() {
    let (sim, ops) = setup(process_with(&[]));
    sim.script_scan(Vec::new());

    let report = ops.scan(PID, 1234).await.unwrap();
    assert!(report.is_empty());
    assert_eq!(report.summary, ScanSummary::default());
    assert_eq!(sim.read_count(), 0);
}

#[tokio::test]
async fn test_address_zero_and_value_zero() {
    let (sim, ops) = setup(process_with(&[]));
    sim.script_scan(vec![Address::new(0), Address::new(4)]);

    let report = ops.scan(PID, 0).await.unwrap();
    assert_eq!(report.target, 0);
    assert_eq!(report.entries[0].address(), Address::null());
    assert_eq!(report.entries[0].decoded().unwrap().as_uint32, Some(0));
    assert_eq!(report.entries[0].raw_bytes(), Some(&[0u8, 0, 0, 0][..]));
    assert_eq!(report.summary.confirmed, 2);
}

#[tokio::test]
async fn test_real_scan_of_zero_value_includes_address_zero() {
    let sim = Arc::new(SimulatedMemory::new().with_process(
        SimulatedProcess::new(PID, "pj64").with_region(0, vec![0, 0, 0, 0, 1, 0, 0, 0]),
    ));
    let ops = MemoryOperations::new(sim, &Config::default()).unwrap();

    let report = ops.scan(PID, 0).await.unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].address(), Address::new(0));
}

#[tokio::test]
async fn test_short_confirmation_read_is_an_entry_error() {
    let (sim, ops) = setup(process_with(&[(0x100, 5)]));
    sim.script_scan(vec![Address::new(0x100), Address::new(0x2FFE)]);
    sim.short_reads_at(0x100, 3);

    let report = ops.scan(PID, 5).await.unwrap();
    assert_eq!(report.summary.failed, 2);
    for entry in &report.entries {
        assert!(entry.decoded().is_none());
        assert_eq!(entry.error().unwrap().kind(), ErrorKind::Read);
    }
}

#[tokio::test]
async fn test_order_preserved_under_latency() {
    let addresses: Vec<u64> = (0..8).map(|i| 0x100 + i * 0x10).collect();
    let values: Vec<(u64, u32)> = addresses.iter().map(|&a| (a, a as u32)).collect();
    let (sim, ops) = setup(process_with(&values));

    sim.script_scan(addresses.iter().copied().map(Address::new).collect());
    sim.delay_reads_at(addresses[0], Duration::from_millis(150));
    sim.delay_reads_at(addresses[3], Duration::from_millis(75));
    sim.fail_reads_at(addresses[5]);

    let report = ops.scan(PID, 0).await.unwrap();

    let order: Vec<u64> = report.entries.iter().map(|e| e.address().as_u64()).collect();
    assert_eq!(order, addresses);
    for (entry, &address) in report.entries.iter().zip(&addresses) {
        if address == addresses[5] {
            assert!(entry.error().is_some());
        } else {
            assert_eq!(entry.decoded().unwrap().as_uint32, Some(address as u32));
        }
    }
}

#[tokio::test]
async fn test_confirmation_reads_run_concurrently() {
    let addresses: Vec<u64> = (0..4).map(|i| 0x100 + i * 4).collect();
    let sim = Arc::new(SimulatedMemory::new().with_process(process_with(&[])));
    sim.script_scan(addresses.iter().copied().map(Address::new).collect());
    for &address in &addresses {
        sim.delay_reads_at(address, Duration::from_millis(200));
    }

    let mut config = Config::default();
    config.scanner.max_concurrency = 4;
    let ops = MemoryOperations::new(sim, &config).unwrap();

    let start = Instant::now();
    let report = ops.scan(PID, 0).await.unwrap();
    assert_eq!(report.summary.confirmed, 4);
    // Four sequential reads would take 800ms
    assert!(start.elapsed() < Duration::from_millis(700));
}

#[tokio::test]
async fn test_enrichment_failure_leaves_report_intact() {
    let (sim, ops) = setup(process_with(&[(0x2FF8, 11)]));
    sim.script_scan(vec![Address::new(0x2FF8)]);

    let report = ops.scan(PID, 11).await.unwrap();
    assert_eq!(report.summary.confirmed, 1);

    // 16 bytes from 0x2FF8 run past the end of the region
    let detail = ops.enrich_first(PID, &report).await.unwrap();
    assert_eq!(detail.unwrap_err().kind(), ErrorKind::Read);
    assert_eq!(report.summary.confirmed, 1);
    assert!(report.entries[0].decoded().is_some());
}

#[tokio::test]
async fn test_scan_report_serializes_per_entry_outcomes() {
    let (sim, ops) = setup(process_with(&[(0x100, 0xDEADBEEF)]));
    sim.script_scan(vec![Address::new(0x100), Address::new(0x9000)]);

    let report = ops.scan(PID, 0xDEADBEEF).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries[0]["decoded"]["hexUInt32"], "0xDEADBEEF");
    assert_eq!(entries[0]["rawBytes"], "efbeadde");
    assert!(entries[0].get("error").map_or(true, |e| e.is_null()));
    assert_eq!(entries[1]["error"]["kind"], "read_failed");
    assert_eq!(json["summary"]["failed"], 1);
}
