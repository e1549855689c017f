use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use memory_trainer::config::{
    validate_config, Config, ConfigLoader, LoggingConfig, DEFAULT_CONFIG_FILE,
};
use memory_trainer::memory::codec;
use memory_trainer::{
    Address, MemoryError, MemoryOperations, ProcessId, ReadResult, ScanReport, SimulatedMemory,
    ValueType,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "memory-trainer", version)]
#[command(about = "Scan, decode and verified-write tool for emulator memory", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Target PID; located by name when omitted
    #[arg(short, long, global = true)]
    pid: Option<ProcessId>,

    /// Run against a built-in simulated emulator
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List running processes
    Processes,

    /// Find the target process by name
    Locate {
        /// Keep polling for up to SECS seconds
        #[arg(long, value_name = "SECS")]
        wait: Option<u64>,
    },

    /// Scan for a 32-bit value and confirm every match
    Scan {
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Skip the detail read of the first confirmed address
        #[arg(long)]
        no_detail: bool,
    },

    /// Read raw bytes
    Read { address: Address, size: usize },

    /// Write a typed value and read it back
    Write {
        address: Address,
        #[arg(value_name = "TYPE")]
        value_type: ValueType,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

#[derive(Serialize)]
struct ScanOutput<'a> {
    report: &'a ScanReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<ReadResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail_error: Option<MemoryError>,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => ConfigLoader::new(path)
            .load()
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::new(DEFAULT_CONFIG_FILE).load_or_default()?,
    };
    validate_config(&config)?;
    Ok(config)
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn target_pid(ops: &MemoryOperations, pid: Option<ProcessId>) -> Result<ProcessId> {
    match pid {
        Some(pid) => Ok(pid),
        None => Ok(ops.locate().await?.pid),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    init_logging(&config.logging);

    info!("Starting Memory-Trainer v{}", env!("CARGO_PKG_VERSION"));

    let ops = if args.simulate {
        MemoryOperations::new(Arc::new(SimulatedMemory::demo()), &config)?
    } else {
        MemoryOperations::platform(&config)?
    };
    info!("Memory backend: {}", ops.accessor().backend_name());

    match args.command {
        Command::Processes => {
            print_json(&ops.list_processes().await?)?;
        }

        Command::Locate { wait } => {
            let process = match wait {
                Some(secs) => {
                    let locator = ops.locator();
                    locator
                        .wait(locator.poll_interval(), Duration::from_secs(secs))
                        .await?
                }
                None => ops.locate().await?,
            };
            print_json(&process)?;
        }

        Command::Scan { value, no_detail } => {
            let value = codec::parse_number(&value)?;
            let pid = target_pid(&ops, args.pid).await?;
            let report = ops.scan_value(pid, value).await?;

            let (detail, detail_error) = if no_detail {
                (None, None)
            } else {
                match ops.enrich_first(pid, &report).await {
                    Some(Ok(detail)) => (Some(detail), None),
                    Some(Err(e)) => (None, Some(e)),
                    None => (None, None),
                }
            };

            print_json(&ScanOutput {
                report: &report,
                detail,
                detail_error,
            })?;
        }

        Command::Read { address, size } => {
            let pid = target_pid(&ops, args.pid).await?;
            print_json(&ops.read_typed(pid, address, size).await?)?;
        }

        Command::Write {
            address,
            value_type,
            value,
        } => {
            let value = codec::parse_number(&value)?;
            let pid = target_pid(&ops, args.pid).await?;
            let record = ops.write_typed(pid, address, value_type, value).await?;
            print_json(&record)?;

            if !record.is_verified() {
                warn!("Write to {} was not verified", address);
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
