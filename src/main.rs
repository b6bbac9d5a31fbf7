//! Mesh Node Registry replay tool
//!
//! Feeds a JSON-lines capture of decoded node updates through the registry
//! and prints the resulting node list.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mesh_node_registry::{
    replay_lines, NodeEvent, NodeRecord, NodeRegistry, NodeSortKey, RegistryConfig,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Output format for the final node list
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

/// Listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortArg {
    Number,
    LongName,
    ShortName,
    LastFix,
}

impl From<SortArg> for NodeSortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Number => NodeSortKey::Number,
            SortArg::LongName => NodeSortKey::LongName,
            SortArg::ShortName => NodeSortKey::ShortName,
            SortArg::LastFix => NodeSortKey::LastFix,
        }
    }
}

/// Mesh Node Registry - replay decoded node updates and list the result
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-lines file of decoded updates (stdin when omitted)
    #[arg(long, env = "REPLAY_INPUT")]
    input: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Sort order of the node list
    #[arg(long, value_enum, default_value = "number")]
    sort: SortArg,

    /// Broadcast channel capacity for event subscribers
    #[arg(long, env = "EVENT_CAPACITY", default_value = "1024")]
    event_capacity: usize,

    /// Accept partial updates without validating new records
    #[arg(long, env = "NO_VALIDATE")]
    no_validate: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting mesh node registry replay");
    info!("  Version: {}", mesh_node_registry::VERSION);

    let config = RegistryConfig {
        event_channel_capacity: args.event_capacity,
        validate_on_create: !args.no_validate,
    };
    let mut registry = NodeRegistry::with_config(config).context("invalid registry configuration")?;

    registry.subscribe(|event: &NodeEvent| {
        info!(node = %event.changed_number, kind = %event.change_kind, "node list changed");
    });

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin().lock())),
    };

    let summary = replay_lines(reader, &mut registry)?;
    info!(
        applied = summary.applied,
        rejected = summary.rejected,
        "Replay complete"
    );

    let nodes = registry.sorted(args.sort.into());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &nodes)?;
            writeln!(out)?;
        }
        OutputFormat::Table => write_table(&mut out, &nodes)?,
    }

    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout carries the node list
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .init();
    }
}

// =============================================================================
// Table Output
// =============================================================================

fn write_table(out: &mut impl Write, nodes: &[&NodeRecord]) -> io::Result<()> {
    writeln!(
        out,
        "{:<10} {:<16} {:<24} {:>11} {:>12} {:>6}  {}",
        "NODE", "ID", "NAME", "LAT", "LON", "ALT", "LAST FIX"
    )?;

    for record in nodes {
        let id = record.identity_id().unwrap_or("-");
        let name = record
            .identity
            .as_ref()
            .and_then(|identity| identity.display_name())
            .unwrap_or("-");
        let position = record.position.as_ref();
        let lat = position
            .and_then(|p| p.latitude())
            .map_or_else(|| "-".to_string(), |v| format!("{v:.5}"));
        let lon = position
            .and_then(|p| p.longitude())
            .map_or_else(|| "-".to_string(), |v| format!("{v:.5}"));
        let alt = position
            .and_then(|p| p.altitude)
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        let fix = position
            .and_then(|p| p.fix_time())
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());

        writeln!(
            out,
            "{:<10} {:<16} {:<24} {:>11} {:>12} {:>6}  {}",
            record.number.to_string(),
            id,
            name,
            lat,
            lon,
            alt,
            fix
        )?;
    }
    Ok(())
}
