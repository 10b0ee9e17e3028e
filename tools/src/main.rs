use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use srt_tools::{
    decode_packet_json, format_decode_pretty, inspect_packet, load_limits, read_packet_bytes,
    InspectReport, LimitsConfig,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "srt-tools",
    version,
    about = "SRT packet inspection and decoding tools"
)]
struct Cli {
    /// Limits JSON applied while decoding.
    #[arg(long, global = true)]
    limits: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect packet headers and sizes.
    Inspect {
        /// Path to a packet file or a directory of packets.
        packet_path: PathBuf,
        /// Packet files hold hex text instead of raw bytes.
        #[arg(long)]
        hex: bool,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected packets.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected packets (after sorting).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Decode a packet into structured JSON.
    Decode {
        /// Path to the packet bytes.
        packet_file: PathBuf,
        /// Packet file holds hex text instead of raw bytes.
        #[arg(long)]
        hex: bool,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let limits = match &cli.limits {
        Some(path) => load_limits(path)?,
        None => LimitsConfig::default(),
    };

    match cli.command {
        Command::Inspect {
            packet_path,
            hex,
            glob,
            sort,
            limit,
        } => {
            if packet_path.is_dir() {
                let entries = collect_packet_entries(&packet_path, glob.as_deref())?;
                let mut entries = maybe_sort_entries(entries, sort);
                let limit = limit.or(sort.map(|InspectSort::Size| 10));
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                info!(count = entries.len(), dir = %packet_path.display(), "inspecting packets");
                let mut failed = 0usize;
                for entry in entries {
                    println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                    match inspect_file(&entry.path, hex, &limits) {
                        Ok(report) => print_inspect_report(&report),
                        Err(err) => {
                            failed += 1;
                            warn!(path = %entry.path.display(), "{err:#}");
                            println!("error: {err:#}");
                        }
                    }
                }
                if failed > 0 {
                    warn!(failed, "some packets failed to decode");
                }
            } else {
                let report = inspect_file(&packet_path, hex, &limits)?;
                print_inspect_report(&report);
            }
        }
        Command::Decode {
            packet_file,
            hex,
            format,
        } => {
            let bytes = read_packet_file(&packet_file, hex)?;
            let output = decode_packet_json(&bytes, &limits.wire, &limits.codec)?;
            match format {
                DecodeFormat::Json => {
                    let json = serde_json::to_string_pretty(&output).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => {
                    println!("{}", format_decode_pretty(&output));
                }
            }
        }
    }
    Ok(())
}

fn read_packet_file(path: &Path, hex: bool) -> Result<Vec<u8>> {
    let raw = fs::read(path).with_context(|| format!("read packet {}", path.display()))?;
    let bytes = read_packet_bytes(&raw, hex)
        .with_context(|| format!("read packet {}", path.display()))?;
    debug!(path = %path.display(), len = bytes.len(), "read packet");
    Ok(bytes)
}

fn inspect_file(path: &Path, hex: bool, limits: &LimitsConfig) -> Result<InspectReport> {
    let bytes = read_packet_file(path, hex)?;
    inspect_packet(&bytes, &limits.wire, &limits.codec)
}

struct PacketEntry {
    path: PathBuf,
    size: u64,
}

fn collect_packet_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<PacketEntry>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                debug!(path = %path.display(), "skipped by glob");
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(PacketEntry { path, size });
    }
    Ok(entries)
}

fn maybe_sort_entries(
    mut entries: Vec<PacketEntry>,
    sort: Option<InspectSort>,
) -> Vec<PacketEntry> {
    match sort {
        Some(InspectSort::Size) => {
            entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        }
        None => {}
    }
    entries
}

fn print_inspect_report(report: &InspectReport) {
    println!(
        "{} packet: {} bytes (body {} bytes)",
        report.kind, report.total_len, report.body_len
    );
    println!(
        "timestamp: {} destination: {}",
        report.timestamp, report.destination_id
    );
    println!("{}", report.headline);
    for line in &report.details {
        println!("  {line}");
    }
}
