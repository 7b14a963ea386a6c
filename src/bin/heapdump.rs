//! heapdump CLI
//!
//! Decodes kernel heap dumps and reports block adjacency and free-list health

use anyhow::Context;
use clap::{Parser, Subcommand};
use heapdump_rs::{
    AllocatorSignature, DecodeMode, HeapDump, HeapDumpBuilder, ReportPolicy, RowDump,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "heapdump")]
#[command(about = "Inspect kernel heap allocator dumps")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print the report as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a raw array of 32-byte records (heap.raw)
    Raw {
        #[arg(default_value = "output/heap.raw")]
        file: PathBuf,

        #[command(flatten)]
        decode: DecodeArgs,
    },

    /// Decode a framed serial capture (COM2.out)
    Serial {
        #[arg(default_value = "COM2.out")]
        file: PathBuf,

        #[command(flatten)]
        decode: DecodeArgs,
    },

    /// Analyze a CSV block list (alloc_out.csv)
    Rows {
        #[arg(default_value = "alloc_out.csv")]
        file: PathBuf,

        /// Report only the first adjacent neighbour of each block
        #[arg(long)]
        first_match: bool,
    },
}

#[derive(clap::Args, Debug)]
struct DecodeArgs {
    /// Allocator tag addresses must carry (none, test, nova, or hex) [default: per mode]
    #[arg(short, long)]
    signature: Option<String>,

    /// Fail if any two blocks overlap
    #[arg(long)]
    strict: bool,

    /// Report only the first adjacent neighbour of each block
    #[arg(long)]
    first_match: bool,
}

/// Parse signature from CLI string, `None` disabling the check
fn parse_signature(s: &str) -> anyhow::Result<Option<AllocatorSignature>> {
    match s.to_lowercase().as_str() {
        "none" | "off" => Ok(None),
        _ => Ok(Some(s.parse()?)),
    }
}

fn policy(first_match: bool) -> ReportPolicy {
    if first_match {
        ReportPolicy::FirstMatch
    } else {
        ReportPolicy::ReportBoth
    }
}

fn open_dump(mode: DecodeMode, file: &Path, args: &DecodeArgs) -> anyhow::Result<HeapDump> {
    let mut builder = HeapDumpBuilder::new()
        .mode(mode)
        .policy(policy(args.first_match));

    if let Some(signature) = &args.signature {
        builder = match parse_signature(signature)? {
            Some(signature) => builder.signature(signature),
            None => builder.without_signature(),
        };
    }
    if args.strict {
        builder = builder.strict_overlap();
    }

    builder
        .open(file)
        .with_context(|| format!("Failed to decode {}", file.display()))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = match &cli.command {
        Command::Raw { file, decode } => {
            let dump = open_dump(DecodeMode::RawArray, file, decode)?;
            info!("Decoded {} blocks from {}", dump.records().len(), dump.source());
            if cli.json {
                dump.to_json()?
            } else {
                dump.to_string()
            }
        }
        Command::Serial { file, decode } => {
            let dump = open_dump(DecodeMode::FramedSerial, file, decode)?;
            info!("Decoded {} blocks from {}", dump.records().len(), dump.source());
            if cli.json {
                dump.to_json()?
            } else {
                dump.to_string()
            }
        }
        Command::Rows { file, first_match } => {
            let dump = RowDump::open(file, policy(*first_match))
                .with_context(|| format!("Failed to read {}", file.display()))?;
            info!("Parsed {} rows from {}", dump.rows().len(), dump.source());
            if cli.json {
                dump.to_json()?
            } else {
                dump.to_string()
            }
        }
    };

    print!("{}", output);
    Ok(())
}
