//! dmsift - parallel field extractor and filter for baseband diagnostic
//! XML logs
//!
//! # Usage
//!
//! ```bash
//! # Extract RRC events and PDCP sizes from two captures
//! dmsift --extract rrc_ota,pdcp_cipher_data_pdu first.xml second.xml
//!
//! # Keep only records inside the ranges listed in ranges.txt
//! dmsift --range ranges.txt capture.xml -o filtered.xml
//!
//! # Drop records that go back in time, reading from stdin
//! dmsift --dedup < capture.xml
//! ```
//!
//! Output order always matches input order, whatever `-j` says.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dmsift_actions::{build_pipeline, parse_time_ranges, ExecContext, Mode};
use dmsift_pipeline::{Engine, EngineError, InputSource, DEFAULT_WORKER_THREADS};

/// Parallel field extractor and filter for baseband diagnostic XML logs
#[derive(Parser, Debug)]
#[command(name = "dmsift")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input log files; reads standard input when none are given
    inputs: Vec<PathBuf>,

    /// Number of extractor worker threads (1..=256)
    #[arg(short = 'j', long = "thread", value_name = "N", default_value_t = DEFAULT_WORKER_THREADS)]
    threads: usize,

    /// Output file; defaults to standard output
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(flatten)]
    mode: ModeArgs,
}

/// Mode selection: exactly one is required.
#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
struct ModeArgs {
    /// Comma-separated extractor names (e.g. rrc_ota,all_packet_type)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    extract: Option<Vec<String>>,

    /// File of inclusive "START END" unix-second ranges; echo records inside
    #[arg(long, value_name = "PATH")]
    range: Option<PathBuf>,

    /// Echo only records whose timestamp is not older than the newest seen
    #[arg(long)]
    dedup: bool,

    /// Re-sort records by timestamp within the given tolerance
    #[arg(long, value_name = "MICROS")]
    reorder: Option<i64>,

    /// Echo records whose type fully matches the regex
    #[arg(long = "type-filter", value_name = "REGEX")]
    type_filter: Option<String>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mode = resolve_mode(&cli.mode)?;
    let inputs = open_inputs(&cli.inputs)?;
    let output = open_output(cli.output.as_ref())?;

    let context = match &mode {
        Mode::Reorder { tolerance_micros } => {
            ExecContext::with_reorder(output, *tolerance_micros)?
        }
        _ => ExecContext::new(output),
    };
    let pipeline = build_pipeline(mode)?;

    let context = Engine::new(cli.threads, inputs, pipeline, context)?.run()?;
    context.finish()?;
    Ok(())
}

fn resolve_mode(args: &ModeArgs) -> Result<Mode> {
    if let Some(names) = &args.extract {
        return Ok(Mode::Extract(names.clone()));
    }
    if let Some(path) = &args.range {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::argument(format!(
                "failed to read range file \"{}\": {e}",
                path.display()
            ))
        })?;
        return Ok(Mode::Range(parse_time_ranges(&text)?));
    }
    if args.dedup {
        return Ok(Mode::Dedup);
    }
    if let Some(tolerance_micros) = args.reorder {
        return Ok(Mode::Reorder { tolerance_micros });
    }
    if let Some(pattern) = &args.type_filter {
        return Ok(Mode::TypeFilter(pattern.clone()));
    }
    // clap enforces the mode group; this is unreachable through the CLI.
    bail!("no mode selected");
}

fn open_inputs(paths: &[PathBuf]) -> Result<Vec<InputSource>> {
    if paths.is_empty() {
        return Ok(vec![InputSource::new("stdin", Box::new(io::stdin()))]);
    }
    paths
        .iter()
        .map(|path| {
            let file = File::open(path).map_err(|e| {
                EngineError::argument(format!(
                    "failed to open input file \"{}\": {e}",
                    path.display()
                ))
            })?;
            Ok(InputSource::new(
                path.display().to_string(),
                Box::new(file),
            ))
        })
        .collect()
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write + Send>> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                EngineError::argument(format!(
                    "failed to open output file \"{}\": {e}",
                    path.display()
                ))
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .with(filter)
        .init();

    Ok(())
}
