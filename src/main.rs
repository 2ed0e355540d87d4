//! Capture Log Filter - a capture buffer log filter for audio developers.
//!
//! Reads visualizer capture buffer log lines, extracts read or write event
//! records, normalizes their timestamps against a reference offset, and
//! prints one record per line.

mod core;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;

use crate::core::filter::{FilterOptions, FilterSummary, OutputFormat, run_filter};
use crate::core::parser::Mode;

#[derive(Debug, Parser)]
#[command(
    version,
    about = "Extract read/write records from visualizer capture buffer logs"
)]
struct Args {
    /// Record kind to extract: R (buffer reads) or W (buffer writes)
    #[arg(value_parser = Mode::from_str)]
    mode: Mode,

    /// Reference timestamp subtracted from every emitted time value, in seconds
    #[arg(allow_negative_numbers = true)]
    offset_time: f64,

    /// Maximum number of records to emit; 0 or negative means unlimited
    #[arg(allow_negative_numbers = true)]
    max_count: i64,

    /// Read log lines from a file instead of standard input
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Emit records as JSON lines instead of tab-separated fields
    #[arg(long)]
    json: bool,

    /// Print a processing summary to standard error when done
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut options = FilterOptions::new(args.mode, args.offset_time, args.max_count);
    if args.json {
        options.format = OutputFormat::Json;
    }

    let stdout = io::stdout().lock();
    let summary = match &args.input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            run_filter(&options, BufReader::new(file), stdout)?
        }
        None => run_filter(&options, io::stdin().lock(), stdout)?,
    };

    if args.verbose {
        report(&args, &summary);
    }

    Ok(())
}

/// Write the run summary to standard error, keeping stdout records-only.
fn report(args: &Args, summary: &FilterSummary) {
    eprintln!(
        "[{}] {} lines read, {} records emitted, {} flagged lines skipped",
        args.mode.tag(),
        summary.lines_read,
        summary.emitted,
        summary.flagged
    );
}
