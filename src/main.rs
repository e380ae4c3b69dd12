//! Trace Slim CLI
//!
//! Reduces large Chrome Trace Event dumps by filtering, sampling, and
//! collapsing paired B/E events, streaming the result back out as valid
//! JSON, optionally through gzip/brotli (de)compression.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;

use trace_slim::commands::{execute_slim, validate_args, SlimArgs};

/// Trace Slim - preprocess tracing dumps
#[derive(Parser, Debug)]
#[command(name = "trace-slim")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Trace JSON file to read (possibly compressed: .gz, .br)
    input: PathBuf,

    /// Trace JSON file to write (possibly compressed: .gz, .br)
    output: PathBuf,

    /// Sample events at this frequency (microseconds)
    #[arg(short, long)]
    sample: Option<i64>,

    /// Filter events with this minimum duration (microseconds)
    #[arg(short, long)]
    min_dur: Option<i64>,

    /// Join B/E events to a single X event
    #[arg(short, long)]
    join: bool,

    /// Close unterminated B events at the end
    #[arg(short, long)]
    close: bool,

    /// Verify B/E events have matching contents
    #[arg(short, long)]
    verify: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let args = SlimArgs {
        input: cli.input,
        output: cli.output,
        sample: cli.sample,
        min_dur: cli.min_dur,
        join: cli.join,
        close: cli.close,
        verify: cli.verify,
    };

    // Validate args first
    validate_args(&args)?;

    // Execute the single forward pass
    execute_slim(args)?;

    Ok(())
}
