//! Slim command implementation.
//!
//! The slim command:
//! 1. Validates the input path and filter options
//! 2. Runs the streaming pipeline over the input
//! 3. Reports timing

use crate::filter::FilterConfig;
use crate::pipeline::{self, SlimOptions};
use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the slim command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct SlimArgs {
    /// Trace file to read (possibly compressed)
    pub input: PathBuf,

    /// Trace file to write (possibly compressed)
    pub output: PathBuf,

    /// Sampling period in microseconds
    pub sample: Option<i64>,

    /// Minimum duration in microseconds (strict greater-than)
    pub min_dur: Option<i64>,

    /// Join B/E pairs into single X events
    pub join: bool,

    /// Close unterminated B events at end-of-stream
    pub close: bool,

    /// Verify that matched B/E pairs have matching contents
    pub verify: bool,
}

impl SlimArgs {
    fn options(&self) -> SlimOptions {
        SlimOptions {
            input: self.input.clone(),
            output: self.output.clone(),
            filter: FilterConfig {
                sample: self.sample,
                min_dur: self.min_dur,
                join: self.join,
                close: self.close,
                verify: self.verify,
            },
        }
    }
}

/// Validate slim arguments before any stream is opened
///
/// **Public** - called before execute_slim for early validation
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &SlimArgs) -> Result<()> {
    let metadata = match fs::metadata(&args.input) {
        Ok(metadata) => metadata,
        Err(_) => anyhow::bail!("file \"{}\" not found", args.input.display()),
    };

    if metadata.is_dir() {
        anyhow::bail!("\"{}\" is a directory", args.input.display());
    }

    if args.output.as_os_str().is_empty() {
        anyhow::bail!("output path cannot be empty");
    }

    if let Some(sample) = args.sample {
        if sample <= 0 {
            anyhow::bail!("--sample must be a positive number of microseconds");
        }
    }

    if let Some(min_dur) = args.min_dur {
        if min_dur < 0 {
            anyhow::bail!("--min-dur cannot be negative");
        }
    }

    Ok(())
}

/// Execute the slim command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Input open/read failures
/// * Unrecovered parse errors
/// * Verification failures
/// * Output write failures
pub fn execute_slim(args: SlimArgs) -> Result<()> {
    let start_time = Instant::now();

    info!(
        "Slimming {} -> {}",
        args.input.display(),
        args.output.display()
    );
    debug!(
        "options: sample={:?} min_dur={:?} join={} close={} verify={}",
        args.sample, args.min_dur, args.join, args.close, args.verify
    );

    pipeline::run(&args.options())
        .with_context(|| format!("failed to process \"{}\"", args.input.display()))?;

    let elapsed = start_time.elapsed();
    info!("Completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}
