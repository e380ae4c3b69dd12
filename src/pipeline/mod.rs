//! Pipeline orchestrator.
//!
//! Wires decompression -> parser -> filter engine -> array writer ->
//! compression into one forward pass, and owns the fast-to-robust retry:
//! the fast line-oriented strategy is tried first, and if it trips over
//! input it cannot line-split, the whole pipeline is restarted from the
//! beginning of the file with the full parser. The restart happens at
//! most once; robust-mode failures propagate.
//!
//! Every attempt constructs its streams, engine, and writer fresh, so a
//! restart never sees state from the failed pass.

use crate::codec::{self, InputStream};
use crate::filter::{FilterConfig, FilterEngine};
use crate::output::ArrayWriter;
use crate::parser::schema::ParsedEvent;
use crate::parser::{fast, robust};
use crate::utils::error::PipelineError;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Parse strategy for one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// Line-oriented, assumes one JSON value per line
    Fast,
    /// Incremental whole-document parse, no line assumptions
    Robust,
}

/// Everything one run needs: resolved paths plus filter configuration
#[derive(Debug, Clone)]
pub struct SlimOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub filter: FilterConfig,
}

/// Run the pipeline, retrying once with the full parser if needed
///
/// **Public** - main entry point, called by the command layer
///
/// # Errors
/// Any parse, verification, or I/O error that survives the single retry.
/// Partially written output is left in place.
pub fn run(options: &SlimOptions) -> Result<(), PipelineError> {
    info!("Processing...");

    let strategy = initial_strategy(&options.input)?;
    match run_attempt(options, strategy) {
        Err(err) if strategy == ParseStrategy::Fast && err.wants_full_parse() => {
            info!("  (retrying with the full parser)");
            debug!("fast parse failed: {}", err);
            run_attempt(options, ParseStrategy::Robust)?;
        }
        Err(err) => return Err(err),
        Ok(()) => {}
    }

    info!("Done.");
    Ok(())
}

/// Pick the starting strategy. A non-regular file (a pipe, say) cannot be
/// re-read for the retry, so it goes straight to the full parser.
fn initial_strategy(input: &Path) -> Result<ParseStrategy, PipelineError> {
    let metadata = fs::metadata(input)?;
    if metadata.is_file() {
        Ok(ParseStrategy::Fast)
    } else {
        info!("  (input is not a plain file => full parse only)");
        Ok(ParseStrategy::Robust)
    }
}

/// One complete pass over the input with the given strategy.
fn run_attempt(options: &SlimOptions, strategy: ParseStrategy) -> Result<(), PipelineError> {
    debug!(
        "{:?} pass: {} -> {}",
        strategy,
        options.input.display(),
        options.output.display()
    );

    let InputStream { reader, progress } = codec::open_input(&options.input)?;
    let output = codec::open_output(&options.output)?;
    let mut engine = FilterEngine::new(options.filter.clone());
    let mut writer = ArrayWriter::new(output);

    let parsed = {
        let mut sink = |event: ParsedEvent| -> Result<(), PipelineError> {
            if let Some(emit) = engine.decide(event)? {
                writer.write_event(&emit)?;
            }
            Ok(())
        };
        match strategy {
            ParseStrategy::Fast => fast::parse_lines(reader, &mut sink),
            ParseStrategy::Robust => robust::parse_array(reader, &mut sink),
        }
    };

    if let Err(err) = parsed {
        if strategy == ParseStrategy::Robust && matches!(err, PipelineError::Parse(_)) {
            warn!("input appears truncated {}", progress.describe());
        }
        return Err(err);
    }

    for emit in engine.finish() {
        writer.write_event(&emit)?;
    }
    writer.finish()?.finish()?;
    Ok(())
}
