//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use serde_json::error::Category;
use thiserror::Error;

/// Errors that can occur while parsing the input byte stream into events
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by B/E pair bookkeeping in the filter engine
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("verification error: no B event for {0}")]
    UnmatchedEnd(String),

    #[error("verification error: different {field:?} in {event}")]
    Mismatch { field: &'static str, event: String },

/*
    #[error("verification error: {0} events left open")]
    LeftOpen(usize),
*/
}

/// Errors that can occur while writing the output array
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write output: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("failed to serialize event: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Umbrella error for a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True when restarting with the full parser could succeed.
    ///
    /// Covers syntax errors, premature EOF, and lines that parsed as JSON
    /// but were not event objects (what the line splitter produces when the
    /// whole input is a single-line array). Underlying I/O failures are not
    /// a parse-strategy problem and never trigger a restart.
    pub fn wants_full_parse(&self) -> bool {
        match self {
            PipelineError::Parse(ParseError::Json(err)) => err.classify() != Category::Io,
            _ => false,
        }
    }
}
