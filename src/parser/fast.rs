//! Fast line-oriented parse strategy.
//!
//! Assumes one JSON value per line, the common shape of large dumps
//! (`[` and `]` on their own lines, one event per line with a trailing
//! comma). Each line is parsed independently, so memory use is bounded
//! by the longest line and the input need not be valid as a whole
//! document. When the assumption does not hold, the resulting parse
//! error makes the orchestrator restart with the robust strategy.

use crate::parser::schema::{ParsedEvent, TraceEvent};
use crate::utils::error::{ParseError, PipelineError};
use std::io::BufRead;

/// Parse the input line by line, handing each event to `sink`
///
/// **Public** - fast-mode entry point, called by the pipeline orchestrator
///
/// # Errors
/// * `PipelineError::Parse` - a line was not a single JSON event
/// * `PipelineError::Io` - the underlying read failed
/// * anything `sink` returns, unchanged
pub fn parse_lines<R, F>(mut reader: R, mut sink: F) -> Result<(), PipelineError>
where
    R: BufRead,
    F: FnMut(ParsedEvent) -> Result<(), PipelineError>,
{
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }

        let text = trim_line(&line);
        // Skip blanks and the array brackets on their own lines
        if text.len() <= 1 {
            continue;
        }

        let record: TraceEvent = serde_json::from_str(text).map_err(ParseError::from)?;
        sink(ParsedEvent {
            record,
            json: text.to_string(),
        })?;
    }
    Ok(())
}

/// Strip the line terminator and the element separator: `,\r\n`, `,\n`,
/// or either without the comma.
fn trim_line(line: &str) -> &str {
    let text = line.strip_suffix('\n').unwrap_or(line);
    let text = text.strip_suffix('\r').unwrap_or(text);
    text.strip_suffix(',').unwrap_or(text)
}
