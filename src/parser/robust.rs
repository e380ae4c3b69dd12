//! Robust whole-document parse strategy.
//!
//! Drives `serde_json`'s incremental deserializer over the byte stream
//! and visits the top-level array one element at a time, so formatting
//! (multi-line objects, unusual whitespace) does not matter and memory
//! stays bounded by the largest single element. Each element is captured
//! as raw text first, so pass-through events keep their exact bytes.

use crate::parser::schema::{ParsedEvent, TraceEvent};
use crate::utils::error::{ParseError, PipelineError};
use serde::de::{self, SeqAccess, Visitor};
use serde_json::value::RawValue;
use std::fmt;
use std::io::Read;

/// Parse a top-level JSON array incrementally, handing each element to `sink`
///
/// **Public** - robust-mode entry point, called by the pipeline orchestrator
///
/// Errors raised by `sink` abort the parse and are returned as-is; they are
/// carried around the deserializer rather than through it, so their type
/// survives.
///
/// # Errors
/// * `PipelineError::Parse` - the document is not a well-formed array of
///   event objects, or has trailing content after the closing bracket
/// * anything `sink` returns, unchanged
pub fn parse_array<R, F>(reader: R, mut sink: F) -> Result<(), PipelineError>
where
    R: Read,
    F: FnMut(ParsedEvent) -> Result<(), PipelineError>,
{
    let mut failure = None;
    let mut deserializer = serde_json::Deserializer::from_reader(reader);

    let visitor = ElementVisitor {
        sink: &mut sink,
        failure: &mut failure,
    };

    match serde::de::Deserializer::deserialize_seq(&mut deserializer, visitor) {
        Ok(()) => {
            deserializer.end().map_err(ParseError::from)?;
            Ok(())
        }
        Err(err) => match failure {
            // The visitor bailed out; the stashed error is the real one
            Some(stashed) => Err(stashed),
            None => Err(ParseError::from(err).into()),
        },
    }
}

/// Visits the top-level array, decoding one element at a time.
struct ElementVisitor<'a, F> {
    sink: &'a mut F,
    failure: &'a mut Option<PipelineError>,
}

impl<'de, F> Visitor<'de> for ElementVisitor<'_, F>
where
    F: FnMut(ParsedEvent) -> Result<(), PipelineError>,
{
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a top-level array of trace events")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(raw) = seq.next_element::<Box<RawValue>>()? {
            let record: TraceEvent = match serde_json::from_str(raw.get()) {
                Ok(record) => record,
                Err(err) => {
                    *self.failure = Some(ParseError::from(err).into());
                    return Err(de::Error::custom("trace event rejected"));
                }
            };

            let event = ParsedEvent {
                record,
                json: raw.get().to_string(),
            };
            if let Err(err) = (self.sink)(event) {
                *self.failure = Some(err);
                return Err(de::Error::custom("event processing aborted"));
            }
        }
        Ok(())
    }
}
