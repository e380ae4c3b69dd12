//! Event record definitions.
//!
//! A trace event is a small set of typed fields the pipeline inspects,
//! plus an open bag of everything else, preserved verbatim so untouched
//! events survive the trip unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record of a Chrome Trace Event Format dump
///
/// Only `ph`, `ts`, `dur`, `cat`, `name`, and `args` are ever inspected;
/// the flattened `extra` map carries all remaining fields through
/// serialization untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Phase tag: B (begin), E (end), X (complete), I/M (instant/metadata)
    #[serde(default)]
    pub ph: String,

    /// Timestamp in microseconds
    #[serde(default)]
    pub ts: i64,

    /// Duration in microseconds, present on X events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dur: Option<i64>,

    /// Event category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<String>,

    /// Event name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Arbitrary per-event arguments, compared structurally by --verify
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,

    /// All other fields, passed through opaquely
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TraceEvent {
    pub fn is_begin(&self) -> bool {
        self.ph == "B"
    }

    pub fn is_end(&self) -> bool {
        self.ph == "E"
    }

    /// Effective end time: `ts + dur` when a duration is present, else `ts`
    pub fn end_time(&self) -> i64 {
        match self.dur {
            Some(dur) => self.ts.saturating_add(dur),
            None => self.ts,
        }
    }
}

/// A decoded event together with the exact source text it came from
///
/// **Public** - the unit of work flowing from parser to filter engine
#[derive(Debug, Clone)]
pub struct ParsedEvent {
    /// Decoded record, used for all filtering decisions
    pub record: TraceEvent,

    /// The element's JSON source text, emitted byte-for-byte when the
    /// event passes through unmodified
    pub json: String,
}
