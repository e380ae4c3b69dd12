//! Stateful filter/join engine.
//!
//! This module is the heart of the pipeline. Per event it decides:
//! - whether a B/E pair is tracked on the open-event stack
//! - whether a matched pair is collapsed into a single X event
//! - whether an event survives the sampling and minimum-duration filters
//!
//! At end-of-stream it drains whatever is still open, synthesizing end
//! events when requested.
//!
//! Pairing is structural, not semantic: an E event always closes the most
//! recently opened B regardless of content. `verify` flags content
//! mismatches in such a pair, it never re-pairs by name.

use crate::parser::schema::{ParsedEvent, TraceEvent};
use crate::utils::error::VerifyError;
use log::{debug, warn};

/// Filtering and joining options for one pipeline run
///
/// **Public** - constructed by the command layer from CLI flags
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Keep duration events only if a multiple of this period (microseconds)
    /// falls inside their interval
    pub sample: Option<i64>,

    /// Keep duration events only if strictly longer than this (microseconds)
    pub min_dur: Option<i64>,

    /// Collapse matched B/E pairs into single X events
    pub join: bool,

    /// Close B events still open at end-of-stream
    pub close: bool,

    /// Check that matched B/E pairs agree on cat, name, and args
    pub verify: bool,
}

impl FilterConfig {
    /// True when B/E events are tracked on the stack at all. With none of
    /// `join`/`close`/`verify` requested, B and E pass through like
    /// instants.
    pub fn manages_pairs(&self) -> bool {
        self.join || self.close || self.verify
    }
}

/// One output representation leaving the engine
///
/// Pass-through events carry their exact source text; synthesized events
/// are serialized fresh by the sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Emit {
    Raw(String),
    Event(TraceEvent),
}

/// The stateful engine: open-event stack plus running high-water mark
pub struct FilterEngine {
    config: FilterConfig,
    stack: Vec<TraceEvent>,
    last_time: i64,
}

impl FilterEngine {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            stack: Vec::new(),
            last_time: 0,
        }
    }

    /// Decide what to emit for one event
    ///
    /// **Public** - called once per parsed event, in stream order
    ///
    /// # Errors
    /// * `VerifyError::UnmatchedEnd` - an E event arrived on an empty stack
    /// * `VerifyError::Mismatch` - `verify` found a differing field in a
    ///   matched pair
    pub fn decide(&mut self, event: ParsedEvent) -> Result<Option<Emit>, VerifyError> {
        let ParsedEvent { record, json } = event;

        if self.config.close {
            self.observe(&record);
        }

        if self.config.manages_pairs() && (record.is_begin() || record.is_end()) {
            return self.pair(record, json);
        }

        Ok(self.admit(record, json))
    }

    /// Drain the stack at end-of-stream
    ///
    /// **Public** - called exactly once, after the input is exhausted
    ///
    /// With `close`, open events are closed at the high-water mark, most
    /// recently opened first. Without it, survivors are dropped with a
    /// diagnostic count.
    pub fn finish(&mut self) -> Vec<Emit> {
        let mut tail = Vec::new();
        if self.config.close {
            if !self.stack.is_empty() {
                debug!(
                    "closing {} unterminated B events at ts {}",
                    self.stack.len(),
                    self.last_time
                );
            }
            let end = self.last_time;
            while let Some(open) = self.stack.pop() {
                if self.config.join {
                    if let Some(emit) = self.complete(open, end) {
                        tail.push(emit);
                    }
                } else {
                    let mut record = open;
                    record.ph = "E".to_string();
                    record.ts = end;
                    tail.push(Emit::Event(record));
                }
            }
        } else if !self.stack.is_empty() {
            warn!(
                "dropped {} unterminated B events (pass --close to synthesize end events)",
                self.stack.len()
            );
            self.stack.clear();
        }
        tail
    }

    /// Number of B events currently awaiting their E
    pub fn open_events(&self) -> usize {
        self.stack.len()
    }

    /// Stack bookkeeping for B/E events.
    ///
    /// E closes the top of the stack unconditionally; `verify` only checks
    /// the pair it closed.
    fn pair(&mut self, record: TraceEvent, json: String) -> Result<Option<Emit>, VerifyError> {
        if record.is_begin() {
            self.stack.push(record);
            // When joining, the B is held until its E arrives or until flush
            return Ok(if self.config.join {
                None
            } else {
                Some(Emit::Raw(json))
            });
        }

        let Some(opened) = self.stack.pop() else {
            return Err(VerifyError::UnmatchedEnd(json));
        };

        if self.config.verify {
            check_pair(&opened, &record, &json)?;
        }

        if self.config.join {
            Ok(self.complete(opened, record.ts))
        } else {
            Ok(Some(Emit::Raw(json)))
        }
    }

    /// Synthesize an X event from an open B, then run it through the
    /// duration filters like any other duration event.
    fn complete(&self, mut begun: TraceEvent, end: i64) -> Option<Emit> {
        begun.dur = Some(end.saturating_sub(begun.ts));
        begun.ph = "X".to_string();
        if self.passes_filters(&begun) {
            Some(Emit::Event(begun))
        } else {
            None
        }
    }

    /// Pass-through path for everything the stack does not manage.
    fn admit(&self, record: TraceEvent, json: String) -> Option<Emit> {
        if self.always_kept(&record.ph) || self.passes_filters(&record) {
            Some(Emit::Raw(json))
        } else {
            None
        }
    }

    /// Phases kept regardless of the duration filters. B and E join this
    /// set when no pair management is configured, since they carry no
    /// duration of their own.
    fn always_kept(&self, ph: &str) -> bool {
        matches!(ph, "M" | "I") || (!self.config.manages_pairs() && matches!(ph, "B" | "E"))
    }

    /// Sampling and minimum-duration tests. Events without a duration are
    /// never excluded here.
    fn passes_filters(&self, record: &TraceEvent) -> bool {
        let Some(dur) = record.dur else {
            return true;
        };

        // Keep iff a sampling tick at a multiple of `sample` falls in
        // [ts, ts+dur]
        let sampled = self.config.sample.map_or(true, |sample| {
            let offset = record.ts.rem_euclid(sample);
            offset == 0 || sample - offset <= dur
        });

        let long_enough = self.config.min_dur.map_or(true, |min_dur| dur > min_dur);

        sampled && long_enough
    }

    fn observe(&mut self, record: &TraceEvent) {
        let end = record.end_time();
        if end > self.last_time {
            self.last_time = end;
        }
    }
}

/// Compare a matched B/E pair on cat, name, and args (args structurally).
fn check_pair(begin: &TraceEvent, end: &TraceEvent, json: &str) -> Result<(), VerifyError> {
    if begin.cat != end.cat {
        return Err(VerifyError::Mismatch {
            field: "cat",
            event: json.to_string(),
        });
    }
    if begin.name != end.name {
        return Err(VerifyError::Mismatch {
            field: "name",
            event: json.to_string(),
        });
    }
    if begin.args != end.args {
        return Err(VerifyError::Mismatch {
            field: "args",
            event: json.to_string(),
        });
    }
    Ok(())
}
