//! Trace event parsing.
//!
//! This module handles:
//! - Decoding raw JSON into event records
//! - The fast line-oriented parse strategy
//! - The robust whole-document parse strategy
//!
//! Both strategies feed the same sink: one `ParsedEvent` per top-level
//! array element of the input document.

pub mod fast;
pub mod robust;
pub mod schema;

// Re-export main types
pub use schema::{ParsedEvent, TraceEvent};
