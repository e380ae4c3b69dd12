//! Trace Slim
//!
//! Streaming reducer for Chrome Trace Event Format dumps: filters,
//! samples, and collapses paired B/E events in a single forward pass,
//! optionally through gzip/brotli (de)compression.
//!
//! This crate provides the core implementation for the `trace-slim`
//! CLI tool.
//!
//! ## Getting Started
//!
//! Most users should install and use the CLI:
//!
//! ```bash
//! cargo install trace-slim
//! trace-slim --help
//! ```

pub mod codec;
pub mod commands;
pub mod filter;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod utils;
