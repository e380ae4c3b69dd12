//! Configuration and constants for the CLI.

/// Read/write buffer size for the plain and decompressed byte streams
pub const IO_BUFFER_SIZE: usize = 64 * 1024;

/// Internal buffer size handed to the brotli coder
pub const BROTLI_BUFFER_SIZE: usize = 4096;

// Brotli parameters for .br output (quality 0-11, window 20-24)
pub const BROTLI_QUALITY: u32 = 5;
pub const BROTLI_LG_WINDOW: u32 = 22;
