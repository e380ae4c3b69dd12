//! Compression codec selection and stream construction.
//!
//! This module handles:
//! - Picking a codec from the file suffix (`.gz` gzip, `.br` brotli)
//! - Building the decompressed input stream with raw-byte accounting
//! - Building the compressed output stream with an explicit finish step
//!
//! Byte accounting counts the raw (pre-decompression) bytes, which is
//! what truncation diagnostics need to compare against the file size.

use crate::utils::config::{BROTLI_BUFFER_SIZE, BROTLI_LG_WINDOW, BROTLI_QUALITY, IO_BUFFER_SIZE};
use brotli::{CompressorWriter, Decompressor};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Compression codec, chosen from a file suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Plain,
    Gzip,
    Brotli,
}

impl Codec {
    /// Pick the codec for a path by its extension
    ///
    /// **Public** - used for both the input and the output side
    pub fn from_path(path: &Path) -> Codec {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("gz") => Codec::Gzip,
            Some("br") => Codec::Brotli,
            _ => Codec::Plain,
        }
    }
}

/// Counts raw bytes as they leave the file, before decompression.
struct CountingReader<R> {
    inner: R,
    count: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// Read-side progress, shared with the orchestrator for diagnostics
#[derive(Clone)]
pub struct ReadProgress {
    bytes: Arc<AtomicU64>,
    total: u64,
}

impl ReadProgress {
    pub fn bytes_read(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn total_bytes(&self) -> u64 {
        self.total
    }

    /// Human-readable position for truncation diagnostics
    pub fn describe(&self) -> String {
        let consumed = self.bytes_read();
        if consumed >= self.total {
            "near the end".to_string()
        } else {
            format!("after reading {} of {} bytes", consumed, self.total)
        }
    }
}

/// A decompressed input stream plus its raw-byte progress handle
pub struct InputStream {
    pub reader: Box<dyn BufRead>,
    pub progress: ReadProgress,
}

/// Open the input file, wiring in the decompressor its suffix calls for
///
/// **Public** - one fresh stream per pipeline attempt
pub fn open_input(path: &Path) -> io::Result<InputStream> {
    let codec = Codec::from_path(path);
    debug!("opening input {} as {:?}", path.display(), codec);

    let file = File::open(path)?;
    let total = file.metadata()?.len();
    let count = Arc::new(AtomicU64::new(0));
    let counting = CountingReader {
        inner: file,
        count: Arc::clone(&count),
    };

    let raw = BufReader::with_capacity(IO_BUFFER_SIZE, counting);
    let reader: Box<dyn BufRead> = match codec {
        Codec::Plain => Box::new(raw),
        Codec::Gzip => Box::new(BufReader::with_capacity(
            IO_BUFFER_SIZE,
            MultiGzDecoder::new(raw),
        )),
        Codec::Brotli => Box::new(BufReader::with_capacity(
            IO_BUFFER_SIZE,
            Decompressor::new(raw, BROTLI_BUFFER_SIZE),
        )),
    };

    Ok(InputStream {
        reader,
        progress: ReadProgress {
            bytes: count,
            total,
        },
    })
}

/// The compressed output stream
///
/// `finish` must be called after the last write: gzip and brotli both
/// append a terminator the plain `Write` interface has no hook for.
pub enum OutputStream {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Brotli(Box<CompressorWriter<BufWriter<File>>>),
}

impl OutputStream {
    /// Flush everything and write the codec terminator
    pub fn finish(self) -> io::Result<()> {
        match self {
            OutputStream::Plain(mut writer) => writer.flush(),
            OutputStream::Gzip(encoder) => {
                let mut inner = encoder.finish()?;
                inner.flush()
            }
            OutputStream::Brotli(mut writer) => {
                writer.flush()?;
                // The stream terminator is written when the compressor drops
                drop(writer);
                Ok(())
            }
        }
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputStream::Plain(writer) => writer.write(buf),
            OutputStream::Gzip(writer) => writer.write(buf),
            OutputStream::Brotli(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputStream::Plain(writer) => writer.flush(),
            OutputStream::Gzip(writer) => writer.flush(),
            OutputStream::Brotli(writer) => writer.flush(),
        }
    }
}

/// Create the output file, wiring in the compressor its suffix calls for
///
/// **Public** - one fresh stream per pipeline attempt; an earlier attempt's
/// partial output is simply overwritten
pub fn open_output(path: &Path) -> io::Result<OutputStream> {
    let codec = Codec::from_path(path);
    debug!("opening output {} as {:?}", path.display(), codec);

    let file = BufWriter::with_capacity(IO_BUFFER_SIZE, File::create(path)?);
    Ok(match codec {
        Codec::Plain => OutputStream::Plain(file),
        Codec::Gzip => OutputStream::Gzip(GzEncoder::new(file, Compression::default())),
        Codec::Brotli => OutputStream::Brotli(Box::new(CompressorWriter::new(
            file,
            BROTLI_BUFFER_SIZE,
            BROTLI_QUALITY,
            BROTLI_LG_WINDOW,
        ))),
    })
}
