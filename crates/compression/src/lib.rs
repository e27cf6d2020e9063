//! # Compression — streaming codecs for stored values
//!
//! Values can optionally be compressed on their way to disk and
//! decompressed on their way back. This crate defines the codec seam the
//! engine plugs into and bundles two implementations:
//!
//! - [`Zstd`] — zstd frames, with a configurable compression level.
//! - [`Snappy`] — the snappy frame format (fast, modest ratios).
//!
//! A codec wraps a raw byte sink or source: [`Compression::writer`] returns
//! an [`Encoder`] that compresses everything written through it, and
//! [`Compression::reader`] returns a decompressing reader. The caller must
//! call [`Encoder::finish`] once all bytes are written so container
//! trailers reach the underlying sink **before** the sink is synced or
//! closed — dropping an unfinished encoder may lose the tail of the frame.

use std::io::{self, Read, Write};

/// A compressing writer. Everything written is encoded into the wrapped
/// sink; `finish` flushes any buffered data and the container trailer.
pub trait Encoder: Write {
    /// Flushes buffered data and writes the stream trailer. Must be called
    /// exactly once, after the final `write`.
    fn finish(&mut self) -> io::Result<()>;
}

/// A streaming compression codec.
///
/// Implementations must be usable from multiple threads: the engine holds
/// one codec for its whole lifetime and wraps files with it on demand.
pub trait Compression: Send + Sync {
    /// Wraps `dst` in a compressing [`Encoder`].
    fn writer<'a>(&self, dst: Box<dyn Write + Send + 'a>) -> io::Result<Box<dyn Encoder + Send + 'a>>;

    /// Wraps `src` in a decompressing reader.
    fn reader<'a>(&self, src: Box<dyn Read + Send + 'a>) -> io::Result<Box<dyn Read + Send + 'a>>;
}

/// Zstd codec.
///
/// Level 0 selects the library default; valid explicit levels are 1–21.
#[derive(Debug, Clone, Copy)]
pub struct Zstd {
    level: i32,
}

impl Zstd {
    /// Zstd at the default compression level.
    pub fn new() -> Self {
        Self { level: 0 }
    }

    /// Zstd at an explicit compression level (1–21).
    pub fn with_level(level: i32) -> Self {
        Self { level }
    }
}

impl Default for Zstd {
    fn default() -> Self {
        Self::new()
    }
}

impl Compression for Zstd {
    fn writer<'a>(&self, dst: Box<dyn Write + Send + 'a>) -> io::Result<Box<dyn Encoder + Send + 'a>> {
        Ok(Box::new(ZstdEncoder(zstd::stream::write::Encoder::new(
            dst, self.level,
        )?)))
    }

    fn reader<'a>(&self, src: Box<dyn Read + Send + 'a>) -> io::Result<Box<dyn Read + Send + 'a>> {
        Ok(Box::new(zstd::stream::read::Decoder::new(src)?))
    }
}

struct ZstdEncoder<'a>(zstd::stream::write::Encoder<'static, Box<dyn Write + Send + 'a>>);

impl Write for ZstdEncoder<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl Encoder for ZstdEncoder<'_> {
    fn finish(&mut self) -> io::Result<()> {
        self.0.do_finish()
    }
}

/// Snappy codec, using the framed format so streams of any length round-trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct Snappy;

impl Snappy {
    pub fn new() -> Self {
        Self
    }
}

impl Compression for Snappy {
    fn writer<'a>(&self, dst: Box<dyn Write + Send + 'a>) -> io::Result<Box<dyn Encoder + Send + 'a>> {
        Ok(Box::new(SnappyEncoder(snap::write::FrameEncoder::new(dst))))
    }

    fn reader<'a>(&self, src: Box<dyn Read + Send + 'a>) -> io::Result<Box<dyn Read + Send + 'a>> {
        Ok(Box::new(snap::read::FrameDecoder::new(src)))
    }
}

struct SnappyEncoder<'a>(snap::write::FrameEncoder<Box<dyn Write + Send + 'a>>);

impl Write for SnappyEncoder<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl Encoder for SnappyEncoder<'_> {
    // The snappy frame format has no trailer; flushing the pending chunk
    // is all that is required.
    fn finish(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}
