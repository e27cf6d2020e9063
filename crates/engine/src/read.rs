//! Read path: `read()`, `read_string()`, `read_stream()`, and the siphon
//! that populates the cache.
//!
//! Reads are cache-first. On a miss the final file is opened under the
//! engine lock and handed back wrapped in a [`Siphon`], which tees every
//! byte into a buffer as the caller drains the reader; at end-of-file the
//! siphon re-acquires the lock and installs the buffer into the cache.
//! The cache therefore holds the *on-disk* representation — when
//! compression is configured, a cache hit is decompressed on the way out
//! exactly like a disk read.
//!
//! A `direct` read bypasses a cache hit: the hit is busted on a
//! background thread (so the lock is not held across the disk read that
//! follows) and the bytes come from disk. Meant for bulk re-reads that
//! should not pin large values in the cache.

use std::fs::File;
use std::io::{self, Cursor, ErrorKind, Read};
use std::mem;
use std::sync::Arc;
use std::thread;

use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::transform::PathKey;
use crate::{Engine, Shared};

impl Engine {
    /// The full value for `key`.
    ///
    /// # Errors
    ///
    /// `NotFound` when no file exists for the key, `Io` on filesystem or
    /// decompression failures.
    pub fn read(&self, key: &str) -> Result<Vec<u8>> {
        let mut reader = self.read_stream(key, false)?;
        let mut value = Vec::new();
        reader
            .read_to_end(&mut value)
            .map_err(|e| StoreError::io("read", e))?;
        Ok(value)
    }

    /// `read` for string values; invalid UTF-8 is replaced, not rejected.
    pub fn read_string(&self, key: &str) -> Result<String> {
        let value = self.read(key)?;
        Ok(String::from_utf8_lossy(&value).into_owned())
    }

    /// A reader over the value for `key`. Dropping the reader closes it.
    ///
    /// With `direct`, a cache hit is evicted (on a background thread) and
    /// the read is served from disk regardless.
    ///
    /// The reader outlives the engine lock: bytes are pulled lazily, and
    /// a concurrent write to the same key can land in between. The cache
    /// entry the siphon installs at end-of-file may then be stale until
    /// the next write busts it.
    pub fn read_stream(&self, key: &str, direct: bool) -> Result<Box<dyn Read + Send>> {
        let path_key = self.shared.transform.path_key(key);
        let cache = self.shared.cache.lock();

        if let Some(value) = cache.get(key) {
            if !direct {
                return self.shared.maybe_decompress(Box::new(Cursor::new(value)));
            }

            let shared = Arc::clone(&self.shared);
            let key = key.to_string();
            thread::spawn(move || {
                shared.cache.lock().bust(&key);
            });
        }

        let stream = read_from_disk(&self.shared, &path_key);
        drop(cache);
        stream
    }
}

/// Opens the final file for `path_key` and wraps it for the caller:
/// a [`Siphon`] when caching is enabled, a self-closing reader otherwise,
/// and the decompressor on top when configured. Runs under the engine
/// lock.
fn read_from_disk(shared: &Arc<Shared>, path_key: &PathKey) -> Result<Box<dyn Read + Send>> {
    let filename = shared.complete_filename(path_key);

    let md = match std::fs::metadata(&filename) {
        Ok(md) => md,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
        Err(e) => return Err(StoreError::io("stat", e)),
    };
    if md.is_dir() {
        return Err(StoreError::NotFound);
    }

    let file = File::open(&filename).map_err(|e| StoreError::io("open", e))?;

    let inner: Box<dyn Read + Send> = if shared.cache_size_max > 0 {
        Box::new(Siphon::new(file, Arc::clone(shared), &path_key.original_key))
    } else {
        Box::new(ClosingReader::new(file))
    };
    shared.maybe_decompress(inner)
}

impl Shared {
    fn maybe_decompress(&self, inner: Box<dyn Read + Send>) -> Result<Box<dyn Read + Send>> {
        match &self.compression {
            Some(codec) => codec
                .reader(inner)
                .map_err(|e| StoreError::io("compression reader", e)),
            None => Ok(inner),
        }
    }
}

/// Tees file bytes into a buffer while the caller consumes them; at
/// end-of-file installs the buffer into the cache (a value over budget is
/// silently not cached) and releases the file.
struct Siphon {
    file: Option<File>,
    shared: Arc<Shared>,
    key: String,
    buf: Vec<u8>,
}

impl Siphon {
    fn new(file: File, shared: Arc<Shared>, key: &str) -> Self {
        Self {
            file: Some(file),
            shared,
            key: key.to_string(),
            buf: Vec::new(),
        }
    }
}

impl Read for Siphon {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };

        let n = file.read(out)?;
        if n > 0 {
            self.buf.extend_from_slice(&out[..n]);
            return Ok(n);
        }

        // End-of-file: install under the engine lock and drop the file.
        let value = Bytes::from(mem::take(&mut self.buf));
        let _ = self.shared.cache.lock().insert(&self.key, value);
        self.file = None;
        Ok(0)
    }
}

/// Releases the underlying file as soon as end-of-file is reached, rather
/// than when the caller gets around to dropping the reader.
struct ClosingReader {
    file: Option<File>,
}

impl ClosingReader {
    fn new(file: File) -> Self {
        Self { file: Some(file) }
    }
}

impl Read for ClosingReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };
        let n = file.read(out)?;
        if n == 0 {
            self.file = None;
        }
        Ok(n)
    }
}
