//! Write path: `write()`, `write_string()`, `write_stream()`, and
//! `import()`.
//!
//! All mutations flow through [`Shared::write_stream_locked`]: validate
//! the key, take the engine lock, stream bytes through the staged-file
//! pipeline, then update the index and bust the cache so the next read
//! sees the new value. `import()` adds a rename fast path for files that
//! already live on the destination filesystem.

use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::error::{Result, StoreError};
use crate::transform;
use crate::Engine;

impl Engine {
    /// Writes `value` under `key`, synchronously but without fsync.
    ///
    /// # Errors
    ///
    /// `EmptyKey` for the empty string, `BadKey` when the transform
    /// produces an illegal path, `Io` on any pipeline failure.
    pub fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        self.write_stream(key, value, false)
    }

    /// `write` for string values.
    pub fn write_string(&self, key: &str, value: &str) -> Result<()> {
        self.write(key, value.as_bytes())
    }

    /// Streams `reader` to exhaustion into the file for `key`. When
    /// `sync` is set the file is fsynced before the rename, trading
    /// speed for durability.
    ///
    /// The engine lock is held for the whole pipeline, so a slow reader
    /// stalls every other store operation.
    pub fn write_stream<R: Read>(&self, key: &str, mut reader: R, sync: bool) -> Result<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let path_key = self.shared.transform.path_key(key);
        transform::check_legal(&path_key)?;

        let mut cache = self.shared.cache.lock();
        self.shared
            .write_stream_locked(&mut cache, &path_key, &mut reader, sync)
    }

    /// Stages the existing file at `src` under `dst_key`, replacing any
    /// prior value.
    ///
    /// With `move_src`, a rename is attempted first; when the source sits
    /// on a different filesystem the import falls back to a stream copy
    /// followed by an unlink of the source. Without `move_src` the source
    /// is always left in place and its bytes are copied.
    ///
    /// # Errors
    ///
    /// `EmptyKey` for an empty destination key, `ImportDirectory` when
    /// `src` is a directory, `Io` otherwise.
    pub fn import(&self, src: impl AsRef<Path>, dst_key: &str, move_src: bool) -> Result<()> {
        if dst_key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let src = src.as_ref();
        let md = fs::metadata(src).map_err(|e| StoreError::io("stat source", e))?;
        if md.is_dir() {
            return Err(StoreError::ImportDirectory);
        }

        let path_key = self.shared.transform.path_key(dst_key);

        let mut cache = self.shared.cache.lock();
        self.shared
            .ensure_path(&path_key)
            .map_err(|e| StoreError::io("ensure path", e))?;

        if move_src {
            match fs::rename(src, self.shared.complete_filename(&path_key)) {
                Ok(()) => {
                    if let Some(index) = &self.shared.index {
                        index.insert(&path_key.original_key);
                    }
                    cache.bust(&path_key.original_key);
                    return Ok(());
                }
                // Source on another filesystem: fall through to the copy.
                Err(e) if e.kind() == ErrorKind::CrossesDevices => {}
                Err(e) => return Err(StoreError::io("rename", e)),
            }
        }

        let mut src_file = File::open(src).map_err(|e| StoreError::io("open source", e))?;
        self.shared
            .write_stream_locked(&mut cache, &path_key, &mut src_file, false)?;

        if move_src {
            fs::remove_file(src).map_err(|e| StoreError::io("remove source", e))?;
        }
        Ok(())
    }
}
