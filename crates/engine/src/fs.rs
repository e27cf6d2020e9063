//! Filesystem layer: path resolution, staged files, the write pipeline,
//! and directory pruning.
//!
//! Writes never land at their final path mid-flight. Bytes stream into a
//! *staged* file — a `NamedTempFile` in `temp_dir` when one is
//! configured, otherwise the destination itself opened create/truncate —
//! through an optional compressor, and the final rename happens only
//! after the compressor trailer is flushed and (when asked) the file is
//! fsynced. Any failure along the pipeline unlinks the staged file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::PathBuf;

use cache::Cache;
use tempfile::NamedTempFile;

use crate::error::{Result, StoreError};
use crate::transform::PathKey;
use crate::Shared;

/// An in-progress write destination.
enum Staged {
    /// A temp file that will be renamed into place. Dropping it unlinks.
    Temp(NamedTempFile),
    /// The final path itself, opened create/truncate. On failure the
    /// partially written destination is removed explicitly.
    Final(File, PathBuf),
}

impl Staged {
    fn file_mut(&mut self) -> &mut File {
        match self {
            Staged::Temp(temp) => temp.as_file_mut(),
            Staged::Final(file, _) => file,
        }
    }

    /// Removes whatever was staged.
    fn discard(self) {
        match self {
            Staged::Temp(temp) => drop(temp),
            Staged::Final(file, path) => {
                drop(file);
                let _ = fs::remove_file(path);
            }
        }
    }
}

impl Shared {
    /// `<base>/<segments…>` — the directory a path key's file lives in.
    pub(crate) fn path_for(&self, path_key: &PathKey) -> PathBuf {
        self.dir_for_segments(&path_key.path)
    }

    /// `<base>/<segments…>/<file name>` — a path key's final file path.
    pub(crate) fn complete_filename(&self, path_key: &PathKey) -> PathBuf {
        self.path_for(path_key).join(&path_key.file_name)
    }

    fn dir_for_segments(&self, segments: &[String]) -> PathBuf {
        let mut dir = self.base_path.clone();
        for segment in segments {
            dir.push(segment);
        }
        dir
    }

    /// Recursively creates a path key's directory with `path_perm`.
    pub(crate) fn ensure_path(&self, path_key: &PathKey) -> io::Result<()> {
        make_dirs(self.path_for(path_key), self.path_perm)
    }

    /// Opens the staged write destination with `file_perm`.
    fn create_key_file(&self, path_key: &PathKey) -> Result<Staged> {
        if let Some(temp_dir) = &self.temp_dir {
            make_dirs(temp_dir.clone(), self.path_perm)
                .map_err(|e| StoreError::io("temp mkdir", e))?;

            let mut builder = tempfile::Builder::new();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                builder.permissions(fs::Permissions::from_mode(self.file_perm));
            }
            let temp = builder
                .tempfile_in(temp_dir)
                .map_err(|e| StoreError::io("temp file", e))?;
            return Ok(Staged::Temp(temp));
        }

        let path = self.complete_filename(path_key);
        let mut opts = OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(self.file_perm);
        }
        let file = opts
            .open(&path)
            .map_err(|e| StoreError::io("open file", e))?;
        Ok(Staged::Final(file, path))
    }

    /// The write pipeline. Must be called with the engine lock held.
    ///
    /// Streams `reader` into a staged file (through the compressor when
    /// one is configured), optionally fsyncs, renames into place, then
    /// updates the index and busts the cache entry for the key.
    pub(crate) fn write_stream_locked(
        &self,
        cache: &mut Cache,
        path_key: &PathKey,
        reader: &mut dyn Read,
        sync: bool,
    ) -> Result<()> {
        self.ensure_path(path_key)
            .map_err(|e| StoreError::io("ensure path", e))?;

        let mut staged = self.create_key_file(path_key)?;

        if let Err(e) = self.drain(staged.file_mut(), reader, sync) {
            staged.discard();
            return Err(e);
        }

        if let Staged::Temp(temp) = staged {
            let final_path = self.complete_filename(path_key);
            if let Err(persist_err) = temp.persist(&final_path) {
                // The temp file comes back inside the error; dropping it
                // unlinks the staged bytes.
                let tempfile::PersistError { error, file } = persist_err;
                drop(file);
                return Err(StoreError::io("rename", error));
            }
        }

        if let Some(index) = &self.index {
            index.insert(&path_key.original_key);
        }
        cache.bust(&path_key.original_key);
        Ok(())
    }

    /// Streams `reader` into `dst`, compressing when configured, and
    /// fsyncs afterwards when `sync` is set.
    fn drain(&self, dst: &mut File, reader: &mut dyn Read, sync: bool) -> Result<()> {
        match &self.compression {
            Some(codec) => {
                let mut encoder = codec
                    .writer(Box::new(&mut *dst))
                    .map_err(|e| StoreError::io("compression writer", e))?;
                io::copy(reader, &mut encoder).map_err(|e| StoreError::io("i/o copy", e))?;
                encoder
                    .finish()
                    .map_err(|e| StoreError::io("compression finish", e))?;
            }
            None => {
                io::copy(reader, &mut *dst).map_err(|e| StoreError::io("i/o copy", e))?;
            }
        }

        if sync {
            dst.sync_all().map_err(|e| StoreError::io("file sync", e))?;
        }
        Ok(())
    }

    /// Removes the now-empty directories a key's file used to live in,
    /// deepest first, stopping at the first non-empty one. The base
    /// directory itself is never removed. Best-effort: I/O errors end the
    /// walk silently.
    ///
    /// # Panics
    ///
    /// Panics when a path component turns out not to be a directory —
    /// that layout cannot have been produced by this engine, so the store
    /// is corrupt.
    pub(crate) fn prune_dirs(&self, path_key: &PathKey) {
        for depth in (1..=path_key.path.len()).rev() {
            let dir = self.dir_for_segments(&path_key.path[..depth]);

            let md = match fs::metadata(&dir) {
                Ok(md) => md,
                Err(_) => return,
            };
            if !md.is_dir() {
                panic!("corrupt directory layout at {}", dir.display());
            }

            match fs::read_dir(&dir) {
                Ok(mut entries) => {
                    if entries.next().is_some() {
                        return;
                    }
                }
                Err(_) => return,
            }

            if fs::remove_dir(&dir).is_err() {
                return;
            }
        }
    }
}

/// `create_dir_all` with permission bits on the directories it creates.
fn make_dirs(dir: PathBuf, perm: u32) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(perm);
    }
    builder.create(dir)
}
