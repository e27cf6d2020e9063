//! Erase path: `erase()` and `erase_all()`.

use std::fs;
use std::io::ErrorKind;

use crate::error::{Result, StoreError};
use crate::Engine;

impl Engine {
    /// Removes the value for `key`: file unlinked, cache busted, index
    /// entry deleted, and any directories the file left empty pruned up
    /// to (but never including) the base.
    ///
    /// # Errors
    ///
    /// `NotFound` when no file exists for the key; `BadKey` when the
    /// key's path resolves to a directory.
    pub fn erase(&self, key: &str) -> Result<()> {
        let path_key = self.shared.transform.path_key(key);
        let mut cache = self.shared.cache.lock();

        cache.bust(key);
        if let Some(index) = &self.shared.index {
            index.delete(key);
        }

        let filename = self.shared.complete_filename(&path_key);
        match fs::metadata(&filename) {
            Ok(md) if md.is_dir() => return Err(StoreError::BadKey),
            Ok(_) => {
                fs::remove_file(&filename).map_err(|e| StoreError::io("remove", e))?;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(StoreError::io("stat", e)),
        }

        // Best-effort; only a corrupt layout aborts.
        self.shared.prune_dirs(&path_key);
        Ok(())
    }

    /// Tears the whole store down: cache and index emptied, temp
    /// directory (when configured) and base directory removed. The engine
    /// stays usable — the next write recreates the base.
    pub fn erase_all(&self) -> Result<()> {
        let mut cache = self.shared.cache.lock();
        cache.clear();

        if let (Some(index), Some(less)) = (&self.shared.index, &self.shared.index_less) {
            index.initialize(std::sync::Arc::clone(less), &mut std::iter::empty());
        }

        if let Some(temp_dir) = &self.shared.temp_dir {
            let _ = fs::remove_dir_all(temp_dir);
        }

        match fs::remove_dir_all(&self.shared.base_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io("remove base", e)),
        }
    }
}
