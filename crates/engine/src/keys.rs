//! Key enumeration: a lazy, cancellable walk of the base directory.
//!
//! The walk is pull-based: directories are opened only as the caller
//! advances the iterator, so enumerating the first few keys of a huge
//! store costs a few `read_dir` calls, not a full scan. Each regular file
//! is mapped back to its key through the inverse transform and yielded
//! iff the key starts with the requested prefix.
//!
//! Cancellation is cooperative: the iterator checks a shared flag before
//! every emission and ends the stream cleanly once it is set.

use std::fs::{self, ReadDir};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::transform::PathKey;
use crate::{Engine, Shared};

impl Engine {
    /// Enumerates every key in the store, lazily, in filesystem order.
    ///
    /// Pass a flag to cancel mid-walk; once set, the iterator yields
    /// `None` and stops touching the filesystem.
    pub fn keys(&self, cancel: Option<Arc<AtomicBool>>) -> Keys {
        self.keys_prefix("", cancel)
    }

    /// Enumerates the keys beginning with `prefix`.
    ///
    /// The walk is rooted at the directory portion of the prefix's
    /// transform (the whole base directory for an empty prefix), so with
    /// a hierarchical transform only the relevant subtree is visited.
    pub fn keys_prefix(&self, prefix: &str, cancel: Option<Arc<AtomicBool>>) -> Keys {
        let root = if prefix.is_empty() {
            self.shared.base_path.clone()
        } else {
            let path_key = self.shared.transform.path_key(prefix);
            self.shared.path_for(&path_key)
        };

        // A missing root is an empty store, not an error.
        let stack = match fs::read_dir(root) {
            Ok(entries) => vec![entries],
            Err(_) => Vec::new(),
        };

        Keys {
            shared: Arc::clone(&self.shared),
            prefix: prefix.to_string(),
            stack,
            cancel,
            done: false,
        }
    }
}

/// Lazy iterator over the store's keys. See [`Engine::keys_prefix`].
pub struct Keys {
    shared: Arc<Shared>,
    prefix: String,
    /// Depth-first stack of open directory handles.
    stack: Vec<ReadDir>,
    cancel: Option<Arc<AtomicBool>>,
    done: bool,
}

impl Keys {
    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Maps an on-disk file back to its key via the inverse transform.
    /// Files outside the base, or with non-UTF-8 names, yield `None` —
    /// the engine cannot have written them.
    fn key_for(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.shared.base_path).ok()?;

        let mut segments: Vec<String> = Vec::new();
        for component in rel.parent()?.components() {
            segments.push(component.as_os_str().to_str()?.to_string());
        }
        let file_name = rel.file_name()?.to_str()?.to_string();

        let path_key = PathKey {
            path: segments,
            file_name,
            original_key: String::new(),
        };
        Some(self.shared.transform.key_of(&path_key))
    }
}

impl Iterator for Keys {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        loop {
            if self.cancelled() {
                self.done = true;
                self.stack.clear();
                return None;
            }

            let dir = self.stack.last_mut()?;
            let entry = match dir.next() {
                Some(Ok(entry)) => entry,
                Some(Err(_)) => continue,
                None => {
                    self.stack.pop();
                    continue;
                }
            };

            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                if let Ok(entries) = fs::read_dir(entry.path()) {
                    self.stack.push(entries);
                }
                continue;
            }

            let Some(key) = self.key_for(&entry.path()) else {
                continue;
            };
            if key.starts_with(&self.prefix) {
                return Some(key);
            }
        }
    }
}
