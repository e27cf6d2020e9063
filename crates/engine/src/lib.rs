//! # Engine - the CoveKV store
//!
//! An embedded, disk-backed key-value store. Every key maps to exactly one
//! regular file under a base directory; a caller-supplied transform decides
//! the directory layout, so the same engine backs flat stores,
//! content-addressed shards, and hierarchical namespaces.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!   |
//!   v
//! ┌───────────────────────────────────────────────────┐
//! │                    ENGINE                         │
//! │            (one lock around everything)           │
//! │                                                   │
//! │ write.rs → transform → staged file → compressor   │
//! │              → fsync? → rename → index → bust     │
//! │                                                   │
//! │ read.rs  → cache hit? ── yes → decompress ──────► │
//! │              │ no                                 │
//! │              v                                    │
//! │           open file → siphon ─── bytes ─────────► │
//! │                          └── EOF: install cache   │
//! │                                                   │
//! │ erase.rs → remove file → bust → index → prune     │
//! │ keys.rs  → lazy walk → inverse transform          │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module        | Purpose                                              |
//! |---------------|------------------------------------------------------|
//! | `lib.rs`      | `Options`, `Engine`, constructor, `has`, `Debug`     |
//! | [`transform`] | `PathKey`, forward/inverse transforms, key legality  |
//! | [`fs`]        | ensure-path, staged files, write pipeline, pruning   |
//! | [`write`]     | `write()`, `write_stream()`, `import()`              |
//! | [`read`]      | `read()`, `read_stream()`, the cache siphon          |
//! | [`erase`]     | `erase()`, `erase_all()`                             |
//! | [`keys`]      | lazy, cancellable key enumeration                    |
//!
//! ## Concurrency
//!
//! One engine-wide mutex, held for the full duration of every operation —
//! including disk I/O. That is a deliberate simplicity-over-throughput
//! trade: there is exactly one place where consistency between disk,
//! cache, and index can break, and it is guarded. Readers get their bytes
//! through a reader handed back *after* the lock is released; the siphon
//! behind it re-acquires the lock only at end-of-file to install into the
//! cache.
//!
//! ## Crash Safety
//!
//! A value is visible under its final path only after a complete write:
//! bytes stream into a staged file (in `temp_dir` when configured,
//! otherwise the destination itself), the compressor trailer is flushed,
//! the file is optionally fsynced, and only then renamed into place. A
//! failure anywhere unlinks the staged file.

mod erase;
mod error;
mod fs;
mod keys;
mod read;
mod transform;
mod write;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use cache::Cache;

pub use compression::{Compression, Snappy, Zstd};
pub use error::{Result, StoreError};
pub use index::{BTreeIndex, Index, LessFn};
pub use keys::Keys;
pub use transform::{AdvancedTransformFn, InverseTransformFn, PathKey, TransformFn};

use transform::Transform;

/// Base directory used when `Options::base_path` is left empty.
pub const DEFAULT_BASE_PATH: &str = "covekv";
/// Directory permission bits used when `Options::path_perm` is zero.
pub const DEFAULT_PATH_PERM: u32 = 0o777;
/// File permission bits used when `Options::file_perm` is zero.
pub const DEFAULT_FILE_PERM: u32 = 0o666;

/// Construction options. Every field has a workable default; a plain
/// `Options::default()` yields a flat store under `"covekv"` with no
/// cache, no index, and no compression.
///
/// ```no_run
/// # use engine::{Engine, Options};
/// let store = Engine::new(Options {
///     base_path: "my-data".into(),
///     cache_size_max: 1024 * 1024,
///     ..Default::default()
/// });
/// ```
pub struct Options {
    /// Root of the store on the filesystem. Empty means
    /// [`DEFAULT_BASE_PATH`].
    pub base_path: PathBuf,

    /// Simple forward transform: key → directory segments, file name
    /// stays the key. Ignored when `advanced_transform` is set.
    pub transform: Option<TransformFn>,

    /// Advanced forward transform: key → full [`PathKey`]. Requires
    /// `inverse_transform`.
    pub advanced_transform: Option<AdvancedTransformFn>,

    /// Reconstructs a key from a [`PathKey`] discovered during a walk.
    /// Defaults to the identity on the file name.
    pub inverse_transform: Option<InverseTransformFn>,

    /// Read-cache budget in bytes. Zero disables caching entirely: reads
    /// never populate.
    pub cache_size_max: u64,

    /// Permission bits for created directories. Zero means
    /// [`DEFAULT_PATH_PERM`]. Unix only; ignored elsewhere.
    pub path_perm: u32,

    /// Permission bits for created files. Zero means
    /// [`DEFAULT_FILE_PERM`]. Unix only; ignored elsewhere.
    pub file_perm: u32,

    /// Staging directory for in-progress writes, possibly on another
    /// filesystem. Unset means writes stage directly at the final path.
    pub temp_dir: Option<PathBuf>,

    /// Optional sorted index over the keys on disk. Initialized with a
    /// full enumeration at construction when `index_less` is also set.
    pub index: Option<Arc<dyn Index>>,

    /// The ordering for `index`.
    pub index_less: Option<LessFn>,

    /// Optional streaming codec applied to values on disk.
    pub compression: Option<Box<dyn Compression>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_path: PathBuf::new(),
            transform: None,
            advanced_transform: None,
            inverse_transform: None,
            cache_size_max: 0,
            path_perm: 0,
            file_perm: 0,
            temp_dir: None,
            index: None,
            index_less: None,
            compression: None,
        }
    }
}

/// Engine state shared between handles, siphons, and background busts.
pub(crate) struct Shared {
    pub(crate) base_path: PathBuf,
    pub(crate) transform: Transform,
    pub(crate) path_perm: u32,
    pub(crate) file_perm: u32,
    pub(crate) temp_dir: Option<PathBuf>,
    pub(crate) compression: Option<Box<dyn Compression>>,
    pub(crate) index: Option<Arc<dyn Index>>,
    pub(crate) index_less: Option<LessFn>,
    pub(crate) cache_size_max: u64,
    /// The engine-wide lock. Guards the cache, and by convention every
    /// operation that touches disk runs while holding it.
    pub(crate) cache: Mutex<Cache>,
}

/// The store. Cheap to clone — clones share state — and safe to use from
/// multiple threads.
#[derive(Clone)]
pub struct Engine {
    pub(crate) shared: Arc<Shared>,
}

impl Engine {
    /// Builds a store from `options`.
    ///
    /// Touches no disk except when an index and ordering are both
    /// supplied, in which case the base directory is walked once to seed
    /// the index. A missing base directory is an empty store, created on
    /// first write.
    ///
    /// # Panics
    ///
    /// Panics when `advanced_transform` is set without
    /// `inverse_transform`: key enumeration would be non-invertible.
    pub fn new(options: Options) -> Self {
        let Options {
            base_path,
            transform,
            advanced_transform,
            inverse_transform,
            cache_size_max,
            path_perm,
            file_perm,
            temp_dir,
            index,
            index_less,
            compression,
        } = options;

        let base_path = if base_path.as_os_str().is_empty() {
            PathBuf::from(DEFAULT_BASE_PATH)
        } else {
            base_path
        };
        let path_perm = if path_perm == 0 { DEFAULT_PATH_PERM } else { path_perm };
        let file_perm = if file_perm == 0 { DEFAULT_FILE_PERM } else { file_perm };

        let engine = Engine {
            shared: Arc::new(Shared {
                base_path,
                transform: Transform::resolve(transform, advanced_transform, inverse_transform),
                path_perm,
                file_perm,
                temp_dir,
                compression,
                index: index.clone(),
                index_less: index_less.clone(),
                cache_size_max,
                cache: Mutex::new(Cache::new(cache_size_max)),
            }),
        };

        if let (Some(index), Some(less)) = (index, index_less) {
            index.initialize(less, &mut engine.keys(None));
        }

        engine
    }

    /// Whether a value exists for `key`, answered from the cache when
    /// possible and from a `stat` of the final path otherwise. Never
    /// fails: stat errors and directories both read as absent.
    pub fn has(&self, key: &str) -> bool {
        let path_key = self.shared.transform.path_key(key);
        let cache = self.shared.cache.lock();
        if cache.contains(key) {
            return true;
        }
        match std::fs::metadata(self.shared.complete_filename(&path_key)) {
            Ok(md) => !md.is_dir(),
            Err(_) => false,
        }
    }

    /// Root of the store on the filesystem.
    pub fn base_path(&self) -> &Path {
        &self.shared.base_path
    }

    /// Bytes currently held by the read cache.
    pub fn cache_used(&self) -> u64 {
        self.shared.cache.lock().size()
    }

    /// The read-cache budget.
    pub fn cache_max(&self) -> u64 {
        self.shared.cache_size_max
    }

    #[cfg(test)]
    pub(crate) fn cached(&self, key: &str) -> bool {
        self.shared.cache.lock().contains(key)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.shared.cache.lock();
        f.debug_struct("Engine")
            .field("base_path", &self.shared.base_path)
            .field("temp_dir", &self.shared.temp_dir)
            .field("cache_size", &cache.size())
            .field("cache_size_max", &cache.max())
            .field("compression", &self.shared.compression.is_some())
            .field("indexed", &self.shared.index.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests;
