//! Path-key model: where a key's file lives.
//!
//! A [`PathKey`] is the ephemeral, per-operation answer to "which
//! directory segments and which file name does this key map to". The
//! mapping is caller-configurable in two shapes: a **simple** transform
//! (key → directory segments, file name defaults to the key) or an
//! **advanced** transform (key → full `PathKey`), paired with an
//! **inverse** that reconstructs the key from a `PathKey` discovered by a
//! directory walk.
//!
//! The defaults are the identity: no segments, file name = key, inverse
//! returns the file name. Whatever the caller supplies must round-trip —
//! `inverse(forward(key)) == key` — or enumeration will yield garbage;
//! the engine does not verify this.

use std::path::MAIN_SEPARATOR;
use std::sync::Arc;

use crate::error::{Result, StoreError};

/// Separator of entries in OS path lists (`$PATH`). File names containing
/// it are rejected.
#[cfg(unix)]
pub(crate) const PATH_LIST_SEPARATOR: char = ':';
#[cfg(windows)]
pub(crate) const PATH_LIST_SEPARATOR: char = ';';

/// Where a key's file lives: directory segments below the base directory
/// plus a file name. Carries the original key so cache and index updates
/// performed in terms of a `PathKey` stay keyed by the exact caller
/// string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey {
    pub path: Vec<String>,
    pub file_name: String,
    pub(crate) original_key: String,
}

impl PathKey {
    /// A `PathKey` for advanced transforms to return. The engine fills in
    /// the originating key itself.
    pub fn new(path: Vec<String>, file_name: impl Into<String>) -> Self {
        Self {
            path,
            file_name: file_name.into(),
            original_key: String::new(),
        }
    }
}

/// Simple forward transform: key → directory segments.
pub type TransformFn = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Advanced forward transform: key → full [`PathKey`].
pub type AdvancedTransformFn = Arc<dyn Fn(&str) -> PathKey + Send + Sync>;

/// Inverse transform: [`PathKey`] discovered on disk → key.
pub type InverseTransformFn = Arc<dyn Fn(&PathKey) -> String + Send + Sync>;

/// The resolved transform pair the engine actually runs: always advanced
/// (simple transforms are composed into the advanced shape), always
/// invertible.
pub(crate) struct Transform {
    forward: AdvancedTransformFn,
    inverse: InverseTransformFn,
}

impl Transform {
    /// Resolves the three optional configuration fields into a concrete
    /// pair, applying the defaults.
    ///
    /// # Panics
    ///
    /// Panics when an advanced transform is supplied without an inverse:
    /// enumeration would be non-invertible, which corrupts every walk, so
    /// construction refuses outright.
    pub(crate) fn resolve(
        simple: Option<TransformFn>,
        advanced: Option<AdvancedTransformFn>,
        inverse: Option<InverseTransformFn>,
    ) -> Self {
        match advanced {
            Some(forward) => {
                let inverse = inverse
                    .expect("an advanced transform requires an inverse transform");
                Self { forward, inverse }
            }
            None => {
                let forward: AdvancedTransformFn = match simple {
                    Some(simple) => Arc::new(move |key: &str| PathKey::new(simple(key), key)),
                    None => Arc::new(|key: &str| PathKey::new(Vec::new(), key)),
                };
                let inverse = inverse
                    .unwrap_or_else(|| Arc::new(|pk: &PathKey| pk.file_name.clone()));
                Self { forward, inverse }
            }
        }
    }

    /// Runs the forward transform and stamps the originating key.
    pub(crate) fn path_key(&self, key: &str) -> PathKey {
        let mut path_key = (self.forward)(key);
        path_key.original_key = key.to_string();
        path_key
    }

    /// Reconstructs a key from a `PathKey` discovered by a walk.
    pub(crate) fn key_of(&self, path_key: &PathKey) -> String {
        (self.inverse)(path_key)
    }
}

/// Rejects path keys whose segments or file name would escape their
/// directory level, or whose file name could not appear in an OS path
/// list.
pub(crate) fn check_legal(path_key: &PathKey) -> Result<()> {
    for segment in &path_key.path {
        if segment.contains(MAIN_SEPARATOR) {
            return Err(StoreError::BadKey);
        }
    }
    if path_key.file_name.contains(MAIN_SEPARATOR)
        || path_key.file_name.contains(PATH_LIST_SEPARATOR)
    {
        return Err(StoreError::BadKey);
    }
    Ok(())
}
