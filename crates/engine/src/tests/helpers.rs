use std::sync::Arc;

use tempfile::TempDir;

use crate::{
    AdvancedTransformFn, BTreeIndex, Engine, Index, InverseTransformFn, LessFn, Options, PathKey,
};

pub fn string_less() -> LessFn {
    Arc::new(|a: &str, b: &str| a < b)
}

/// A flat store rooted inside `dir`.
pub fn new_store(dir: &TempDir, cache_size_max: u64) -> Engine {
    Engine::new(Options {
        base_path: dir.path().join("store"),
        cache_size_max,
        ..Default::default()
    })
}

/// A flat store with a lexically ordered `BTreeIndex`; the index handle
/// is returned so tests can query it directly.
pub fn indexed_store(dir: &TempDir, cache_size_max: u64) -> (Engine, Arc<BTreeIndex>) {
    let index = Arc::new(BTreeIndex::new());
    let engine = Engine::new(Options {
        base_path: dir.path().join("store"),
        cache_size_max,
        index: Some(Arc::clone(&index) as Arc<dyn Index>),
        index_less: Some(string_less()),
        ..Default::default()
    });
    (engine, index)
}

/// Forward transform for hierarchical keys: `"a/b/c"` lives at `a/b/c`.
pub fn split_forward() -> AdvancedTransformFn {
    Arc::new(|key: &str| {
        let mut parts: Vec<String> = key.split('/').map(str::to_string).collect();
        let file_name = parts.pop().unwrap_or_default();
        PathKey::new(parts, file_name)
    })
}

/// Inverse of [`split_forward`].
pub fn split_inverse() -> InverseTransformFn {
    Arc::new(|path_key: &PathKey| {
        let mut parts = path_key.path.clone();
        parts.push(path_key.file_name.clone());
        parts.join("/")
    })
}

/// A store whose keys are slash-separated paths on disk.
pub fn split_store(dir: &TempDir, cache_size_max: u64) -> Engine {
    Engine::new(Options {
        base_path: dir.path().join("store"),
        cache_size_max,
        advanced_transform: Some(split_forward()),
        inverse_transform: Some(split_inverse()),
        ..Default::default()
    })
}
