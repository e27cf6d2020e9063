use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tempfile::tempdir;

use super::helpers::{new_store, split_store};
use crate::*;

fn sorted(keys: Keys) -> Vec<String> {
    let mut collected: Vec<String> = keys.collect();
    collected.sort();
    collected
}

#[test]
fn keys_enumerates_everything() -> Result<()> {
    let dir = tempdir().unwrap();
    let store = new_store(&dir, 1024);

    for key in ["alpha", "beta", "gamma"] {
        store.write(key, b"1")?;
    }

    assert_eq!(sorted(store.keys(None)), vec!["alpha", "beta", "gamma"]);
    Ok(())
}

#[test]
fn keys_on_an_empty_store_yields_nothing() {
    let dir = tempdir().unwrap();
    let store = new_store(&dir, 1024);

    assert_eq!(store.keys(None).count(), 0);
}

#[test]
fn keys_prefix_filters() -> Result<()> {
    let dir = tempdir().unwrap();
    let store = new_store(&dir, 1024);

    for key in ["ab1", "ab2", "b", "abc"] {
        store.write(key, b"1")?;
    }

    assert_eq!(sorted(store.keys_prefix("ab", None)), vec!["ab1", "ab2", "abc"]);
    assert_eq!(sorted(store.keys_prefix("zz", None)), Vec::<String>::new());
    Ok(())
}

#[test]
fn hierarchical_keys_round_trip_through_the_walk() -> Result<()> {
    let dir = tempdir().unwrap();
    let store = split_store(&dir, 1024);

    let keys = ["alpha/beta/gamma", "alpha/delta", "omega"];
    for key in keys {
        store.write(key, b"1")?;
    }

    let mut expect: Vec<&str> = keys.to_vec();
    expect.sort();
    assert_eq!(sorted(store.keys(None)), expect);
    Ok(())
}

#[test]
fn prefix_walk_is_rooted_in_the_prefix_directory() -> Result<()> {
    let dir = tempdir().unwrap();
    let store = split_store(&dir, 1024);

    store.write("alpha/beta/gamma", b"1")?;
    store.write("alpha/delta", b"2")?;
    store.write("omega", b"3")?;

    assert_eq!(
        sorted(store.keys_prefix("alpha/", None)),
        vec!["alpha/beta/gamma", "alpha/delta"]
    );
    Ok(())
}

#[test]
fn cancellation_ends_the_stream_cleanly() -> Result<()> {
    let dir = tempdir().unwrap();
    let store = new_store(&dir, 1024);

    for i in 0..20 {
        store.write(&format!("key-{i:02}"), b"1")?;
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let mut keys = store.keys(Some(Arc::clone(&cancel)));

    assert!(keys.next().is_some());
    cancel.store(true, Ordering::Relaxed);

    assert!(keys.next().is_none(), "cancel reads as end-of-stream");
    assert!(keys.next().is_none(), "and stays ended");
    Ok(())
}

#[test]
fn already_cancelled_walk_yields_nothing() -> Result<()> {
    let dir = tempdir().unwrap();
    let store = new_store(&dir, 1024);
    store.write("k", b"1")?;

    let cancel = Arc::new(AtomicBool::new(true));
    assert_eq!(store.keys(Some(cancel)).count(), 0);
    Ok(())
}

#[test]
fn sharded_store_enumerates_original_keys() -> Result<()> {
    // Content-addressed layout: objects/<first two chars>/<full key>.
    let dir = tempdir().unwrap();
    let forward: AdvancedTransformFn = Arc::new(|key: &str| {
        if key.len() >= 2 && key.chars().all(|c| c.is_ascii_hexdigit()) {
            PathKey::new(vec!["objects".into(), key[..2].into()], key)
        } else {
            PathKey::new(Vec::new(), key)
        }
    });
    let inverse: InverseTransformFn = Arc::new(|pk: &PathKey| pk.file_name.clone());
    let store = Engine::new(Options {
        base_path: dir.path().join("store"),
        advanced_transform: Some(forward),
        inverse_transform: Some(inverse),
        ..Default::default()
    });

    store.write("1bd88421b055327fcc8660c76c4894c4ea4c95d7", b"blob")?;
    store.write("refs", b"some text")?;

    assert!(store
        .base_path()
        .join("objects/1b/1bd88421b055327fcc8660c76c4894c4ea4c95d7")
        .is_file());
    assert_eq!(
        sorted(store.keys(None)),
        vec!["1bd88421b055327fcc8660c76c4894c4ea4c95d7", "refs"]
    );
    Ok(())
}
