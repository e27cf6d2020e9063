use std::fs;
use std::io::Write;

use tempfile::tempdir;

use super::helpers::{indexed_store, new_store};
use crate::*;

#[test]
fn import_move_takes_the_source() -> Result<()> {
    let dir = tempdir().unwrap();
    let store = new_store(&dir, 1024);

    // Source inside the same tempdir, so the rename fast path applies.
    let src = dir.path().join("incoming");
    fs::File::create(&src).unwrap().write_all(b"0123456789").unwrap();

    store.write("key", b"TBD")?;
    store.import(&src, "key", true)?;

    assert!(!src.exists(), "moved source is gone");
    assert!(store.has("key"));
    assert_eq!(store.read("key")?, b"0123456789");
    Ok(())
}

#[test]
fn import_copy_leaves_the_source() -> Result<()> {
    let dir = tempdir().unwrap();
    let store = new_store(&dir, 1024);

    let src = dir.path().join("incoming");
    fs::write(&src, "¡åéîòü!").unwrap();

    store.import(&src, "key", false)?;

    assert!(src.exists(), "copied source remains");
    assert_eq!(store.read_string("key")?, "¡åéîòü!");
    Ok(())
}

#[test]
fn import_replaces_an_existing_value() -> Result<()> {
    let dir = tempdir().unwrap();
    let store = new_store(&dir, 1024);

    store.write("key", b"old")?;
    assert_eq!(store.read("key")?, b"old");

    let src = dir.path().join("incoming");
    fs::write(&src, b"new").unwrap();
    store.import(&src, "key", true)?;
    assert_eq!(store.read("key")?, b"new");
    Ok(())
}

#[test]
fn import_busts_a_stale_cache_entry() -> Result<()> {
    let dir = tempdir().unwrap();
    let store = new_store(&dir, 1024);

    store.write("key", b"old")?;
    assert_eq!(store.read("key")?, b"old");
    assert!(store.cached("key"));

    let src = dir.path().join("incoming");
    fs::write(&src, b"new").unwrap();
    store.import(&src, "key", true)?;

    assert!(!store.cached("key"));
    assert_eq!(store.read("key")?, b"new");
    Ok(())
}

#[test]
fn import_updates_the_index() -> Result<()> {
    let dir = tempdir().unwrap();
    let (store, index) = indexed_store(&dir, 1024);

    let src = dir.path().join("incoming");
    fs::write(&src, b"bytes").unwrap();
    store.import(&src, "imported", true)?;

    assert!(index.keys("", 100).contains(&"imported".to_string()));
    Ok(())
}

#[test]
fn import_directory_is_rejected() {
    let dir = tempdir().unwrap();
    let store = new_store(&dir, 1024);

    let src = dir.path().join("subdir");
    fs::create_dir(&src).unwrap();

    assert!(matches!(
        store.import(&src, "key", true),
        Err(StoreError::ImportDirectory)
    ));
}

#[test]
fn import_empty_destination_key_is_rejected() {
    let dir = tempdir().unwrap();
    let store = new_store(&dir, 1024);

    let src = dir.path().join("incoming");
    fs::write(&src, b"bytes").unwrap();

    assert!(matches!(
        store.import(&src, "", true),
        Err(StoreError::EmptyKey)
    ));
    assert!(src.exists(), "rejected import leaves the source alone");
}

#[test]
fn import_missing_source_is_an_io_error() {
    let dir = tempdir().unwrap();
    let store = new_store(&dir, 1024);

    assert!(matches!(
        store.import(dir.path().join("nope"), "key", false),
        Err(StoreError::Io { .. })
    ));
}
