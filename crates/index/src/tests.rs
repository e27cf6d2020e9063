use super::*;

fn string_less() -> LessFn {
    Arc::new(|a: &str, b: &str| a < b)
}

fn indexed(keys: &[&str]) -> BTreeIndex {
    let index = BTreeIndex::new();
    index.initialize(string_less(), &mut keys.iter().map(|k| k.to_string()));
    index
}

#[test]
fn keys_come_back_sorted() {
    let index = indexed(&["a", "1", "m", "-", "A"]);
    assert_eq!(index.keys("", 100), vec!["-", "1", "A", "a", "m"]);
}

#[test]
fn initialize_deduplicates() {
    let index = indexed(&["a", "c", "z", "b", "x", "b", "y"]);
    assert_eq!(index.keys("", 99), vec!["a", "b", "c", "x", "y", "z"]);
}

#[test]
fn from_member_skips_itself() {
    let index = indexed(&["a", "b", "c", "x", "y", "z"]);
    assert_eq!(index.keys("b", 99), vec!["c", "x", "y", "z"]);
}

#[test]
fn from_non_member_is_not_skipped() {
    let index = indexed(&["a", "b", "c", "x", "y", "z"]);
    // "bb" is not a member: start at the first key after it, no skip.
    assert_eq!(index.keys("bb", 99), vec!["c", "x", "y", "z"]);
}

#[test]
fn paging_with_the_last_key_resumes() {
    let index = indexed(&["a", "b", "c", "d", "e"]);
    let first = index.keys("", 2);
    assert_eq!(first, vec!["a", "b"]);
    let second = index.keys(first.last().unwrap(), 3);
    assert_eq!(second, vec!["c", "d"]);
}

#[test]
fn n_limits_result_length() {
    let index = indexed(&["a", "b", "c", "d"]);
    assert_eq!(index.keys("", 2), vec!["a", "b"]);
    assert_eq!(index.keys("", 0), Vec::<String>::new());
}

#[test]
fn insert_and_delete_are_idempotent() {
    let index = indexed(&[]);
    index.insert("k");
    index.insert("k");
    assert_eq!(index.keys("", 10), vec!["k"]);

    index.delete("k");
    index.delete("k");
    assert!(index.keys("", 10).is_empty());
}

#[test]
fn empty_index_yields_nothing() {
    let index = indexed(&[]);
    assert!(index.keys("", 10).is_empty());
    assert!(index.keys("anything", 10).is_empty());
}

#[test]
fn custom_order_is_respected() {
    let index = BTreeIndex::new();
    let reverse: LessFn = Arc::new(|a: &str, b: &str| a > b);
    index.initialize(reverse, &mut ["a", "b", "c"].iter().map(|k| k.to_string()));
    assert_eq!(index.keys("", 10), vec!["c", "b", "a"]);
}

#[test]
fn reinitialize_replaces_contents() {
    let index = indexed(&["a", "b"]);
    index.initialize(string_less(), &mut ["x"].iter().map(|k| k.to_string()));
    assert_eq!(index.keys("", 10), vec!["x"]);
}

#[test]
#[should_panic(expected = "uninitialized index")]
fn insert_before_initialize_panics() {
    BTreeIndex::new().insert("k");
}
