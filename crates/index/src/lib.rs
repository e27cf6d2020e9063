//! # Index — an ordered view of the keys on disk
//!
//! The engine keeps values as files and has no inherent key ordering. An
//! [`Index`] is an optional in-memory sorted set over exactly the keys
//! currently stored, maintained by the engine on every mutation and seeded
//! with a full enumeration at startup.
//!
//! Ordering comes from a caller-supplied strict total order ([`LessFn`]),
//! so the same index type can sort lexically, numerically, by suffix, or
//! however the application's keys demand.
//!
//! [`BTreeIndex`] is the default implementation. It carries its own lock:
//! the engine mutates it under the engine-wide lock, while the application
//! can hold a second handle and page through [`Index::keys`] concurrently.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;

/// A strict total order over keys: `less(a, b)` iff `a` sorts before `b`.
pub type LessFn = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// An ordered set of keys, queryable by "up to `n` keys at or after a
/// cursor".
pub trait Index: Send + Sync {
    /// Supplies the ordering and an initial key enumeration. Meant to be
    /// called once per instance; calling again replaces the contents.
    fn initialize(&self, less: LessFn, keys: &mut dyn Iterator<Item = String>);

    /// Adds `key` to the set. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if the index has not been initialized.
    fn insert(&self, key: &str);

    /// Removes `key` from the set. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if the index has not been initialized.
    fn delete(&self, key: &str);

    /// Returns up to `n` keys in ascending order, starting at the first
    /// key at-or-after `from` (the smallest key when `from` is empty),
    /// and skipping `from` itself when it is a member — a resumable
    /// cursor: page with the last key of the previous call. Returns a
    /// fresh `Vec` per call.
    ///
    /// # Panics
    ///
    /// Panics if the index has not been initialized.
    fn keys(&self, from: &str, n: usize) -> Vec<String>;
}

/// A set element carrying the comparator it sorts under.
///
/// `BTreeSet` compares through `Ord`, so every element holds a handle to
/// the shared [`LessFn`] and derives equality from it: two keys are equal
/// iff neither sorts before the other.
struct OrdKey {
    key: String,
    less: LessFn,
}

impl PartialEq for OrdKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrdKey {}

impl PartialOrd for OrdKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdKey {
    fn cmp(&self, other: &Self) -> Ordering {
        if (self.less)(&self.key, &other.key) {
            Ordering::Less
        } else if (self.less)(&other.key, &self.key) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

struct Inner {
    less: LessFn,
    set: BTreeSet<OrdKey>,
}

impl Inner {
    fn probe(&self, key: &str) -> OrdKey {
        OrdKey {
            key: key.to_string(),
            less: Arc::clone(&self.less),
        }
    }
}

/// The default [`Index`]: a balanced ordered set (`BTreeSet`) under a
/// read-write lock. `insert`, `delete`, and `keys` are `O(log N + result)`.
#[derive(Default)]
pub struct BTreeIndex {
    inner: RwLock<Option<Inner>>,
}

impl BTreeIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Index for BTreeIndex {
    fn initialize(&self, less: LessFn, keys: &mut dyn Iterator<Item = String>) {
        let set = keys
            .map(|key| OrdKey {
                key,
                less: Arc::clone(&less),
            })
            .collect();
        *self.inner.write() = Some(Inner { less, set });
    }

    fn insert(&self, key: &str) {
        let mut guard = self.inner.write();
        let inner = guard.as_mut().expect("uninitialized index");
        let probe = inner.probe(key);
        inner.set.replace(probe);
    }

    fn delete(&self, key: &str) {
        let mut guard = self.inner.write();
        let inner = guard.as_mut().expect("uninitialized index");
        let probe = inner.probe(key);
        inner.set.remove(&probe);
    }

    fn keys(&self, from: &str, n: usize) -> Vec<String> {
        let guard = self.inner.read();
        let inner = guard.as_ref().expect("uninitialized index");
        if inner.set.is_empty() {
            return Vec::new();
        }

        let probe = inner.probe(from);
        let member = !from.is_empty() && inner.set.contains(&probe);

        // The scan starts at the first key at-or-after `from`; when
        // `from` is itself a member the leading element is dropped below,
        // yielding strictly-after semantics. An absent `from` is just a
        // position, nothing to skip.
        let range: Box<dyn Iterator<Item = &OrdKey>> = if from.is_empty() {
            Box::new(inner.set.iter())
        } else {
            Box::new(inner.set.range((Bound::Included(&probe), Bound::Unbounded)))
        };

        let mut keys: Vec<String> = range.take(n).map(|k| k.key.clone()).collect();
        if member && !keys.is_empty() {
            keys.remove(0);
        }
        keys
    }
}

#[cfg(test)]
mod tests;
