//! Store error taxonomy.
//!
//! Everything a store operation can fail with. Filesystem and compression
//! failures are surfaced verbatim inside [`StoreError::Io`], prefixed with
//! the pipeline step that hit them. Violated internal invariants are not
//! errors — they panic.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is the empty string.
    #[error("empty key")]
    EmptyKey,

    /// The key transforms to an illegal path, or an erase target resolves
    /// to a directory.
    #[error("bad key")]
    BadKey,

    /// No file on disk for this key.
    #[error("key not found")]
    NotFound,

    /// Import source is a directory.
    #[error("can't import a directory")]
    ImportDirectory,

    /// A filesystem or compression failure, prefixed with the operation
    /// that hit it.
    #[error("{op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(op: &'static str, source: io::Error) -> Self {
        StoreError::Io { op, source }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
