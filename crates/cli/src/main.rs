//! # CLI - CoveKV Interactive Shell
//!
//! A REPL-style command-line interface for the CoveKV store. Reads
//! commands from stdin, executes them against the engine, and prints
//! results to stdout. Designed for both interactive use and scripted
//! testing (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! SET key value          Write a value under a key
//! GET key                Read a key (prints value or "(nil)")
//! DEL key                Erase a key and prune empty directories
//! HAS key                Print "true"/"false"
//! KEYS [prefix]          Enumerate keys, optionally by prefix
//! LIST [from] [n]        Page through the sorted index (needs COVE_INDEX)
//! IMPORT path key [MOVE] Stage an existing file under a key
//! CLEAR                  Remove the whole store
//! STATS                  Print engine debug info
//! EXIT / QUIT            Shut down
//! ```
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables:
//!
//! ```text
//! COVE_BASE      Base directory            (default: "data/covekv")
//! COVE_CACHE_KB  Read-cache budget in KiB  (default: 1024)
//! COVE_TEMP_DIR  Write-staging directory   (default: unset)
//! COVE_COMPRESS  none | zstd | snappy      (default: "none")
//! COVE_INDEX     Keep a sorted key index   (default: "false")
//! COVE_SYNC      fsync every write         (default: "false")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! CoveKV started (base=data/covekv, cache=1024KiB, compress=none)
//! > SET name Alice
//! OK
//! > GET name
//! Alice
//! > KEYS
//! name
//! (1 keys)
//! > EXIT
//! bye
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use engine::{BTreeIndex, Engine, Index, LessFn, Options, Snappy, StoreError, Zstd};

/// Reads a configuration value from the environment, falling back to
/// `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn build_engine() -> Result<(Engine, Option<Arc<BTreeIndex>>, bool)> {
    let base = env_or("COVE_BASE", "data/covekv");
    let cache_kb: u64 = env_or("COVE_CACHE_KB", "1024").parse().unwrap_or(1024);
    let temp_dir = std::env::var("COVE_TEMP_DIR").ok().map(Into::into);
    let sync: bool = env_or("COVE_SYNC", "false").parse().unwrap_or(false);

    let compression: Option<Box<dyn engine::Compression>> =
        match env_or("COVE_COMPRESS", "none").as_str() {
            "none" => None,
            "zstd" => Some(Box::new(Zstd::new())),
            "snappy" => Some(Box::new(Snappy::new())),
            other => bail!("COVE_COMPRESS must be none, zstd, or snappy (got {other:?})"),
        };

    let indexed: bool = env_or("COVE_INDEX", "false").parse().unwrap_or(false);
    let index = indexed.then(|| Arc::new(BTreeIndex::new()));

    let store = Engine::new(Options {
        base_path: base.into(),
        cache_size_max: cache_kb * 1024,
        temp_dir,
        compression,
        index: index.clone().map(|ix| ix as Arc<dyn Index>),
        index_less: indexed.then(|| Arc::new(|a: &str, b: &str| a < b) as LessFn),
        ..Default::default()
    });

    Ok((store, index, sync))
}

fn main() -> Result<()> {
    let (store, index, sync) = build_engine()?;

    println!(
        "CoveKV started (base={}, cache={}KiB, compress={})",
        store.base_path().display(),
        store.cache_max() / 1024,
        env_or("COVE_COMPRESS", "none"),
    );
    println!("Commands: SET key value | GET key | DEL key | HAS key | KEYS [prefix]");
    println!("          LIST [from] [n] | IMPORT path key [MOVE] | CLEAR | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "SET" => {
                    if let Some(key) = parts.next() {
                        let value: String = parts.collect::<Vec<&str>>().join(" ");
                        if value.is_empty() {
                            println!("ERR usage: SET key value");
                        } else {
                            match store.write_stream(key, value.as_bytes(), sync) {
                                Ok(()) => println!("OK"),
                                Err(e) => println!("ERR {e}"),
                            }
                        }
                    } else {
                        println!("ERR usage: SET key value");
                    }
                }
                "GET" => match parts.next() {
                    Some(key) => match store.read_string(key) {
                        Ok(value) => println!("{value}"),
                        Err(StoreError::NotFound) => println!("(nil)"),
                        Err(e) => println!("ERR {e}"),
                    },
                    None => println!("ERR usage: GET key"),
                },
                "DEL" => match parts.next() {
                    Some(key) => match store.erase(key) {
                        Ok(()) => println!("OK"),
                        Err(e) => println!("ERR {e}"),
                    },
                    None => println!("ERR usage: DEL key"),
                },
                "HAS" => match parts.next() {
                    Some(key) => println!("{}", store.has(key)),
                    None => println!("ERR usage: HAS key"),
                },
                "KEYS" => {
                    let prefix = parts.next().unwrap_or("");
                    let mut count = 0usize;
                    for key in store.keys_prefix(prefix, None) {
                        println!("{key}");
                        count += 1;
                    }
                    println!("({count} keys)");
                }
                "LIST" => match &index {
                    Some(index) => {
                        let from = parts.next().unwrap_or("");
                        let n: usize = parts.next().and_then(|s| s.parse().ok()).unwrap_or(100);
                        let keys = index.keys(from, n);
                        for key in &keys {
                            println!("{key}");
                        }
                        println!("({} keys)", keys.len());
                    }
                    None => println!("ERR no index (set COVE_INDEX=true)"),
                },
                "IMPORT" => {
                    let (src, key) = (parts.next(), parts.next());
                    let move_src = parts
                        .next()
                        .map(|flag| flag.eq_ignore_ascii_case("move"))
                        .unwrap_or(false);
                    match (src, key) {
                        (Some(src), Some(key)) => match store.import(src, key, move_src) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERR {e}"),
                        },
                        _ => println!("ERR usage: IMPORT path key [MOVE]"),
                    }
                }
                "CLEAR" => match store.erase_all() {
                    Ok(()) => println!("OK"),
                    Err(e) => println!("ERR {e}"),
                },
                "STATS" => println!("{store:?}"),
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => println!("ERR unknown command {other:?}"),
            }
        }
        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}
