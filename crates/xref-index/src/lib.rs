//! # xref-index
//!
//! Feeds translation units into an [`xref_core::XrefIndex`].
//!
//! The front-end parser is external; what it reports about one TU (files,
//! tokens, cursors, includes) arrives as a JSON [`TuDump`]. Each dump is
//! processed by one worker of a Rayon pool, all sharing the same index.

mod driver;
mod dump;
mod unit;

pub use driver::{default_thread_count, index_units, IndexStats, MAX_INDEX_THREADS};
pub use dump::{
    CursorRecord, DumpFile, IncludeRecord, LocationRecord, TokenRecord, TuDump,
};
pub use unit::{file_unique_name, process_tu, UnitStats};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The index type populated from TU dumps; cursors are dump records.
pub type DumpIndex = xref_core::XrefIndex<CursorRecord>;

/// Errors that can occur while loading or processing a TU
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed TU dump {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("TU dump {unit} references file #{index} but lists only {count} files")]
    FileRef {
        unit: String,
        index: usize,
        count: usize,
    },

    #[error("Failed to build indexing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, IndexError>;
