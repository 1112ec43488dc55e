//! Parallel multi-TU indexing using Rayon
//!
//! Every TU dump is loaded and processed by one pool worker. All workers
//! share the same [`DumpIndex`]; the call returns only after the pool has
//! drained, which is the phase boundary before output.
//!
//! # Thread Pool Configuration
//!
//! Default thread count is half of the CPU cores, clamped to
//! `1..=MAX_INDEX_THREADS`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{info, warn};

use crate::dump::TuDump;
use crate::unit::process_tu;
use crate::{DumpIndex, Result};

/// Maximum threads used when no count is configured
pub const MAX_INDEX_THREADS: usize = 8;

/// Calculate default thread count: min(cpu_cores / 2, MAX_INDEX_THREADS)
pub fn default_thread_count() -> usize {
    (num_cpus::get() / 2).clamp(1, MAX_INDEX_THREADS)
}

/// Create a thread pool with specified thread count
fn create_thread_pool(threads: Option<usize>) -> Result<ThreadPool> {
    let num_threads = threads.unwrap_or_else(default_thread_count).max(1);
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("xref-index-{}", i))
        .build()?)
}

/// Result of a multi-TU indexing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// TUs loaded and processed
    pub units_ok: usize,
    /// TUs whose dump could not be loaded; they contribute nothing
    pub units_failed: usize,
    /// Files populated across all TUs
    pub files_claimed: usize,
    /// Definitions registered across all TUs
    pub definitions: usize,
}

/// Index every TU dump in `units` in parallel.
///
/// A dump that fails to load is logged and skipped. Relative file paths
/// inside a dump are resolved against the dump's directory.
///
/// # Arguments
///
/// * `index` - Shared index receiving all references and definitions
/// * `units` - Paths of TU dump files
/// * `threads` - Number of threads (None = use default: min(cpu/2, 8))
pub fn index_units(
    index: &DumpIndex,
    units: &[PathBuf],
    threads: Option<usize>,
) -> Result<IndexStats> {
    let pool = create_thread_pool(threads)?;

    let units_ok = AtomicUsize::new(0);
    let units_failed = AtomicUsize::new(0);
    let files_claimed = AtomicUsize::new(0);
    let definitions = AtomicUsize::new(0);

    pool.install(|| {
        units.par_iter().for_each(|path| {
            let base = path.parent().unwrap_or(Path::new(""));
            match TuDump::from_path(path).and_then(|dump| process_tu(index, &dump, base)) {
                Ok(stats) => {
                    units_ok.fetch_add(1, Ordering::Relaxed);
                    files_claimed.fetch_add(stats.files_claimed, Ordering::Relaxed);
                    definitions.fetch_add(stats.definitions, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!(unit = %path.display(), error = %e, "skipping translation unit");
                    units_failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        })
    });

    let stats = IndexStats {
        units_ok: units_ok.load(Ordering::Relaxed),
        units_failed: units_failed.load(Ordering::Relaxed),
        files_claimed: files_claimed.load(Ordering::Relaxed),
        definitions: definitions.load(Ordering::Relaxed),
    };
    info!(
        ok = stats.units_ok,
        failed = stats.units_failed,
        files = stats.files_claimed,
        definitions = stats.definitions,
        "indexing complete"
    );
    Ok(stats)
}
