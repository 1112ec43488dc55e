//! Collect TU dump files from command-line arguments.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

fn is_dump(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Expand `args` into dump files: files are taken as given, directories are
/// walked for `*.json`. The result is sorted and deduplicated.
pub fn collect_dumps(args: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut dumps = Vec::new();
    for arg in args {
        if arg.is_dir() {
            for entry in WalkDir::new(arg).follow_links(true) {
                let entry = entry.with_context(|| format!("Failed to walk {}", arg.display()))?;
                if entry.file_type().is_file() && is_dump(entry.path()) {
                    dumps.push(entry.into_path());
                }
            }
        } else if arg.is_file() {
            dumps.push(arg.clone());
        } else {
            bail!("No such file or directory: {}", arg.display());
        }
    }
    dumps.sort();
    dumps.dedup();
    Ok(dumps)
}
