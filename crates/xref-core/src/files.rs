//! File Entry Table: one entry per physical file, created lazily.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::highlight::HighlightedFile;
use crate::path_map::PathMap;

/// Identity of a physical file, stable for one run.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId([u8; 32]);

impl FileId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// BLAKE3 hash of the path bytes. Callers should canonicalize first.
    pub fn for_path(path: &Path) -> Self {
        Self(*blake3::hash(path.as_os_str().as_encoded_bytes()).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..8] {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// A file as reported by the front end.
pub trait FileHandle {
    /// Unique id of the physical file, `None` if the front end cannot tell.
    fn unique_id(&self) -> Option<FileId>;

    /// Canonical path of the file.
    fn path(&self) -> Cow<'_, Path>;
}

/// Claim flag plus the accumulating output of one file.
#[derive(Debug)]
pub struct FileEntry {
    processed: AtomicBool,
    hl_file: HighlightedFile,
}

impl FileEntry {
    pub fn new(hl_file: HighlightedFile) -> Self {
        Self {
            processed: AtomicBool::new(false),
            hl_file,
        }
    }

    pub fn highlighted(&self) -> &HighlightedFile {
        &self.hl_file
    }

    pub fn id(&self) -> FileId {
        self.hl_file.id()
    }

    pub fn is_claimed(&self) -> bool {
        self.processed.load(Ordering::Acquire)
    }

    /// Test-and-set on the claim flag; true only for the first caller.
    fn try_claim(&self) -> bool {
        !self.processed.swap(true, Ordering::AcqRel)
    }
}

/// Maps file identities to their entries.
#[derive(Debug)]
pub struct FileTable {
    path_map: PathMap,
    entries: DashMap<FileId, Arc<FileEntry>>,
}

impl FileTable {
    pub fn new(path_map: PathMap) -> Self {
        Self {
            path_map,
            entries: DashMap::new(),
        }
    }

    pub fn path_map(&self) -> &PathMap {
        &self.path_map
    }

    pub fn is_file_included(&self, path: &Path) -> bool {
        self.path_map.is_file_included(path)
    }

    /// Entry for `file`, created on first use. `None` if the file is excluded.
    ///
    /// Racing callers for the same file all receive the same entry.
    pub fn obtain_file_entry(&self, file: &impl FileHandle) -> Option<Arc<FileEntry>> {
        let id = file.unique_id()?;
        if let Some(existing) = self.entries.get(&id) {
            return Some(Arc::clone(existing.value()));
        }

        let path = file.path();
        let Some(mapped) = self.path_map.map_file(&path) else {
            trace!(path = %path.display(), "excluded file");
            return None;
        };

        let entry = self
            .entries
            .entry(id)
            .or_insert_with(|| {
                Arc::new(FileEntry::new(HighlightedFile::new(
                    id,
                    path.into_owned(),
                    mapped,
                )))
            })
            .value()
            .clone();
        Some(entry)
    }

    /// Claim `file` for structural population.
    ///
    /// Returns the entry only to the first caller for this file; every other
    /// caller, and any caller for an excluded file, gets `None`.
    pub fn prepare_to_process(&self, file: &impl FileHandle) -> Option<Arc<FileEntry>> {
        let entry = self.obtain_file_entry(file)?;
        if entry.try_claim() {
            Some(entry)
        } else {
            trace!(file = %entry.id(), "already claimed");
            None
        }
    }

    pub fn get(&self, id: &FileId) -> Option<Arc<FileEntry>> {
        self.entries.get(id).map(|e| Arc::clone(e.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries ordered by output path.
    pub fn entries(&self) -> Vec<Arc<FileEntry>> {
        let mut all: Vec<Arc<FileEntry>> =
            self.entries.iter().map(|e| Arc::clone(e.value())).collect();
        all.sort_by(|a, b| a.highlighted().output_path().cmp(b.highlighted().output_path()));
        all
    }
}
