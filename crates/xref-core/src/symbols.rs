//! Symbol Registry: deduplicated declarations keyed by (file, byte offset),
//! plus the definition index keyed by external symbol id.
//!
//! # Ordering contract
//!
//! A declaration becomes visible to other threads as soon as its map insert
//! completes, but its name is filled in afterwards by the inserting thread,
//! outside the shard lock. Nothing may read `file_unique_name()` before the
//! single-threaded output phase; until then only the declaration's identity
//! (pointer, [`SymbolId`]) is meaningful.

use std::sync::{Arc, OnceLock, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::files::{FileEntry, FileId};

/// Offset sentinel for references to a file as a whole (e.g. includes).
pub const WHOLE_FILE: u32 = u32::MAX;

/// Identity of a declaration: owning file and byte offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId {
    pub file: FileId,
    pub offset: u32,
}

impl SymbolId {
    pub fn is_whole_file(&self) -> bool {
        self.offset == WHOLE_FILE
    }
}

/// One declaration. Created exactly once per [`SymbolId`].
#[derive(Debug)]
pub struct SymbolDeclaration {
    id: SymbolId,
    file: Weak<FileEntry>,
    line: u32,
    file_unique_name: OnceLock<String>,
}

impl SymbolDeclaration {
    fn new(id: SymbolId, file: &Arc<FileEntry>, line: u32) -> Self {
        Self {
            id,
            file: Arc::downgrade(file),
            line,
            file_unique_name: OnceLock::new(),
        }
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    /// Owning file entry; `None` only after the file table was dropped.
    pub fn file(&self) -> Option<Arc<FileEntry>> {
        self.file.upgrade()
    }

    /// Line of the first observation (0 for whole-file references).
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Display name, unique within the owning file. Output phase only.
    pub fn file_unique_name(&self) -> &str {
        self.file_unique_name.get().map(String::as_str).unwrap_or("")
    }

    pub fn is_whole_file(&self) -> bool {
        self.id.is_whole_file()
    }
}

/// Concurrent declaration map and definition index.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    symbols: DashMap<SymbolId, Arc<SymbolDeclaration>>,
    defs: DashMap<String, Arc<SymbolDeclaration>>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up or create the declaration at `(entry, offset)`.
    ///
    /// Only the caller whose insert creates the declaration runs `namer`, and
    /// it does so after the shard lock is released. Line and name of later
    /// callers are discarded.
    pub fn reference_symbol<F>(
        &self,
        entry: &Arc<FileEntry>,
        line: u32,
        offset: u32,
        namer: F,
    ) -> Arc<SymbolDeclaration>
    where
        F: FnOnce() -> String,
    {
        let id = SymbolId {
            file: entry.id(),
            offset,
        };

        let (decl, inserted) = match self.symbols.entry(id) {
            Entry::Occupied(existing) => (Arc::clone(existing.get()), false),
            Entry::Vacant(slot) => {
                let decl = Arc::new(SymbolDeclaration::new(id, entry, line));
                slot.insert(Arc::clone(&decl));
                (decl, true)
            }
        };

        if inserted {
            let name = namer();
            trace!(file = %id.file, offset, name = %name, "new symbol");
            // Only the inserting thread reaches this, so the cell is empty.
            let _ = decl.file_unique_name.set(name);
        }
        decl
    }

    /// Record `def` as the definition of `usr`. Last registration wins.
    pub fn register_def(&self, usr: String, def: &Arc<SymbolDeclaration>) {
        if let Some(previous) = self.defs.insert(usr, Arc::clone(def)) {
            if !Arc::ptr_eq(&previous, def) {
                debug!(
                    file = %def.id().file,
                    offset = def.id().offset,
                    "definition re-registered with a different declaration"
                );
            }
        }
    }

    /// Definition registered for `usr`, if any.
    ///
    /// Meant for the output phase, after every TU contributed its definitions.
    pub fn find_missing_def(&self, usr: &str) -> Option<Arc<SymbolDeclaration>> {
        self.defs.get(usr).map(|d| Arc::clone(d.value()))
    }

    pub fn get(&self, id: &SymbolId) -> Option<Arc<SymbolDeclaration>> {
        self.symbols.get(id).map(|d| Arc::clone(d.value()))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn definition_count(&self) -> usize {
        self.defs.len()
    }
}
