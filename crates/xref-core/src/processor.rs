//! Multi-TU processor: the shared state handed to every indexing worker,
//! and the single-threaded output driver run after they have all joined.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::files::{FileEntry, FileHandle, FileTable};
use crate::highlight::Markup;
use crate::path_map::PathMap;
use crate::render::render_code;
use crate::symbols::{SymbolDeclaration, SymbolRegistry};
use crate::template::{RenderContext, Template};
use crate::{CoreError, Result};

/// Tries to attach an external URL to a markup, given the front end's cursor
/// for the referenced entity. Must be callable from any worker thread.
pub type ExternalRefLinker<C> = Box<dyn Fn(&mut Markup, &C) + Send + Sync>;

/// Counters reported by [`XrefIndex::write_output`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputStats {
    /// Files rendered through the template.
    pub files_written: usize,
    /// Entries that were referenced but never populated by any TU.
    pub files_skipped: usize,
}

/// Cross-reference state shared by all indexing workers.
///
/// Everything taking `&self` is safe to call concurrently. The output phase
/// takes `&mut self`, so it can only start once no worker borrows the index.
pub struct XrefIndex<C> {
    files: FileTable,
    symbols: SymbolRegistry,
    ref_linker: ExternalRefLinker<C>,
}

impl<C> XrefIndex<C> {
    pub fn new(path_map: PathMap, ref_linker: ExternalRefLinker<C>) -> Self {
        Self {
            files: FileTable::new(path_map),
            symbols: SymbolRegistry::new(),
            ref_linker,
        }
    }

    /// An index whose external linker never links anything.
    pub fn without_external_links(path_map: PathMap) -> Self {
        Self::new(path_map, Box::new(|_: &mut Markup, _: &C| {}))
    }

    pub fn files(&self) -> &FileTable {
        &self.files
    }

    pub fn symbols(&self) -> &SymbolRegistry {
        &self.symbols
    }

    pub fn path_map(&self) -> &PathMap {
        self.files.path_map()
    }

    pub fn is_file_included(&self, path: &Path) -> bool {
        self.files.is_file_included(path)
    }

    /// See [`FileTable::obtain_file_entry`].
    pub fn obtain_file_entry(&self, file: &impl FileHandle) -> Option<Arc<FileEntry>> {
        self.files.obtain_file_entry(file)
    }

    /// See [`FileTable::prepare_to_process`].
    pub fn prepare_to_process(&self, file: &impl FileHandle) -> Option<Arc<FileEntry>> {
        self.files.prepare_to_process(file)
    }

    /// Reference the symbol at `offset` in `file`; `None` if the file is excluded.
    ///
    /// Pass line 0 and [`crate::WHOLE_FILE`] to reference the file as a whole.
    pub fn reference_symbol<F>(
        &self,
        file: &impl FileHandle,
        line: u32,
        offset: u32,
        namer: F,
    ) -> Option<Arc<SymbolDeclaration>>
    where
        F: FnOnce() -> String,
    {
        let entry = self.files.obtain_file_entry(file)?;
        Some(self.symbols.reference_symbol(&entry, line, offset, namer))
    }

    pub fn register_def(&self, usr: String, def: &Arc<SymbolDeclaration>) {
        self.symbols.register_def(usr, def);
    }

    pub fn find_missing_def(&self, usr: &str) -> Option<Arc<SymbolDeclaration>> {
        self.symbols.find_missing_def(usr)
    }

    pub fn link_external_ref(&self, markup: &mut Markup, cursor: &C) {
        (self.ref_linker)(markup, cursor);
    }

    /// Render every populated file through `tpl`.
    ///
    /// Output files are created (with their directories) at the output path
    /// the [`PathMap`] assigned to each entry.
    #[instrument(skip_all, level = "debug")]
    pub fn write_output(&mut self, tpl: &dyn Template) -> Result<OutputStats> {
        let mut stats = OutputStats::default();

        for entry in self.files.entries() {
            let hl = entry.highlighted();
            let content = hl.content();
            if content.text.is_none() {
                debug!(file = %hl.display_name(), "never populated, skipping");
                stats.files_skipped += 1;
                continue;
            }

            let code = render_code(hl.output_path(), &content, &self.symbols);
            drop(content);

            let ctx = RenderContext {
                filename: hl.display_name(),
                rootpath: hl.root_path(),
                code: &code,
            };
            write_file(hl.output_path(), |out| tpl.render(&ctx, out))?;
            debug!(file = %hl.display_name(), output = %hl.output_path().display(), "written");
            stats.files_written += 1;
        }

        info!(
            written = stats.files_written,
            skipped = stats.files_skipped,
            symbols = self.symbols.len(),
            "output complete"
        );
        Ok(stats)
    }
}

fn write_file<F>(path: &Path, render: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let wrap = |source| CoreError::Output {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    let mut out = BufWriter::new(File::create(path).map_err(wrap)?);
    render(&mut out).map_err(wrap)?;
    out.flush().map_err(wrap)
}
