//! # xref-core
//!
//! Concurrent cross-reference core for indexing many translation units (TUs)
//! that were parsed independently by an external front end.
//!
//! The crate has two phases with a hard boundary between them:
//!
//! ```text
//!  indexing (many threads)                 output (one thread)
//!  ┌──────────────────────────────┐        ┌──────────────────────────┐
//!  │ obtain_file_entry            │        │ write_output(&mut self)  │
//!  │ prepare_to_process (claim)   │  join  │   render every claimed   │
//!  │ reference_symbol / register  │ ─────► │   HighlightedFile through│
//!  │ link_external_ref            │        │   a Template             │
//!  └──────────────────────────────┘        └──────────────────────────┘
//! ```
//!
//! During indexing only the bookkeeping maps are synchronized (`DashMap`
//! shards); naming a new symbol and populating a claimed file run outside
//! any map lock. Reading declaration contents is deferred to the output
//! phase, which takes `&mut XrefIndex` and therefore cannot overlap with
//! workers that borrow the index.

mod files;
mod highlight;
mod path_map;
mod processor;
mod render;
mod string;
mod symbols;
mod template;

pub use files::{FileEntry, FileHandle, FileId, FileTable};
pub use highlight::{FileContent, HighlightedFile, Link, Markup, TokenKind};
pub use path_map::{relative_href, MappedFile, PathMap, RootMapping};
pub use processor::{ExternalRefLinker, OutputStats, XrefIndex};
pub use render::render_code;
pub use string::{ParserString, StringProvider};
pub use symbols::{SymbolDeclaration, SymbolId, SymbolRegistry, WHOLE_FILE};
pub use template::{RenderContext, SimpleTemplate, Template, DEFAULT_TEMPLATE};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the output phase.
///
/// The indexing operations never fail: an excluded file is reported as
/// `None` and duplicate inserts resolve to the first writer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to write output file {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
