//! Per-file highlighted representation accumulated during indexing.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::files::FileId;
use crate::path_map::MappedFile;
use crate::symbols::SymbolDeclaration;

/// Syntactic class of a token span, rendered as a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenKind {
    #[default]
    Plain,
    Keyword,
    Comment,
    Literal,
    Preprocessor,
    Punctuation,
    Identifier,
    Type,
    Function,
    Variable,
    Macro,
    Namespace,
}

impl TokenKind {
    /// Parse the lowercase name used by front ends (`"keyword"`, `"type"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "plain" => Self::Plain,
            "keyword" => Self::Keyword,
            "comment" => Self::Comment,
            "literal" => Self::Literal,
            "preprocessor" => Self::Preprocessor,
            "punctuation" => Self::Punctuation,
            "identifier" => Self::Identifier,
            "type" => Self::Type,
            "function" => Self::Function,
            "variable" => Self::Variable,
            "macro" => Self::Macro,
            "namespace" => Self::Namespace,
            _ => return None,
        })
    }

    /// CSS class, `None` for plain text.
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::Keyword => Some("kw"),
            Self::Comment => Some("cmt"),
            Self::Literal => Some("lit"),
            Self::Preprocessor => Some("pp"),
            Self::Punctuation => Some("pun"),
            Self::Identifier => Some("id"),
            Self::Type => Some("ty"),
            Self::Function => Some("fn"),
            Self::Variable => Some("var"),
            Self::Macro => Some("mac"),
            Self::Namespace => Some("ns"),
        }
    }
}

/// Hyperlink target of a markup span.
#[derive(Debug, Clone, Default)]
pub enum Link {
    #[default]
    None,
    /// A declaration known to the registry.
    Symbol(Arc<SymbolDeclaration>),
    /// Definition not located yet; resolved by external symbol id at output time.
    MissingDef(String),
    /// Absolute URL supplied by the external reference linker.
    External(String),
}

/// A byte range of the file's text with its annotations.
#[derive(Debug, Clone, Default)]
pub struct Markup {
    pub begin: u32,
    pub end: u32,
    pub kind: TokenKind,
    /// Declaration located at this span; rendered as an `id` attribute.
    pub anchor: Option<Arc<SymbolDeclaration>>,
    pub link: Link,
}

impl Markup {
    pub fn new(begin: u32, end: u32, kind: TokenKind) -> Self {
        Self {
            begin,
            end,
            kind,
            ..Self::default()
        }
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.link = link;
        self
    }

    pub fn with_anchor(mut self, decl: Arc<SymbolDeclaration>) -> Self {
        self.anchor = Some(decl);
        self
    }
}

/// Mutable part of a highlighted file.
#[derive(Debug, Default)]
pub struct FileContent {
    /// Source text, set by the thread that claimed the file.
    pub text: Option<String>,
    pub markups: Vec<Markup>,
}

/// Accumulating output structure for one physical file.
///
/// The claiming thread fills in the text and the token markups; any thread
/// may append reference markups afterwards.
#[derive(Debug)]
pub struct HighlightedFile {
    id: FileId,
    source_path: PathBuf,
    mapped: MappedFile,
    content: Mutex<FileContent>,
}

impl HighlightedFile {
    pub fn new(id: FileId, source_path: PathBuf, mapped: MappedFile) -> Self {
        Self {
            id,
            source_path,
            mapped,
            content: Mutex::new(FileContent::default()),
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn output_path(&self) -> &Path {
        &self.mapped.output_path
    }

    pub fn display_name(&self) -> &str {
        &self.mapped.display_name
    }

    pub fn root_path(&self) -> &str {
        &self.mapped.root_path
    }

    /// Lock the content. A panicking writer does not make the file unusable.
    pub fn content(&self) -> MutexGuard<'_, FileContent> {
        self.content.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_text(&self, text: String) {
        self.content().text = Some(text);
    }

    pub fn has_text(&self) -> bool {
        self.content().text.is_some()
    }

    pub fn add_markup(&self, markup: Markup) {
        self.content().markups.push(markup);
    }

    pub fn extend_markups(&self, markups: impl IntoIterator<Item = Markup>) {
        self.content().markups.extend(markups);
    }
}
