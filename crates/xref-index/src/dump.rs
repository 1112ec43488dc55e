//! JSON record of what the front end reported for one translation unit.
//!
//! ```json
//! {
//!   "name": "lib/a.cpp",
//!   "files": ["/src/lib/a.cpp", "/src/include/a.hpp"],
//!   "tokens": [{ "file": 0, "begin": 0, "end": 3, "kind": "keyword" }],
//!   "cursors": [{
//!     "file": 0, "line": 1, "offset": 4, "end": 7, "spelling": "foo",
//!     "usr": "c:@F@foo", "is_definition": false,
//!     "referenced": { "file": 1, "line": 3, "offset": 5, "usr": "c:@F@foo" }
//!   }],
//!   "includes": [{ "file": 0, "begin": 10, "end": 19, "target": 1 }]
//! }
//! ```
//!
//! File references are indices into `files`.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use xref_core::{FileHandle, FileId};

use crate::{IndexError, Result};

/// One TU as reported by the front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TuDump {
    /// Human-readable unit name for logs (usually the main file).
    pub name: Option<String>,
    /// Every file the TU touched. Relative paths are taken relative to the dump.
    pub files: Vec<PathBuf>,
    pub tokens: Vec<TokenRecord>,
    pub cursors: Vec<CursorRecord>,
    pub includes: Vec<IncludeRecord>,
}

/// A lexical token span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub file: usize,
    pub begin: u32,
    pub end: u32,
    pub kind: String,
}

/// An AST node that names an entity: a declaration or a reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorRecord {
    pub file: usize,
    pub line: u32,
    pub offset: u32,
    pub end: u32,
    pub spelling: String,
    /// External unique symbol id of the entity this cursor names.
    pub usr: Option<String>,
    pub is_definition: bool,
    /// Token kind override (`"function"`, `"type"`, ...).
    pub kind: Option<String>,
    /// Location of the referenced declaration, for references.
    pub referenced: Option<LocationRecord>,
}

/// Where a referenced entity is declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationRecord {
    /// `None` for entities without a source file (builtins).
    pub file: Option<usize>,
    pub line: u32,
    pub offset: u32,
    pub usr: Option<String>,
}

/// An `#include`-style directive, linked to the target file as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeRecord {
    pub file: usize,
    pub begin: u32,
    pub end: u32,
    pub target: usize,
}

/// A dump file resolved to its canonical path and identity.
#[derive(Debug, Clone)]
pub struct DumpFile {
    id: FileId,
    path: PathBuf,
}

impl DumpFile {
    /// Resolve `path` against `base` and canonicalize it when possible.
    pub fn resolve(path: &Path, base: &Path) -> Self {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };
        let path = joined.canonicalize().unwrap_or(joined);
        Self {
            id: FileId::for_path(&path),
            path,
        }
    }
}

impl FileHandle for DumpFile {
    fn unique_id(&self) -> Option<FileId> {
        Some(self.id)
    }

    fn path(&self) -> Cow<'_, Path> {
        Cow::Borrowed(&self.path)
    }
}

impl TuDump {
    /// Read and validate a dump from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut dump: TuDump =
            serde_json::from_str(&contents).map_err(|source| IndexError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        if dump.name.is_none() {
            dump.name = Some(path.display().to_string());
        }
        dump.validate()?;
        Ok(dump)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// Check that every file reference is in range.
    pub fn validate(&self) -> Result<()> {
        let count = self.files.len();
        let refs = self
            .tokens
            .iter()
            .map(|t| t.file)
            .chain(self.cursors.iter().map(|c| c.file))
            .chain(
                self.cursors
                    .iter()
                    .filter_map(|c| c.referenced.as_ref().and_then(|r| r.file)),
            )
            .chain(self.includes.iter().flat_map(|i| [i.file, i.target]));

        for index in refs {
            if index >= count {
                return Err(IndexError::FileRef {
                    unit: self.display_name().to_string(),
                    index,
                    count,
                });
            }
        }
        Ok(())
    }

    /// Resolve every listed file relative to `base`.
    pub fn resolve_files(&self, base: &Path) -> Vec<DumpFile> {
        self.files.iter().map(|p| DumpFile::resolve(p, base)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "a.cpp",
        "files": ["/src/a.cpp", "/src/a.hpp"],
        "tokens": [{ "file": 0, "begin": 0, "end": 3, "kind": "keyword" }],
        "cursors": [{
            "file": 0, "line": 1, "offset": 4, "end": 7, "spelling": "foo",
            "usr": "c:@F@foo",
            "referenced": { "file": 1, "line": 3, "offset": 5 }
        }],
        "includes": [{ "file": 0, "begin": 10, "end": 19, "target": 1 }]
    }"#;

    #[test]
    fn test_parse_sample() {
        let dump: TuDump = serde_json::from_str(SAMPLE).unwrap();
        dump.validate().unwrap();
        assert_eq!(dump.display_name(), "a.cpp");
        assert_eq!(dump.files.len(), 2);
        let cursor = &dump.cursors[0];
        assert!(!cursor.is_definition);
        assert_eq!(cursor.kind, None);
        assert_eq!(cursor.referenced.as_ref().unwrap().file, Some(1));
        assert_eq!(cursor.referenced.as_ref().unwrap().usr, None);
    }

    #[test]
    fn test_out_of_range_file_reference() {
        let dump: TuDump = serde_json::from_str(
            r#"{ "files": ["/src/a.c"], "includes": [{ "file": 0, "begin": 0, "end": 1, "target": 3 }] }"#,
        )
        .unwrap();
        let err = dump.validate().unwrap_err();
        assert!(matches!(
            err,
            IndexError::FileRef {
                index: 3,
                count: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_resolve_relative_file() {
        let file = DumpFile::resolve(Path::new("src/a.c"), Path::new("/nonexistent/base"));
        assert_eq!(file.path(), Path::new("/nonexistent/base/src/a.c"));
        assert_eq!(
            file.unique_id(),
            Some(FileId::for_path(Path::new("/nonexistent/base/src/a.c")))
        );
    }
}
