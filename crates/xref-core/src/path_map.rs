//! Source-root to output-root mapping.
//!
//! A file takes part in the index only if it lives under one of the
//! configured source roots. The first matching root wins, so more specific
//! roots should be listed before their parents.

use std::path::{Component, Path, PathBuf};

/// One `(source root, output root)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootMapping {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// Where an included source file ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedFile {
    /// `output_root/<relative path>.html`
    pub output_path: PathBuf,
    /// Path relative to the common prefix of all source roots, `/`-separated.
    pub display_name: String,
    /// Relative URL from the output file back to its output root (`""` or `"../../"`).
    pub root_path: String,
}

/// Ordered set of root mappings. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct PathMap {
    roots: Vec<RootMapping>,
    common_source_root: PathBuf,
}

impl PathMap {
    pub fn new<I, S, O>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, O)>,
        S: Into<PathBuf>,
        O: Into<PathBuf>,
    {
        let roots: Vec<RootMapping> = pairs
            .into_iter()
            .map(|(source, output)| RootMapping {
                source: source.into(),
                output: output.into(),
            })
            .collect();
        let common_source_root = common_prefix(roots.iter().map(|r| r.source.as_path()));
        Self {
            roots,
            common_source_root,
        }
    }

    pub fn roots(&self) -> &[RootMapping] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Longest common directory prefix of all source roots.
    pub fn common_source_root(&self) -> &Path {
        &self.common_source_root
    }

    /// First root whose source directory strictly contains `path`.
    pub fn mapping_for(&self, path: &Path) -> Option<&RootMapping> {
        self.roots
            .iter()
            .find(|root| path.starts_with(&root.source) && path != root.source)
    }

    pub fn is_file_included(&self, path: &Path) -> bool {
        self.mapping_for(path).is_some()
    }

    /// Output location and display data for `path`, `None` if excluded.
    pub fn map_file(&self, path: &Path) -> Option<MappedFile> {
        let root = self.mapping_for(path)?;
        let relative = path.strip_prefix(&root.source).ok()?;

        let mut file_name = relative.as_os_str().to_owned();
        file_name.push(".html");
        let output_path = root.output.join(file_name);

        let depth = relative.components().count().saturating_sub(1);
        let root_path = "../".repeat(depth);

        let display_name = path
            .strip_prefix(&self.common_source_root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Some(MappedFile {
            output_path,
            display_name,
            root_path,
        })
    }
}

fn common_prefix<'a>(mut paths: impl Iterator<Item = &'a Path>) -> PathBuf {
    let Some(first) = paths.next() else {
        return PathBuf::new();
    };
    let mut prefix: Vec<Component<'a>> = first.components().collect();
    for path in paths {
        let shared = prefix
            .iter()
            .zip(path.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        prefix.truncate(shared);
    }
    prefix.iter().collect()
}

/// Relative URL from output file `from` to output file `to`.
///
/// Returns an empty string when both name the same file, so callers can
/// append a bare `#fragment`.
pub fn relative_href(from: &Path, to: &Path) -> String {
    if from == to {
        return String::new();
    }
    let from_dir: Vec<Component<'_>> = from
        .parent()
        .map(|p| p.components().collect())
        .unwrap_or_default();
    let to_parts: Vec<Component<'_>> = to.components().collect();

    let shared = from_dir
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat("..".to_string()).take(from_dir.len() - shared));
    parts.extend(
        to_parts[shared..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}
