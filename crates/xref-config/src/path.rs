//! Path normalization for configured roots.
//!
//! Source roots are compared against the canonical paths reported by the
//! front end, so they must be canonical too. Output roots usually do not
//! exist yet and are only made absolute.

use std::path::{Path, PathBuf};

/// Normalize path, falling back to the original if canonicalization fails.
///
/// This is useful when the path might not exist and that's acceptable.
pub fn normalize_or_original(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Absolute form of `path` without touching the filesystem.
///
/// Relative paths are joined onto the current directory; if that cannot be
/// determined the path is returned unchanged.
pub fn absolutize(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_or_original_returns_original_on_failure() {
        let fake_path = Path::new("/nonexistent/path/file.txt");
        let result = normalize_or_original(fake_path);
        assert_eq!(result, fake_path);
    }

    #[test]
    fn test_normalize_or_original_resolves_dots() {
        let temp = tempdir().unwrap();
        let sub = temp.path().join("a");
        fs::create_dir(&sub).unwrap();

        let dotted = sub.join("..").join("a");
        assert_eq!(normalize_or_original(&dotted), sub.canonicalize().unwrap());
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(absolutize("/out/html"), PathBuf::from("/out/html"));
        let rel = absolutize("html");
        assert!(rel.is_absolute());
        assert!(rel.ends_with("html"));
    }
}
