//! Source file access for the parser.
//!
//! The core never touches the filesystem directly: the parser reads the
//! entry file and every `include` target through a [`FileProvider`]. The
//! CLI supplies a filesystem-backed provider; tests use
//! [`MemoryFileProvider`].

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// Capability to read script sources by path.
pub trait FileProvider {
    /// Read the full text of `path`.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Canonical form of `path`, used for include-cycle detection.
    ///
    /// The default keeps the path as given; filesystem providers should
    /// resolve symlinks and relative components.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}

/// An in-memory provider for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryFileProvider {
    files: HashMap<PathBuf, String>,
}

impl MemoryFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file under `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }
}

impl FileProvider for MemoryFileProvider {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }
}

/// The sources read during one compile, keyed by display path.
///
/// Kept so diagnostics from included files can be rendered against the
/// right text. Insertion order is the order files were first read.
#[derive(Debug, Default)]
pub struct SourceSet {
    files: IndexMap<String, String>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the text of a file.
    pub fn insert(&mut self, display_path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(display_path.into(), text.into());
    }

    /// Text of a recorded file.
    pub fn get(&self, display_path: &str) -> Option<&str> {
        self.files.get(display_path).map(String::as_str)
    }

    /// Display paths in first-read order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// The entry file's text, if any file was read.
    pub fn entry(&self) -> Option<(&str, &str)> {
        self.files
            .first()
            .map(|(path, text)| (path.as_str(), text.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_provider() {
        let mut provider = MemoryFileProvider::new();
        provider.insert("main.ymr", "target T;");

        assert_eq!(provider.read(Path::new("main.ymr")).unwrap(), "target T;");
        assert!(provider.read(Path::new("other.ymr")).is_err());
    }

    #[test]
    fn test_source_set_order() {
        let mut sources = SourceSet::new();
        sources.insert("main.ymr", "a");
        sources.insert("sub.ymr", "b");

        let paths: Vec<_> = sources.paths().collect();
        assert_eq!(paths, vec!["main.ymr", "sub.ymr"]);
        assert_eq!(sources.entry(), Some(("main.ymr", "a")));
    }
}
