//! Guide documents.
//!
//! Guides are free-form documents (markdown by default) holding the business
//! rules for one schema. This module reads them from a directory and hands
//! them to the [`matcher`], which decides which schema each guide belongs to.

pub mod matcher;

pub use matcher::{GuideMatch, KnownSchemas, MatchRule, assign_guides, guide_title, match_guide};

use crate::{Error, Result};
use std::path::Path;
use tracing::warn;

/// Default guide file extension.
pub const DEFAULT_GUIDE_EXTENSION: &str = "md";

/// A guide document as read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideDocument {
    /// File name including extension (e.g. `financial_rules.md`).
    pub file_name: String,
    /// File name without extension (e.g. `financial_rules`).
    pub stem: String,
    /// Full text.
    pub content: String,
}

impl GuideDocument {
    /// Creates a document from a file name and its text.
    #[must_use]
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let stem = Path::new(&file_name)
            .file_stem()
            .map_or_else(|| file_name.clone(), |s| s.to_string_lossy().into_owned());
        Self {
            file_name,
            stem,
            content: content.into(),
        }
    }
}

/// Reads every `*.{extension}` file in `dir`, sorted by file name.
///
/// A missing directory yields no documents. Files that cannot be read as
/// UTF-8 text are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be listed.
pub fn load_guide_documents(dir: &Path, extension: &str) -> Result<Vec<GuideDocument>> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "Guide directory not found, skipping guides");
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| {
        Error::operation("read_guide_dir", format!("{}: {e}", dir.display()))
    })?;

    let mut paths: Vec<_> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => documents.push(GuideDocument::new(file_name, content)),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable guide");
            },
        }
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_stem() {
        let doc = GuideDocument::new("financial_rules.md", "# Rules");
        assert_eq!(doc.stem, "financial_rules");
        assert_eq!(doc.file_name, "financial_rules.md");
    }

    #[test]
    fn test_missing_dir_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let docs = load_guide_documents(&dir.path().join("absent"), "md").unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_loads_sorted_and_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_guide.md"), "# B").unwrap();
        std::fs::write(dir.path().join("a_guide.md"), "# A").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested.md")).unwrap();

        let docs = load_guide_documents(dir.path(), "md").unwrap();

        let names: Vec<_> = docs.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["a_guide.md", "b_guide.md"]);
        assert_eq!(docs[0].content, "# A");
    }

    #[test]
    fn test_skips_non_utf8_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.md"), [0xff, 0xfe, 0x00]).unwrap();
        std::fs::write(dir.path().join("good.md"), "# Good").unwrap();

        let docs = load_guide_documents(dir.path(), "md").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].file_name, "good.md");
    }
}
