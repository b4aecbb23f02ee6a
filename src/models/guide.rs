//! Guide documents attached to schemas.

use serde::{Deserialize, Serialize};

/// A business-rules guide matched to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideInfo {
    /// Source file name (with extension).
    pub file: String,
    /// Full document text.
    pub content: String,
}

impl GuideInfo {
    /// Creates a guide record.
    #[must_use]
    pub fn new(file: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            content: content.into(),
        }
    }
}
