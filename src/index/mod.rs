//! Preloaded schema and guide index.
//!
//! [`SchemaIndex::build`] scans the catalog, matches guides against the
//! scanned schema names, and writes the cache document. The result is
//! immutable and shared read-only between sessions (see [`crate::session`]).
//!
//! # Cache document
//!
//! ```json
//! {
//!   "schemas": { "financial": { "loan": { "columns": [{"name": "loan_id", "type": "INTEGER", "nullable": false}], "sample_rows": [["1"]] } } },
//!   "guides":  { "financial": { "file": "financial_rules.md", "content": "..." } }
//! }
//! ```
//!
//! The cache is written after every build and is never used to skip a scan;
//! [`SchemaIndex::load_cache`] exists for offline inspection.

mod query;

pub use query::{DEFAULT_MAX_COLUMNS, format_table_description};

use crate::catalog::{CatalogSource, SchemaMap, TableMap, scan_catalog};
use crate::guides::{DEFAULT_GUIDE_EXTENSION, KnownSchemas, assign_guides, load_guide_documents};
use crate::models::GuideInfo;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument};

/// Inputs for an index build beyond the catalog itself.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory holding guide documents.
    pub guides_dir: PathBuf,
    /// Guide file extension, without the dot.
    pub guide_extension: String,
    /// Where to write the cache document; `None` skips persistence.
    pub cache_path: Option<PathBuf>,
    /// Schemas to skip; `None` uses the catalog source's defaults.
    pub excluded_schemas: Option<Vec<String>>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            guides_dir: PathBuf::from("guides"),
            guide_extension: DEFAULT_GUIDE_EXTENSION.to_string(),
            cache_path: Some(PathBuf::from(".cache").join("agent_index.json")),
            excluded_schemas: None,
        }
    }
}

impl BuildOptions {
    /// Sets the guide directory.
    #[must_use]
    pub fn with_guides_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.guides_dir = dir.into();
        self
    }

    /// Sets the cache path.
    #[must_use]
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Disables writing the cache document.
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache_path = None;
        self
    }

    /// Sets the excluded schema list.
    #[must_use]
    pub fn with_excluded_schemas(mut self, schemas: Vec<String>) -> Self {
        self.excluded_schemas = Some(schemas);
        self
    }
}

/// Schemas, tables, column facts, samples, and per-schema guides.
///
/// Every key in `guides` is also a key in `schemas`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIndex {
    schemas: SchemaMap,
    guides: BTreeMap<String, GuideInfo>,
}

impl SchemaIndex {
    /// Builds a fresh index: scan, match guides, write the cache.
    ///
    /// The catalog source is consumed and dropped before guide matching, so
    /// its connection is released as soon as the scan ends, on success or error.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog scan fails, the guide directory exists
    /// but cannot be listed, or the cache document cannot be written.
    #[instrument(skip_all, fields(source = source.kind()))]
    pub fn build<S: CatalogSource>(source: S, options: &BuildOptions) -> Result<Self> {
        let start = Instant::now();

        let schemas = scan_catalog(&source, options.excluded_schemas.as_deref());
        drop(source);
        let schemas = schemas?;

        let known = KnownSchemas::new(schemas.keys().cloned());
        let documents = load_guide_documents(&options.guides_dir, &options.guide_extension)?;
        let document_count = documents.len();
        let guides = assign_guides(documents, &known);

        let index = Self { schemas, guides };

        if let Some(path) = &options.cache_path {
            index.save_cache(path)?;
        }

        metrics::counter!("index_builds_total").increment(1);
        info!(
            schemas = index.schemas.len(),
            tables = index.table_count(),
            guide_files = document_count,
            guides = index.guides.len(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Built schema index"
        );

        Ok(index)
    }

    /// Assembles an index from already-collected parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a guide names a schema that is not
    /// in `schemas`.
    pub fn from_parts(schemas: SchemaMap, guides: BTreeMap<String, GuideInfo>) -> Result<Self> {
        let index = Self { schemas, guides };
        index.validate()?;
        Ok(index)
    }

    fn validate(&self) -> Result<()> {
        match self.guides.keys().find(|s| !self.schemas.contains_key(*s)) {
            Some(orphan) => Err(Error::InvalidInput(format!(
                "guide attached to unknown schema '{orphan}'"
            ))),
            None => Ok(()),
        }
    }

    /// Total number of tables across all schemas.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.schemas.values().map(TableMap::len).sum()
    }

    /// Writes the cache document, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if serialization or any filesystem
    /// step fails.
    pub fn save_cache(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::operation("create_cache_dir", format!("{}: {e}", parent.display()))
            })?;
        }

        let json = self.to_cache_json()?;
        std::fs::write(path, json)
            .map_err(|e| Error::operation("write_cache", format!("{}: {e}", path.display())))?;

        tracing::debug!(path = %path.display(), "Wrote index cache");
        Ok(())
    }

    /// Serializes the index to the pretty-printed cache document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if serialization fails.
    pub fn to_cache_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::operation("serialize_cache", e))
    }

    /// Parses a cache document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a guide names an
    /// unknown schema.
    pub fn from_cache_json(json: &str) -> Result<Self> {
        let index: Self =
            serde_json::from_str(json).map_err(|e| Error::operation("parse_cache", e))?;
        index.validate()?;
        Ok(index)
    }

    /// Loads an index from a cache document on disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file is missing, or an error if it
    /// cannot be read or parsed.
    pub fn load_cache(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("index cache {}", path.display())));
        }
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::operation("read_cache", format!("{}: {e}", path.display())))?;
        Self::from_cache_json(&json)
    }
}
