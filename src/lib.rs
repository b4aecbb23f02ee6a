//! # Schemadex
//!
//! A preloaded schema and business-rules index for SQL-writing AI agents.
//!
//! Schemadex scans a relational catalog once at startup (schemas, tables,
//! columns, a few sample rows), attaches free-form guide documents to the
//! schemas they describe, and answers an agent's discovery questions from
//! memory. Each agent session gets its own dedup gate so the agent cannot
//! burn turns re-requesting facts it has already been shown.
//!
//! ## Architecture
//!
//! ```text
//! CatalogSource ──► scan_catalog ─┐
//!                                 ├─► SchemaIndex ──► ExplorerSession ──► ToolRegistry ──► McpServer
//! guides dir ──► GuideMatcher ────┘      │ (Arc, read-only)  (one per caller)
//!                                        └─► cache file (JSON)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use schemadex::catalog::SqliteCatalog;
//! use schemadex::index::{BuildOptions, SchemaIndex};
//! use schemadex::session::SessionFactory;
//!
//! let catalog = SqliteCatalog::open("warehouse.db")?;
//! let index = SchemaIndex::build(catalog, &BuildOptions::default())?;
//! let factory = SessionFactory::new(index);
//!
//! let mut session = factory.session();
//! println!("{}", session.describe_table("financial", "loan"));
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod catalog;
pub mod config;
pub mod guides;
pub mod index;
pub mod mcp;
pub mod models;
pub mod observability;
pub mod session;

pub use config::SchemadexConfig;
pub use index::{BuildOptions, SchemaIndex};
pub use models::{ColumnInfo, GuideInfo, TableInfo};
pub use session::{ExplorerSession, SessionFactory};

/// Error type for schemadex operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed tool arguments, bad config values |
/// | `OperationFailed` | Catalog queries, cache I/O, config file I/O |
/// | `NotFound` | A file the caller asked for explicitly does not exist |
/// | `FeatureNotEnabled` | A catalog kind needs a compile-time feature |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Catalog introspection queries fail (schema, table, column listing)
    /// - The cache document cannot be written or parsed
    /// - The configuration file cannot be read or parsed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A required resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from an operation label and any displayable cause.
    pub fn operation(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for schemadex operations.
pub type Result<T> = std::result::Result<T, Error>;
