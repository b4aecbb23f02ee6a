//! Catalog scanning.
//!
//! Reads schema, table and column metadata plus a few sample rows from the
//! underlying database. Backends implement [`CatalogSource`]; the shared
//! walk lives in [`scan_catalog`].
//!
//! # Backends
//!
//! | Backend | Feature | Schemas |
//! |---------|---------|---------|
//! | [`SqliteCatalog`] | always | `main` plus attached database files |
//! | `PostgresCatalog` | `postgres` | `information_schema.tables` |

mod sqlite;

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresCatalog;
pub use sqlite::{SqliteCatalog, configure_connection};

use crate::config::{DatabaseConfig, DatabaseKind};
use crate::models::{ColumnInfo, TableInfo};
use crate::{Error, Result};
use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

/// Number of sample rows captured per table.
pub const SAMPLE_ROWS: usize = 3;

/// Table name → table facts, in catalog order.
pub type TableMap = IndexMap<String, TableInfo>;

/// Schema name → tables, in catalog order.
pub type SchemaMap = IndexMap<String, TableMap>;

/// Read-only access to a database catalog.
///
/// Implementations hold whatever connection they need for as long as the
/// value lives; dropping the source releases it.
pub trait CatalogSource {
    /// Short backend label used in logs.
    fn kind(&self) -> &'static str;

    /// Internal schemas that are never indexed unless configured otherwise.
    fn default_excluded_schemas(&self) -> &'static [&'static str];

    /// Lists schema names, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    fn list_schemas(&self) -> Result<Vec<String>>;

    /// Lists base tables in a schema, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    fn list_tables(&self, schema: &str) -> Result<Vec<String>>;

    /// Lists a table's columns in ordinal order.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Fetches up to `limit` rows with every cell rendered as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails. Callers treat this as recoverable.
    fn sample_rows(&self, schema: &str, table: &str, limit: usize) -> Result<Vec<Vec<String>>>;
}

impl<T: CatalogSource + ?Sized> CatalogSource for Box<T> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn default_excluded_schemas(&self) -> &'static [&'static str] {
        (**self).default_excluded_schemas()
    }

    fn list_schemas(&self) -> Result<Vec<String>> {
        (**self).list_schemas()
    }

    fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        (**self).list_tables(schema)
    }

    fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>> {
        (**self).list_columns(schema, table)
    }

    fn sample_rows(&self, schema: &str, table: &str, limit: usize) -> Result<Vec<Vec<String>>> {
        (**self).sample_rows(schema, table, limit)
    }
}

/// Walks every non-excluded schema and collects per-table facts.
///
/// When `excluded` is `None` the source's default exclusion set applies.
/// A failed sample query leaves that table with an empty sample; any other
/// catalog failure aborts the scan.
///
/// # Errors
///
/// Returns an error if schema, table, or column listing fails.
#[instrument(skip_all, fields(source = source.kind()))]
pub fn scan_catalog<S: CatalogSource + ?Sized>(
    source: &S,
    excluded: Option<&[String]>,
) -> Result<SchemaMap> {
    let is_excluded = |schema: &str| match excluded {
        Some(list) => list.iter().any(|e| e == schema),
        None => source.default_excluded_schemas().contains(&schema),
    };

    let mut schemas = SchemaMap::new();

    for schema in source.list_schemas()? {
        if is_excluded(&schema) {
            debug!(schema = %schema, "Skipping excluded schema");
            continue;
        }

        let mut tables = TableMap::new();
        for table in source.list_tables(&schema)? {
            let columns = source.list_columns(&schema, &table)?;
            let sample_rows = match source.sample_rows(&schema, &table, SAMPLE_ROWS) {
                Ok(mut rows) => {
                    rows.truncate(SAMPLE_ROWS);
                    rows
                },
                Err(e) => {
                    warn!(schema = %schema, table = %table, error = %e, "Sample query failed, keeping table without samples");
                    metrics::counter!("catalog_sample_failures_total").increment(1);
                    Vec::new()
                },
            };
            tables.insert(table, TableInfo::new(columns, sample_rows));
        }

        debug!(schema = %schema, tables = tables.len(), "Scanned schema");
        schemas.insert(schema, tables);
    }

    Ok(schemas)
}

/// Opens the catalog source described by the configuration.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, or if the configured
/// kind needs a feature that was not compiled in.
pub fn open_catalog(config: &DatabaseConfig) -> Result<Box<dyn CatalogSource>> {
    match config.kind {
        DatabaseKind::Sqlite => {
            let path = config.path.as_ref().ok_or_else(|| {
                Error::InvalidInput("database.path is required for the sqlite catalog".to_string())
            })?;
            let catalog = SqliteCatalog::open(path)?;
            for (schema, file) in &config.attach {
                catalog.attach(schema, file)?;
            }
            Ok(Box::new(catalog))
        },
        #[cfg(feature = "postgres")]
        DatabaseKind::Postgres => {
            let url = config.url.as_deref().ok_or_else(|| {
                Error::InvalidInput(
                    "database.url (or DATABASE_URL) is required for the postgres catalog"
                        .to_string(),
                )
            })?;
            Ok(Box::new(PostgresCatalog::connect(url)?))
        },
        #[cfg(not(feature = "postgres"))]
        DatabaseKind::Postgres => Err(Error::FeatureNotEnabled("postgres".to_string())),
    }
}

/// Quotes an SQL identifier with double quotes, doubling embedded quotes.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
