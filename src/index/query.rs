//! Read-only lookups over a built [`SchemaIndex`].
//!
//! Nothing here mutates the index, so any number of sessions may call these
//! concurrently through a shared `Arc<SchemaIndex>`.

use super::SchemaIndex;
use crate::models::{GuideInfo, TableInfo};
use std::fmt::Write as _;

/// Columns listed by a table description before truncating.
pub const DEFAULT_MAX_COLUMNS: usize = 40;

const CELL_DELIMITER: &str = " | ";

/// Storage keeps catalog order; listings are sorted on the way out.
fn sorted<'a>(names: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut names: Vec<&str> = names.map(String::as_str).collect();
    names.sort_unstable();
    names
}

impl SchemaIndex {
    /// Schema names, sorted.
    #[must_use]
    pub fn list_schemas(&self) -> Vec<&str> {
        sorted(self.schemas.keys())
    }

    /// Returns true if the schema was scanned.
    #[must_use]
    pub fn has_schema(&self, schema: &str) -> bool {
        self.schemas.contains_key(schema)
    }

    /// Table names of `schema`, sorted; empty if the schema is unknown.
    #[must_use]
    pub fn list_tables(&self, schema: &str) -> Vec<&str> {
        self.schemas
            .get(schema)
            .map(|tables| sorted(tables.keys()))
            .unwrap_or_default()
    }

    /// Facts for one table, if present.
    #[must_use]
    pub fn table(&self, schema: &str, table: &str) -> Option<&TableInfo> {
        self.schemas.get(schema)?.get(table)
    }

    /// The guide attached to `schema`, if any.
    #[must_use]
    pub fn guide(&self, schema: &str) -> Option<&GuideInfo> {
        self.guides.get(schema)
    }

    /// Full guide text for `schema`, if any.
    #[must_use]
    pub fn business_rules(&self, schema: &str) -> Option<&str> {
        self.guide(schema).map(|g| g.content.as_str())
    }

    /// Schemas that have a guide, sorted.
    #[must_use]
    pub fn guide_topics(&self) -> Vec<&str> {
        self.guides.keys().map(String::as_str).collect()
    }

    /// Renders a table description, or `None` if the table is unknown.
    ///
    /// See [`format_table_description`] for the layout.
    #[must_use]
    pub fn describe_table(&self, schema: &str, table: &str, max_columns: usize) -> Option<String> {
        self.table(schema, table)
            .map(|info| format_table_description(schema, table, info, max_columns))
    }
}

/// Formats a table for an agent.
///
/// ```text
/// Table: financial.loan (3 columns)
///
/// Columns:
///   loan_id (INTEGER)
///   amount (REAL, nullable)
///   status (TEXT)
///
/// Sample rows (1):
///   loan_id | amount | status
///   -------------------------
///   1 | 100.0 | A
/// ```
///
/// With more than `max_columns` columns only the first `max_columns` are
/// listed, followed by a count of the rest and a sampling hint; sample rows
/// are then left out because they would not line up with the listed columns.
#[must_use]
pub fn format_table_description(
    schema: &str,
    table: &str,
    info: &TableInfo,
    max_columns: usize,
) -> String {
    let total = info.column_count();
    let truncated = total > max_columns;
    let shown = &info.columns[..total.min(max_columns)];

    let mut out = String::new();
    let _ = writeln!(out, "Table: {schema}.{table} ({total} columns)");
    out.push('\n');
    out.push_str("Columns:");

    for column in shown {
        let nullable = if column.nullable { ", nullable" } else { "" };
        let _ = write!(out, "\n  {} ({}{nullable})", column.name, column.data_type);
    }

    if truncated {
        let _ = write!(out, "\n  ... and {} more columns", total - max_columns);
        out.push_str("\n  (Use a sampling query such as SELECT * ... LIMIT 3 to see all columns)");
        return out;
    }

    if !info.sample_rows.is_empty() {
        let header = shown
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(CELL_DELIMITER);
        let _ = write!(out, "\n\nSample rows ({}):", info.sample_rows.len());
        let _ = write!(out, "\n  {header}");
        let _ = write!(out, "\n  {}", "-".repeat(header.chars().count()));
        for row in &info.sample_rows {
            let _ = write!(out, "\n  {}", row.join(CELL_DELIMITER));
        }
    }

    out
}
