//! Column and table facts captured from the catalog.

use serde::{Deserialize, Serialize};

/// A single column, as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Database-native type name (e.g. `INTEGER`, `character varying`).
    #[serde(rename = "type")]
    pub data_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
}

impl ColumnInfo {
    /// Creates a new column description.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
        }
    }
}

/// Columns and a bounded sample of rows for one table.
///
/// `columns` keeps catalog ordinal order. Each sample row holds one
/// stringified cell per column captured at scan time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Columns in ordinal position order.
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    /// Up to [`crate::catalog::SAMPLE_ROWS`] rows of stringified cell values.
    #[serde(default)]
    pub sample_rows: Vec<Vec<String>>,
}

impl TableInfo {
    /// Creates table facts from columns and sample rows.
    #[must_use]
    pub const fn new(columns: Vec<ColumnInfo>, sample_rows: Vec<Vec<String>>) -> Self {
        Self {
            columns,
            sample_rows,
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in ordinal order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_serializes_type_key() {
        let column = ColumnInfo::new("loan_id", "INTEGER", false);
        let json = serde_json::to_value(&column).unwrap();

        assert_eq!(json["name"], "loan_id");
        assert_eq!(json["type"], "INTEGER");
        assert_eq!(json["nullable"], false);
        assert!(json.get("data_type").is_none());
    }

    #[test]
    fn test_table_column_names_keep_order() {
        let table = TableInfo::new(
            vec![
                ColumnInfo::new("b", "TEXT", true),
                ColumnInfo::new("a", "TEXT", true),
            ],
            Vec::new(),
        );

        assert_eq!(table.column_count(), 2);
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
