//! `SQLite` catalog source.
//!
//! The main database file is exposed as schema `main`; additional files can
//! be attached read-only under their own schema names.

use super::{CatalogSource, quote_ident};
use crate::models::ColumnInfo;
use crate::{Error, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Schemas `SQLite` creates on its own.
const SQLITE_INTERNAL_SCHEMAS: &[&str] = &["temp"];

/// Configures a read-only `SQLite` connection for catalog scanning.
///
/// # Configuration Applied
///
/// - **`query_only`**: Rejects any statement that would write
/// - **`busy_timeout`**: Waits up to 5 seconds when another process holds a lock
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if a pragma cannot be applied.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "query_only", "ON")
        .map_err(|e| Error::operation("sqlite_configure", e))?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(|e| Error::operation("sqlite_configure", e))?;
    Ok(())
}

/// Catalog source backed by a `SQLite` connection.
pub struct SqliteCatalog {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteCatalog {
    /// Opens a database file read-only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist, or
    /// [`Error::OperationFailed`] if it cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(format!("database file {}", path.display())));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| Error::operation("sqlite_open", format!("{}: {e}", path.display())))?;
        configure_connection(&conn)?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Wraps an existing connection (e.g. an in-memory database in tests).
    #[must_use]
    pub const fn from_connection(conn: Connection) -> Self {
        Self { conn, path: None }
    }

    /// Path of the main database file, if opened from disk.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Attaches another database file read-only as `schema`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or the attach fails.
    pub fn attach(&self, schema: &str, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "attached database {schema} at {}",
                path.display()
            )));
        }

        let uri = read_only_uri(path);
        let sql = format!("ATTACH DATABASE ?1 AS {}", quote_ident(schema));
        self.conn
            .execute(&sql, [uri])
            .map_err(|e| Error::operation("sqlite_attach", format!("{schema}: {e}")))?;
        tracing::debug!(schema, path = %path.display(), "Attached database");
        Ok(())
    }
}

impl CatalogSource for SqliteCatalog {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn default_excluded_schemas(&self) -> &'static [&'static str] {
        SQLITE_INTERNAL_SCHEMAS
    }

    fn list_schemas(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_database_list ORDER BY name")
            .map_err(|e| Error::operation("sqlite_list_schemas", e))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::operation("sqlite_list_schemas", e))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::operation("sqlite_list_schemas", e))
    }

    fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT name FROM {}.sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
             ORDER BY name",
            quote_ident(schema)
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| Error::operation("sqlite_list_tables", e))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::operation("sqlite_list_tables", e))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::operation("sqlite_list_tables", e))
    }

    fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>> {
        let mut stmt = self
            .conn
            .prepare(r#"SELECT name, type, "notnull" FROM pragma_table_info(?1, ?2) ORDER BY cid"#)
            .map_err(|e| Error::operation("sqlite_list_columns", e))?;
        let rows = stmt
            .query_map([table, schema], |row| {
                Ok(ColumnInfo::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)? == 0,
                ))
            })
            .map_err(|e| Error::operation("sqlite_list_columns", e))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::operation("sqlite_list_columns", e))
    }

    fn sample_rows(&self, schema: &str, table: &str, limit: usize) -> Result<Vec<Vec<String>>> {
        let sql = format!(
            "SELECT * FROM {}.{} LIMIT {limit}",
            quote_ident(schema),
            quote_ident(table)
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| Error::operation("sqlite_sample_rows", e))?;
        let width = stmt.column_count();

        let mut rows = stmt
            .query([])
            .map_err(|e| Error::operation("sqlite_sample_rows", e))?;
        let mut sample = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| Error::operation("sqlite_sample_rows", e))?
        {
            let cells = (0..width)
                .map(|i| row.get_ref(i).map(render_value))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::operation("sqlite_sample_rows", e))?;
            sample.push(cells);
        }

        Ok(sample)
    }
}

/// Builds a `file:` URI that opens `path` read-only.
///
/// `%`, `?` and `#` are significant in URI filenames and are
/// percent-encoded; everything else passes through.
fn read_only_uri(path: &Path) -> String {
    let mut uri = String::from("file:");
    for c in path.display().to_string().chars() {
        match c {
            '%' => uri.push_str("%25"),
            '?' => uri.push_str("%3f"),
            '#' => uri.push_str("%23"),
            _ => uri.push(c),
        }
    }
    uri.push_str("?mode=ro");
    uri
}

/// Renders a cell value as display text.
///
/// Reals keep a fractional part or exponent (`80.0`, `1e20`) so they never
/// read as integers.
fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => format!("{f:?}"),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::scan_catalog;

    fn seeded() -> SqliteCatalog {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE loan (loan_id INTEGER NOT NULL, amount REAL, status TEXT);
             INSERT INTO loan VALUES (1, 1200.5, 'A'), (2, NULL, 'B'), (3, 80.0, 'A'), (4, 9.0, 'C');
             CREATE TABLE account (account_id INTEGER PRIMARY KEY, photo BLOB);
             INSERT INTO account VALUES (7, x'0102');
             CREATE VIEW loan_view AS SELECT loan_id FROM loan;",
        )
        .unwrap();
        SqliteCatalog::from_connection(conn)
    }

    #[test]
    fn test_lists_main_schema() {
        let catalog = seeded();
        let schemas = catalog.list_schemas().unwrap();
        assert!(schemas.contains(&"main".to_string()));
    }

    #[test]
    fn test_lists_base_tables_only_in_name_order() {
        let catalog = seeded();
        assert_eq!(catalog.list_tables("main").unwrap(), vec!["account", "loan"]);
    }

    #[test]
    fn test_columns_in_ordinal_order_with_nullability() {
        let catalog = seeded();
        let columns = catalog.list_columns("main", "loan").unwrap();

        assert_eq!(
            columns,
            vec![
                ColumnInfo::new("loan_id", "INTEGER", false),
                ColumnInfo::new("amount", "REAL", true),
                ColumnInfo::new("status", "TEXT", true),
            ]
        );
    }

    #[test]
    fn test_sample_rows_render_values() {
        let catalog = seeded();

        let rows = catalog.sample_rows("main", "loan", 3).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["1", "1200.5", "A"]);
        assert_eq!(rows[1], vec!["2", "NULL", "B"]);
        assert_eq!(rows[2], vec!["3", "80.0", "A"]);

        let rows = catalog.sample_rows("main", "account", 3).unwrap();
        assert_eq!(rows, vec![vec!["7".to_string(), "<2 bytes>".to_string()]]);
    }

    #[test]
    fn test_whole_and_large_reals_stay_reals() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (amount REAL); INSERT INTO t VALUES (80.0), (1e20), (-0.5);",
        )
        .unwrap();
        let catalog = SqliteCatalog::from_connection(conn);

        let rows = catalog.sample_rows("main", "t", 3).unwrap();
        assert_eq!(rows, vec![vec!["80.0"], vec!["1e20"], vec!["-0.5"]]);
    }

    #[test]
    fn test_read_only_uri_escapes_reserved_characters() {
        assert_eq!(
            read_only_uri(Path::new("/data/q#1/50%?/fin.db")),
            "file:/data/q%231/50%25%3f/fin.db?mode=ro"
        );
        assert_eq!(read_only_uri(Path::new("plain.db")), "file:plain.db?mode=ro");
    }

    #[test]
    fn test_attach_from_directory_with_reserved_characters() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("q#1 50%?");
        std::fs::create_dir(&nested).unwrap();
        let main_path = dir.path().join("main.db");
        let fin_path = nested.join("fin.db");

        Connection::open(&main_path)
            .unwrap()
            .execute_batch("CREATE TABLE t (a INTEGER);")
            .unwrap();
        Connection::open(&fin_path)
            .unwrap()
            .execute_batch("CREATE TABLE loan (loan_id INTEGER);")
            .unwrap();

        let catalog = SqliteCatalog::open(&main_path).unwrap();
        catalog.attach("financial", &fin_path).unwrap();

        assert_eq!(catalog.list_tables("financial").unwrap(), vec!["loan"]);
        // Attached read-only
        assert!(
            catalog
                .conn
                .execute("INSERT INTO financial.loan VALUES (1)", [])
                .is_err()
        );
    }

    #[test]
    fn test_sample_rows_unknown_table_fails() {
        let catalog = seeded();
        assert!(catalog.sample_rows("main", "missing", 3).is_err());
    }

    #[test]
    fn test_open_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = SqliteCatalog::open(dir.path().join("nope.db"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_attached_database_becomes_schema() {
        let dir = tempfile::tempdir().unwrap();
        let main_path = dir.path().join("main.db");
        let credit_path = dir.path().join("credit.db");

        Connection::open(&main_path)
            .unwrap()
            .execute_batch("CREATE TABLE t (a INTEGER);")
            .unwrap();
        Connection::open(&credit_path)
            .unwrap()
            .execute_batch("CREATE TABLE card (card_id INTEGER NOT NULL, kind TEXT); INSERT INTO card VALUES (1, 'gold');")
            .unwrap();

        let catalog = SqliteCatalog::open(&main_path).unwrap();
        catalog.attach("Credit", &credit_path).unwrap();

        let schemas = scan_catalog(&catalog, None).unwrap();
        assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["Credit", "main"]);
        assert_eq!(
            schemas["Credit"]["card"].sample_rows,
            vec![vec!["1".to_string(), "gold".to_string()]]
        );
    }

    #[test]
    fn test_connection_is_query_only() {
        let catalog = seeded();
        let result = catalog.conn.execute("DELETE FROM loan", []);
        // seeded() skips configure_connection, so writes still work here
        assert!(result.is_ok());

        configure_connection(&catalog.conn).unwrap();
        assert!(catalog.conn.execute("DELETE FROM loan", []).is_err());
    }
}
