//! PostgreSQL catalog source.
//!
//! Uses `information_schema` for introspection and the simple-query (text)
//! protocol for sample rows, so every cell arrives already rendered as text.
//! The client runs on a private current-thread runtime that lives as long as
//! the catalog value.

use super::{CatalogSource, quote_ident};
use crate::models::ColumnInfo;
use crate::{Error, Result};
use tokio::runtime::{Builder, Runtime};
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

/// Schemas PostgreSQL uses for its own catalog.
const POSTGRES_INTERNAL_SCHEMAS: &[&str] = &["information_schema", "pg_catalog"];

/// Catalog source backed by a single PostgreSQL connection.
pub struct PostgresCatalog {
    client: Client,
    runtime: Runtime,
}

impl PostgresCatalog {
    /// Connects using a libpq-style connection string or URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot start or the connection fails.
    pub fn connect(url: &str) -> Result<Self> {
        let config = url
            .parse::<tokio_postgres::Config>()
            .map_err(|e| Error::operation("postgres_parse_url", e))?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::operation("postgres_runtime", e))?;

        let (client, connection) = runtime
            .block_on(config.connect(NoTls))
            .map_err(|e| Error::operation("postgres_connect", e))?;

        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "PostgreSQL connection closed with error");
            }
        });

        Ok(Self { client, runtime })
    }

    fn query_strings(&self, operation: &str, sql: &str, params: &[&str]) -> Result<Vec<String>> {
        let params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = params
            .iter()
            .map(|p| p as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect();
        let rows = self
            .runtime
            .block_on(self.client.query(sql, &params))
            .map_err(|e| Error::operation(operation, e))?;

        rows.iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::operation(operation, e))
    }
}

impl CatalogSource for PostgresCatalog {
    fn kind(&self) -> &'static str {
        "postgres"
    }

    fn default_excluded_schemas(&self) -> &'static [&'static str] {
        POSTGRES_INTERNAL_SCHEMAS
    }

    fn list_schemas(&self) -> Result<Vec<String>> {
        self.query_strings(
            "postgres_list_schemas",
            "SELECT DISTINCT table_schema::text FROM information_schema.tables ORDER BY 1",
            &[],
        )
    }

    fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        self.query_strings(
            "postgres_list_tables",
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = $1 AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
            &[schema],
        )
    }

    fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>> {
        let rows = self
            .runtime
            .block_on(self.client.query(
                "SELECT column_name::text, data_type::text, is_nullable::text \
                 FROM information_schema.columns \
                 WHERE table_schema = $1 AND table_name = $2 \
                 ORDER BY ordinal_position",
                &[&schema, &table],
            ))
            .map_err(|e| Error::operation("postgres_list_columns", e))?;

        rows.iter()
            .map(|row| {
                Ok(ColumnInfo::new(
                    row.try_get::<_, String>(0)?,
                    row.try_get::<_, String>(1)?,
                    row.try_get::<_, String>(2)? == "YES",
                ))
            })
            .collect::<std::result::Result<Vec<_>, tokio_postgres::Error>>()
            .map_err(|e| Error::operation("postgres_list_columns", e))
    }

    fn sample_rows(&self, schema: &str, table: &str, limit: usize) -> Result<Vec<Vec<String>>> {
        let sql = format!(
            "SELECT * FROM {}.{} LIMIT {limit}",
            quote_ident(schema),
            quote_ident(table)
        );
        let messages = self
            .runtime
            .block_on(self.client.simple_query(&sql))
            .map_err(|e| Error::operation("postgres_sample_rows", e))?;

        Ok(messages
            .iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::Row(row) => Some(
                    (0..row.len())
                        .map(|i| row.get(i).unwrap_or("NULL").to_string())
                        .collect(),
                ),
                _ => None,
            })
            .collect())
    }
}
