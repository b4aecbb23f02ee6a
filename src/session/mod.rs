//! Per-session exploration with repeat suppression.
//!
//! An [`ExplorerSession`] wraps the shared [`SchemaIndex`] and remembers what
//! it has already delivered to its caller. Asking again for the same schema
//! listing, table description, or guide yields a short refusal telling the
//! agent to use what it already has.
//!
//! Sessions are minted only by [`SessionFactory::session`] and are not
//! `Clone`, so two callers can never share dedup state by accident:
//!
//! ```
//! use schemadex::{SchemaIndex, SessionFactory};
//!
//! let factory = SessionFactory::new(SchemaIndex::default());
//! let mut first = factory.session();
//! let mut second = factory.session();
//!
//! assert!(first.list_schemas().is_delivered());
//! assert!(!first.list_schemas().is_delivered());
//! // The other session is unaffected.
//! assert!(second.list_schemas().is_delivered());
//! ```
//!
//! Lookups that miss (unknown schema or table, schema without a guide) are
//! answered with the valid alternatives and never mark anything as shown, so
//! a typo cannot lock the caller out of the real answer.

use crate::index::{DEFAULT_MAX_COLUMNS, SchemaIndex};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Outcome of a session call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The real answer.
    Delivered(String),
    /// The lookup missed; carries the valid alternatives.
    NotFound(String),
    /// The same answer was already delivered in this session.
    Repeated(String),
}

impl Reply {
    /// The text to hand back to the caller.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Delivered(text) | Self::NotFound(text) | Self::Repeated(text) => text,
        }
    }

    /// Consumes the reply, returning its text.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Delivered(text) | Self::NotFound(text) | Self::Repeated(text) => text,
        }
    }

    /// Returns true for [`Reply::Delivered`].
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }

    /// Returns true for [`Reply::Repeated`].
    #[must_use]
    pub const fn is_repeated(&self) -> bool {
        matches!(self, Self::Repeated(_))
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Delivered(_) => "delivered",
            Self::NotFound(_) => "not_found",
            Self::Repeated(_) => "repeated",
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Hands out independent sessions over one shared index.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    index: Arc<SchemaIndex>,
    max_columns: usize,
}

impl SessionFactory {
    /// Creates a factory owning `index`.
    #[must_use]
    pub fn new(index: SchemaIndex) -> Self {
        Self::from_shared(Arc::new(index))
    }

    /// Creates a factory over an already shared index.
    #[must_use]
    pub const fn from_shared(index: Arc<SchemaIndex>) -> Self {
        Self {
            index,
            max_columns: DEFAULT_MAX_COLUMNS,
        }
    }

    /// Sets the column limit for table descriptions.
    #[must_use]
    pub const fn with_max_columns(mut self, max_columns: usize) -> Self {
        self.max_columns = max_columns;
        self
    }

    /// The shared index.
    #[must_use]
    pub const fn index(&self) -> &Arc<SchemaIndex> {
        &self.index
    }

    /// Starts a new session with empty dedup state.
    #[must_use]
    pub fn session(&self) -> ExplorerSession {
        ExplorerSession {
            index: Arc::clone(&self.index),
            max_columns: self.max_columns,
            schemas_listed: false,
            described: HashSet::new(),
            rules_fetched: HashSet::new(),
        }
    }
}

/// One caller's view of the index, with its own memory of what was shown.
#[derive(Debug)]
pub struct ExplorerSession {
    index: Arc<SchemaIndex>,
    max_columns: usize,
    schemas_listed: bool,
    described: HashSet<(String, String)>,
    rules_fetched: HashSet<String>,
}

impl ExplorerSession {
    /// The shared index this session reads.
    #[must_use]
    pub fn index(&self) -> &SchemaIndex {
        &self.index
    }

    /// Lists schemas with their tables, guided schemas first.
    ///
    /// Only the first call in a session delivers the listing.
    pub fn list_schemas(&mut self) -> Reply {
        if self.schemas_listed {
            return self.refuse(
                "list_schemas",
                "You already listed schemas above. Do NOT call this again; proceed to the next step."
                    .to_string(),
            );
        }
        self.schemas_listed = true;

        let index = &self.index;
        let (guided, other): (Vec<&str>, Vec<&str>) = index
            .list_schemas()
            .into_iter()
            .partition(|schema| index.guide(schema).is_some());

        let mut lines = vec![
            "Available schemas and their tables:".to_string(),
            String::new(),
            "Schemas with business rules guides (most likely relevant):".to_string(),
        ];
        lines.extend(guided.iter().map(|schema| schema_line(index, schema)));
        lines.push(String::new());
        lines.push("Other schemas (no guide):".to_string());
        lines.extend(other.iter().map(|schema| schema_line(index, schema)));

        Reply::Delivered(lines.join("\n"))
    }

    /// Lists the tables of one schema. Never deduplicated.
    pub fn list_tables(&self, schema: &str) -> Reply {
        if !self.index.has_schema(schema) {
            return Reply::NotFound(self.unknown_schema(schema));
        }

        let tables = self.index.list_tables(schema);
        if tables.is_empty() {
            return Reply::Delivered(format!("Schema '{schema}' has no tables."));
        }

        let listing: Vec<String> = tables.iter().map(|t| format!("  - {t}")).collect();
        Reply::Delivered(format!("Tables in {schema}:\n{}", listing.join("\n")))
    }

    /// Describes one table; repeats of a delivered description are refused.
    pub fn describe_table(&mut self, schema: &str, table: &str) -> Reply {
        let key = (schema.to_string(), table.to_string());
        if self.described.contains(&key) {
            return self.refuse(
                "describe_table",
                format!(
                    "You already described {schema}.{table} above. Do NOT call describe_table on \
                     the same table again; use the information you already have and write your query."
                ),
            );
        }

        if !self.index.has_schema(schema) {
            return Reply::NotFound(self.unknown_schema(schema));
        }

        match self.index.describe_table(schema, table, self.max_columns) {
            Some(text) => {
                self.described.insert(key);
                Reply::Delivered(text)
            },
            None => Reply::NotFound(format!(
                "Table '{schema}.{table}' not found.\nAvailable tables in {schema}: {}",
                self.index.list_tables(schema).join(", ")
            )),
        }
    }

    /// Returns the business rules guide for a schema.
    ///
    /// Only a delivered guide is remembered; asking for a schema without a
    /// guide keeps answering with the available topics.
    pub fn get_business_rules(&mut self, schema: &str) -> Reply {
        if self.rules_fetched.contains(schema) {
            return self.refuse(
                "get_business_rules",
                format!(
                    "You already retrieved business rules for '{schema}' above. \
                     Do NOT call this again; use the rules you already have."
                ),
            );
        }

        match self.index.business_rules(schema) {
            Some(content) => {
                let content = content.to_string();
                self.rules_fetched.insert(schema.to_string());
                Reply::Delivered(content)
            },
            None => Reply::NotFound(format!(
                "No business rules guide found for schema '{schema}'.\nAvailable guide topics: {}",
                self.index.guide_topics().join(", ")
            )),
        }
    }

    fn refuse(&self, tool: &'static str, text: String) -> Reply {
        debug!(tool, "Refusing repeated request");
        metrics::counter!("session_dedup_refusals_total", "tool" => tool).increment(1);
        Reply::Repeated(text)
    }

    fn unknown_schema(&self, schema: &str) -> String {
        format!(
            "Schema '{schema}' not found.\nAvailable schemas: {}",
            self.index.list_schemas().join(", ")
        )
    }
}

fn schema_line(index: &SchemaIndex, schema: &str) -> String {
    let tables = index.list_tables(schema);
    if tables.is_empty() {
        format!("  - {schema}: (no tables)")
    } else {
        format!("  - {schema}: {}", tables.join(", "))
    }
}
