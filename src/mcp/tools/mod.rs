//! MCP tool implementations.
//!
//! # Module Structure
//!
//! - [`definitions`]: Tool schema definitions (JSON Schema for input validation)
//! - [`handlers`]: Tool execution logic

mod definitions;
mod handlers;

use crate::session::{ExplorerSession, Reply};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registry of MCP tools, bound to one caller's session.
///
/// Each registry owns its [`ExplorerSession`], so repeat suppression is
/// scoped to whoever holds the registry.
pub struct ToolRegistry {
    /// Available tools, in listing order.
    tools: Vec<ToolDefinition>,
    /// Dedup state for this caller.
    session: ExplorerSession,
}

impl ToolRegistry {
    /// Creates a registry with all exploration tools over `session`.
    #[must_use]
    pub fn new(session: ExplorerSession) -> Self {
        let tools = vec![
            definitions::list_schemas_tool(),
            definitions::list_tables_tool(),
            definitions::describe_table_tool(),
            definitions::get_business_rules_tool(),
        ];

        Self { tools, session }
    }

    /// Returns all tool definitions.
    #[must_use]
    pub fn list_tools(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().collect()
    }

    /// Gets a tool definition by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// The session backing this registry.
    #[must_use]
    pub const fn session(&self) -> &ExplorerSession {
        &self.session
    }

    /// Executes a tool with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool is unknown or the arguments are invalid.
    pub fn execute(&mut self, name: &str, arguments: Value) -> Result<ToolResult> {
        let reply = match name {
            "list_schemas" => handlers::execute_list_schemas(&mut self.session, arguments),
            "list_tables" => handlers::execute_list_tables(&self.session, arguments),
            "describe_table" => handlers::execute_describe_table(&mut self.session, arguments),
            "get_business_rules" => {
                handlers::execute_get_business_rules(&mut self.session, arguments)
            },
            _ => Err(Error::InvalidInput(format!("Unknown tool: {name}"))),
        };

        let status = reply.as_ref().map_or("error", Reply::status);
        let tool = self.get_tool(name).map_or("unknown", |t| t.name.as_str()).to_string();
        metrics::counter!("mcp_tool_calls_total", "tool" => tool, "status" => status)
            .increment(1);

        reply.map(ToolResult::from)
    }
}

/// Definition of an MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for input validation.
    pub input_schema: Value,
}

/// Result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the result represents an error.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// A single text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Concatenated text of all content blocks.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                ToolContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Reply> for ToolResult {
    fn from(reply: Reply) -> Self {
        Self::text(reply.into_text())
    }
}

/// Content types that can be returned by tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SchemaMap, TableMap};
    use crate::index::SchemaIndex;
    use crate::models::{ColumnInfo, GuideInfo, TableInfo};
    use crate::session::SessionFactory;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn registry() -> ToolRegistry {
        let mut tables = TableMap::new();
        tables.insert(
            "loan".to_string(),
            TableInfo::new(vec![ColumnInfo::new("loan_id", "INTEGER", false)], Vec::new()),
        );
        let mut schemas = SchemaMap::new();
        schemas.insert("financial".to_string(), tables);
        let mut guides = BTreeMap::new();
        guides.insert("financial".to_string(), GuideInfo::new("f.md", "# Rules"));
        let factory = SessionFactory::new(SchemaIndex::from_parts(schemas, guides).unwrap());
        ToolRegistry::new(factory.session())
    }

    #[test]
    fn test_tool_registry_creation() {
        let registry = registry();
        let names: Vec<_> = registry.list_tools().iter().map(|t| t.name.as_str()).collect();

        assert_eq!(
            names,
            vec!["list_schemas", "list_tables", "describe_table", "get_business_rules"]
        );
    }

    #[test]
    fn test_tool_definitions() {
        let registry = registry();

        let describe = registry.get_tool("describe_table").unwrap();
        assert!(describe.description.contains("sample rows"));
        assert_eq!(
            describe.input_schema["required"],
            json!(["schema_name", "table_name"])
        );
    }

    #[test]
    fn test_execute_describe_twice() {
        let mut registry = registry();
        let args = json!({"schema_name": "financial", "table_name": "loan"});

        let first = registry.execute("describe_table", args.clone()).unwrap();
        assert!(first.joined_text().starts_with("Table: financial.loan (1 columns)"));

        let second = registry.execute("describe_table", args).unwrap();
        assert!(!second.is_error);
        assert!(second.joined_text().starts_with("You already described financial.loan"));
    }

    #[test]
    fn test_execute_rules() {
        let mut registry = registry();
        let result = registry
            .execute("get_business_rules", json!({"schema_name": "financial"}))
            .unwrap();
        assert_eq!(result.joined_text(), "# Rules");
    }

    #[test]
    fn test_execute_unknown_tool() {
        let mut registry = registry();
        let result = registry.execute("run_query", json!({}));

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_execute_bad_arguments() {
        let mut registry = registry();
        assert!(registry.execute("list_tables", json!({})).is_err());
        assert!(
            registry
                .execute("list_schemas", json!({"unexpected": 1}))
                .is_err()
        );
    }
}
