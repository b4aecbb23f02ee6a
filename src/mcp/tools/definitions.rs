//! Tool definitions for MCP tools.
//!
//! Contains the JSON Schema definitions for the schema exploration tools.

use super::ToolDefinition;

/// Defines the `list_schemas` tool.
pub fn list_schemas_tool() -> ToolDefinition {
    ToolDefinition {
        name: "list_schemas".to_string(),
        description: "List all available database schemas and their tables. Schemas that have a \
                      business rules guide are listed first."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        }),
    }
}

/// Defines the `list_tables` tool.
pub fn list_tables_tool() -> ToolDefinition {
    ToolDefinition {
        name: "list_tables".to_string(),
        description: "List all tables in a given database schema.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "schema_name": {
                    "type": "string",
                    "description": "Name of the database schema (e.g. 'financial', 'Credit')."
                }
            },
            "required": ["schema_name"]
        }),
    }
}

/// Defines the `describe_table` tool.
pub fn describe_table_tool() -> ToolDefinition {
    ToolDefinition {
        name: "describe_table".to_string(),
        description: "Describe a table's columns (name, type, nullable) and show sample rows. \
                      Use this to understand the data before writing queries."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "schema_name": {
                    "type": "string",
                    "description": "Name of the database schema."
                },
                "table_name": {
                    "type": "string",
                    "description": "Name of the table."
                }
            },
            "required": ["schema_name", "table_name"]
        }),
    }
}

/// Defines the `get_business_rules` tool.
pub fn get_business_rules_tool() -> ToolDefinition {
    ToolDefinition {
        name: "get_business_rules".to_string(),
        description: "Retrieve the business rules and domain guide for a database schema. \
                      ALWAYS call this before writing queries: the guide contains critical \
                      filtering rules, field definitions, and domain conventions that the \
                      question may not mention."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "schema_name": {
                    "type": "string",
                    "description": "Name of the database schema (e.g. 'financial', 'Credit')."
                }
            },
            "required": ["schema_name"]
        }),
    }
}
