//! MCP server implementation.
//!
//! Exposes the schema exploration tools to an agent runtime over the Model
//! Context Protocol (JSON-RPC 2.0, newline-delimited, on stdio).
//!
//! ## Tools
//!
//! | Tool | Arguments | Repeats |
//! |------|-----------|---------|
//! | `list_schemas` | none | refused |
//! | `list_tables` | `schema_name` | always answered |
//! | `describe_table` | `schema_name`, `table_name` | refused per table |
//! | `get_business_rules` | `schema_name` | refused per schema |
//!
//! ## Usage
//!
//! ```bash
//! schemadex serve
//! ```
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "schemadex": {
//!       "command": "schemadex",
//!       "args": ["serve"]
//!     }
//!   }
//! }
//! ```

mod dispatch;
mod server;
mod tool_types;
mod tools;

pub use dispatch::McpMethod;
pub use server::McpServer;
pub use tool_types::MAX_NAME_LENGTH;
pub use tools::{ToolContent, ToolDefinition, ToolRegistry, ToolResult};
