//! Tool execution handlers.
//!
//! Each handler parses its arguments and forwards to the caller's
//! [`ExplorerSession`]. Misses and repeats come back as ordinary replies;
//! only malformed arguments are errors.

use crate::Result;
use crate::mcp::tool_types::{
    DescribeTableArgs, GetBusinessRulesArgs, ListSchemasArgs, ListTablesArgs, parse_args,
    validate_name,
};
use crate::session::{ExplorerSession, Reply};
use serde_json::Value;

/// Executes `list_schemas`.
pub fn execute_list_schemas(session: &mut ExplorerSession, arguments: Value) -> Result<Reply> {
    let _: ListSchemasArgs = parse_args(arguments)?;
    Ok(session.list_schemas())
}

/// Executes `list_tables`.
pub fn execute_list_tables(session: &ExplorerSession, arguments: Value) -> Result<Reply> {
    let args: ListTablesArgs = parse_args(arguments)?;
    validate_name(&args.schema_name, "schema_name")?;
    Ok(session.list_tables(&args.schema_name))
}

/// Executes `describe_table`.
pub fn execute_describe_table(session: &mut ExplorerSession, arguments: Value) -> Result<Reply> {
    let args: DescribeTableArgs = parse_args(arguments)?;
    validate_name(&args.schema_name, "schema_name")?;
    validate_name(&args.table_name, "table_name")?;
    Ok(session.describe_table(&args.schema_name, &args.table_name))
}

/// Executes `get_business_rules`.
pub fn execute_get_business_rules(
    session: &mut ExplorerSession,
    arguments: Value,
) -> Result<Reply> {
    let args: GetBusinessRulesArgs = parse_args(arguments)?;
    validate_name(&args.schema_name, "schema_name")?;
    Ok(session.get_business_rules(&args.schema_name))
}
