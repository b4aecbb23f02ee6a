//! Tool argument types.
//!
//! All argument types use `#[serde(deny_unknown_fields)]`, so a misspelled
//! parameter is reported back to the agent instead of silently ignored.

use crate::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Longest schema or table name accepted from a caller.
pub const MAX_NAME_LENGTH: usize = 1024;

/// Arguments for `list_schemas` (none).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListSchemasArgs {}

/// Arguments for `list_tables`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListTablesArgs {
    /// Schema to list.
    pub schema_name: String,
}

/// Arguments for `describe_table`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescribeTableArgs {
    /// Schema holding the table.
    pub schema_name: String,
    /// Table to describe.
    pub table_name: String,
}

/// Arguments for `get_business_rules`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetBusinessRulesArgs {
    /// Schema whose guide to return.
    pub schema_name: String,
}

/// Parses tool arguments; a missing or `null` argument object counts as `{}`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the arguments do not fit `T`.
pub fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(e.to_string()))
}

/// Validates that a name argument does not exceed [`MAX_NAME_LENGTH`].
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the name is too long.
pub fn validate_name(value: &str, field_name: &str) -> Result<()> {
    if value.len() > MAX_NAME_LENGTH {
        return Err(Error::InvalidInput(format!(
            "{field_name} exceeds maximum length ({} > {MAX_NAME_LENGTH} bytes)",
            value.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_arguments_are_empty() {
        assert!(parse_args::<ListSchemasArgs>(Value::Null).is_ok());
        assert!(parse_args::<ListSchemasArgs>(json!({})).is_ok());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let result = parse_args::<ListTablesArgs>(json!({"schema_name": "a", "schema": "b"}));
        assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("unknown field")));

        assert!(parse_args::<ListSchemasArgs>(json!({"verbose": true})).is_err());
    }

    #[test]
    fn test_requires_fields() {
        let result = parse_args::<DescribeTableArgs>(json!({"schema_name": "financial"}));
        assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("table_name")));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("financial", "schema_name").is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH + 1), "schema_name").is_err());
    }
}
