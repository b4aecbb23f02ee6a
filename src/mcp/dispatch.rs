//! JSON-RPC method names understood by the server.
//!
//! Only the tool half of MCP is served. Resource, prompt and sampling
//! methods fall through to [`McpMethod::Unknown`] and get a -32601 reply.
//! Messages under `notifications/` never get a reply at all, since they
//! carry no id.

use std::fmt;

/// Prefix shared by all client notifications.
const NOTIFICATION_PREFIX: &str = "notifications/";

/// A JSON-RPC method the server may receive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum McpMethod {
    /// `initialize`: protocol handshake.
    Initialize,
    /// `tools/list`.
    ListTools,
    /// `tools/call`.
    CallTool,
    /// `ping`: liveness check, answered with `{}`.
    Ping,
    /// Anything else, with the name as received.
    Unknown(String),
}

/// Served methods and their wire names.
const SERVED: [(McpMethod, &str); 4] = [
    (McpMethod::Initialize, "initialize"),
    (McpMethod::ListTools, "tools/list"),
    (McpMethod::CallTool, "tools/call"),
    (McpMethod::Ping, "ping"),
];

impl McpMethod {
    /// Wire name of the method.
    #[must_use]
    pub fn as_str(&self) -> &str {
        if let Self::Unknown(name) = self {
            return name;
        }
        SERVED
            .iter()
            .find(|(method, _)| method == self)
            .map_or("", |(_, name)| *name)
    }

    /// Whether the server answers this method.
    #[must_use]
    pub const fn is_served(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Whether this is a client notification (`notifications/*`).
    #[must_use]
    pub fn is_notification(&self) -> bool {
        matches!(self, Self::Unknown(name) if name.starts_with(NOTIFICATION_PREFIX))
    }
}

impl From<&str> for McpMethod {
    fn from(name: &str) -> Self {
        SERVED
            .iter()
            .find(|(_, wire)| *wire == name)
            .map_or_else(|| Self::Unknown(name.to_string()), |(method, _)| method.clone())
    }
}

impl fmt::Display for McpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("initialize", McpMethod::Initialize)]
    #[test_case("tools/list", McpMethod::ListTools)]
    #[test_case("tools/call", McpMethod::CallTool)]
    #[test_case("ping", McpMethod::Ping)]
    fn test_served_names(name: &str, expected: McpMethod) {
        let method = McpMethod::from(name);
        assert_eq!(method, expected);
        assert!(method.is_served());
        assert_eq!(method.to_string(), name);
    }

    #[test]
    fn test_other_mcp_families_are_unknown() {
        for name in ["resources/list", "prompts/get", "sampling/createMessage"] {
            let method = McpMethod::from(name);
            assert!(!method.is_served());
            assert!(!method.is_notification());
            assert_eq!(method.as_str(), name);
        }
    }

    #[test]
    fn test_notifications() {
        assert!(McpMethod::from("notifications/initialized").is_notification());
        assert!(McpMethod::from("notifications/cancelled").is_notification());
        assert!(!McpMethod::Ping.is_notification());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!(!McpMethod::from("Ping").is_served());
    }
}
