//! Tool manifest.
//!
//! The two tools the server exposes, their input schema, and the aliases
//! accepted when a client calls them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const QUERY_TOOL: &str = "query";
pub const EXECUTE_TOOL: &str = "execute";

const QUERY_ALIASES: &[&str] = &[QUERY_TOOL, "mcp_mysql_query", "mysql_query"];
const EXECUTE_ALIASES: &[&str] = &[EXECUTE_TOOL, "mcp_mysql_execute", "mysql_execute"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Query,
    Execute,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::Query, Tool::Execute];

    /// Resolve a tool by its advertised name or one of its aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        if QUERY_ALIASES.contains(&name) {
            Some(Self::Query)
        } else if EXECUTE_ALIASES.contains(&name) {
            Some(Self::Execute)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Query => QUERY_TOOL,
            Self::Execute => EXECUTE_TOOL,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Query => {
                "Run a read-only SQL statement (SELECT, SHOW, DESCRIBE) against the MySQL \
                 database and return the columns and rows."
            }
            Self::Execute => {
                "Run a data-modifying SQL statement (INSERT, UPDATE, DELETE) against the MySQL \
                 database and return the affected row count and last insert id. \
                 DROP and TRUNCATE are always rejected."
            }
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        let sql_description = match self {
            Self::Query => "SQL query statement",
            Self::Execute => "SQL statement to execute",
        };
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "sql": {
                        "type": "string",
                        "description": sql_description
                    }
                },
                "required": ["sql"]
            }),
        }
    }
}

/// A tool as advertised to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Tool list for `tools/list`.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    Tool::ALL.iter().map(Tool::definition).collect()
}

/// Tool map keyed by name, advertised under `capabilities.tools`.
pub fn tool_capabilities() -> Map<String, Value> {
    Tool::ALL
        .iter()
        .map(|tool| {
            let definition = serde_json::to_value(tool.definition()).unwrap_or(Value::Null);
            (tool.name().to_string(), definition)
        })
        .collect()
}
