//! Output formatting for tool results.
//!
//! Tool results are a single text block holding the pretty-printed JSON of
//! the row set or effect summary.

use crate::error::DbResult;
use serde::{Deserialize, Serialize};

/// One content block of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// Result body of a `tools/call` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
}

impl ToolResult {
    /// Pretty-print `value` (2-space indent) into a single text block.
    pub fn pretty_json<T: Serialize>(value: &T) -> DbResult<Self> {
        let text = serde_json::to_string_pretty(value)?;
        Ok(Self {
            content: vec![ToolContent::text(text)],
        })
    }
}
