use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use crate::error::Result;

/// Wrap a structured value as pretty-printed JSON text content.
pub fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult> {
    let text = serde_json::to_string_pretty(value)?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Wrap plain text (e.g. a published page URL).
pub fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}
