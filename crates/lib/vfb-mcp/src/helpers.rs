use std::borrow::Cow;

use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, ErrorCode};
use serde_json::Value;
use vfb_core::client::BackendError;

pub(crate) fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

/// Validates a required string argument, returning its trimmed form.
pub(crate) fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a str, ErrorData> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(mcp_err(
            ErrorCode::INVALID_PARAMS,
            format!("{name} is required"),
        ));
    }
    Ok(trimmed)
}

/// Folds a backend outcome into a success-shaped tool result.
///
/// Tool callers expect a textual answer even when a backend is degraded, so a
/// captured backend failure becomes result text instead of a protocol error.
/// This is the single place where that fold happens.
pub(crate) fn fold_backend(outcome: Result<Value, BackendError>, context: &str) -> CallToolResult {
    match outcome {
        Ok(payload) => {
            let text =
                serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
            CallToolResult::success(vec![Content::text(text)])
        }
        Err(err) => CallToolResult::success(vec![Content::text(format!("{context}: {err}"))]),
    }
}
