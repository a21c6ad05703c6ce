#![forbid(unsafe_code)]

use lf_storage::StoreError;
use serde_json::{Value, json};

pub(crate) fn ai_ok_with_warnings(intent: &str, result: Value, warnings: Vec<Value>) -> Value {
    json!({
        "success": true,
        "intent": intent,
        "result": result,
        "warnings": warnings,
        "error": null
    })
}

pub(crate) fn ai_ok(intent: &str, result: Value) -> Value {
    ai_ok_with_warnings(intent, result, Vec::new())
}

pub(crate) fn warning(code: &str, message: &str) -> Value {
    json!({ "code": code, "message": message })
}

pub(crate) fn ai_error_with(code: &str, message: &str, recovery: Option<&str>) -> Value {
    let mut error_obj = serde_json::Map::new();
    error_obj.insert("code".to_string(), Value::String(code.to_string()));
    error_obj.insert(
        "message".to_string(),
        Value::String(message.trim().to_string()),
    );
    if let Some(recovery) = recovery {
        error_obj.insert(
            "recovery".to_string(),
            Value::String(recovery.trim().to_string()),
        );
    }

    json!({
        "success": false,
        "intent": "error",
        "result": {},
        "warnings": [],
        "error": Value::Object(error_obj)
    })
}

pub(crate) fn ai_error(code: &str, message: &str) -> Value {
    ai_error_with(code, message, None)
}

pub(crate) fn store_error(err: StoreError) -> Value {
    let code = err.code();
    let recovery = match code {
        "RESET_REQUIRED" => Some("Point --storage-dir at an empty directory or remove logframe.db."),
        "NOT_FOUND" => Some("List the parent collection to discover existing ids, then retry."),
        "CONFLICT" => Some("Read the current state first; the write collides with existing data."),
        "VALIDATION_ERROR" => None,
        _ => Some("Storage failure; retry once and inspect the server log if it persists."),
    };
    let message = match err {
        StoreError::Validation(message)
        | StoreError::Conflict(message)
        | StoreError::NotFound(message) => message,
        other => other.to_string(),
    };
    ai_error_with(code, &message, recovery)
}

pub(crate) fn error_unknown_tool(name: &str) -> Value {
    ai_error_with(
        "UNKNOWN_TOOL",
        &format!("Unknown tool: {name}"),
        Some("Call tools/list to see the available tools."),
    )
}

pub(crate) fn error_forbidden(name: &str) -> Value {
    ai_error_with(
        "FORBIDDEN",
        &format!("{name} changes data and requires the editor role"),
        Some("Restart the server with --role editor or use a read-only tool."),
    )
}

pub(crate) fn error_internal(message: String) -> Value {
    ai_error("INTERNAL_ERROR", &message)
}
