use serde_json::Value;

use crate::models::{MediaInfo, NormalizedResult};

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_TITLE: &str = "Instagram Media";
pub const INVALID_RESPONSE: &str = "Invalid response from API";

// ── Public API ───────────────────────────────────────────────────────────────

/// Reshapes the extraction API's body into the public contract.
///
/// Only `data` is required; every field inside it is optional. Missing
/// `title` and `downloads` get defaults, the rest pass through verbatim.
pub fn normalize(upstream: &Value) -> NormalizedResult {
    let Some(data) = upstream.get("data").and_then(Value::as_object) else {
        return NormalizedResult::failed(INVALID_RESPONSE);
    };

    let title = data
        .get("title")
        .and_then(Value::as_str)
        .filter(|title| !title.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string();

    let downloads = match data.get("downloads") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            tracing::warn!(kind = json_kind(other), "upstream downloads is not a list");
            Vec::new()
        }
    };

    NormalizedResult::ok(MediaInfo {
        title,
        thumbnail: data.get("thumbnail").cloned(),
        downloads,
        duration: data.get("duration").cloned(),
        author: data.get("author").cloned(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
