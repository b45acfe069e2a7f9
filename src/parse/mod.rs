use serde_json::Value;

/// Ordered path → content mapping supplied by a provider. serde_json is built
/// with `preserve_order`, so iteration follows the provider's key order.
pub type FileMap = serde_json::Map<String, Value>;

/// Extract a `{"files": {path: content}}` object from provider free text.
///
/// Strict parse of the whole string first; failing that, the span from the
/// first `{` to the last `}` is parsed. That slice is a best-effort textual
/// heuristic, not a balanced-bracket scan: provider replies wrap at most one
/// JSON object in prose, and anything stranger collapses to `None`, which
/// callers treat as "use the default scaffold".
pub fn extract_file_map(raw: &str) -> Option<FileMap> {
    if let Some(files) = files_member(raw) {
        return Some(files);
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    files_member(&raw[start..=end])
}

fn files_member(text: &str) -> Option<FileMap> {
    let v: Value = serde_json::from_str(text).ok()?;
    match v.get("files") {
        Some(Value::Object(map)) => Some(map.clone()),
        _ => None,
    }
}

/// File contents are strings in the happy path; anything else degrades to the
/// empty string rather than erroring.
pub fn content_str(v: &Value) -> String {
    v.as_str().map(|s| s.to_string()).unwrap_or_default()
}
