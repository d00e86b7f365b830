use serde_json::Value;

/// Turns a stored media reference into a URL the browser can load.
///
/// - null / absent, or a bare id string (relation not populated) -> `""`
/// - `http://`, `https://` or `//` -> unchanged
/// - a path -> prefixed with the CMS origin
pub fn resolve_media_url(value: &Value, origin: &str) -> String {
    let url = match value.get("url").and_then(Value::as_str) {
        Some(url) if !url.trim().is_empty() => url.trim(),
        _ => return String::new(),
    };

    if is_absolute(url) {
        return url.to_string();
    }

    format!("{}/{}", origin.trim_end_matches('/'), url.trim_start_matches('/'))
}

fn is_absolute(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// Alt text stored next to the upload, if any.
pub fn media_alt(value: &Value) -> String {
    value
        .get("alt")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
