//! Declarative response mapping: dot-separated JSON paths → profile fields.

use serde_json::Value;

/// Walk `path` through `value`. Object keys and array indices are separated by `.`.
///
/// An empty path resolves to `value` itself.
pub fn resolve<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Render a scalar as a field value. Blank strings, null and containers are absent.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Whether a value found at an error-flag path signals a failure.
pub fn is_error_flag(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Field value at `path`, if the path is mapped and holds a usable scalar.
pub fn extract(body: &Value, path: Option<&str>) -> Option<String> {
    path.and_then(|p| resolve(body, p)).and_then(scalar_to_string)
}
