//! Input sanitizers shared by the settings, menu, and widget stores.
//!
//! DESIGN
//! ======
//! Every sanitizer is idempotent: feeding its output back in yields the same
//! value. The stores rely on this so that a save followed by a read returns
//! exactly what was stored, and re-saving a fetched record is a no-op.

use serde_json::Value;

/// Remove `<...>` tag spans. An unmatched `<` is kept as-is.
#[must_use]
pub fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('<') {
        match rest[start..].find('>') {
            Some(end) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + end + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Single-line display text: tags stripped, whitespace runs collapsed, trimmed.
#[must_use]
pub fn text(raw: &str) -> String {
    strip_tags(raw).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// URL-safe slug: lowercase ASCII alphanumerics joined by single hyphens.
///
/// Whitespace, `-`, `_`, `.` and `/` act as word separators; any other
/// character is dropped. `"my portal!"` becomes `"my-portal"`.
#[must_use]
pub fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in strip_tags(raw).chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || matches!(ch, '-' | '_' | '.' | '/') {
            pending_sep = true;
        }
    }
    out
}

/// Lowercase identifier restricted to `[a-z0-9_-]`.
#[must_use]
pub fn key(raw: &str) -> String {
    raw.chars()
        .filter_map(|ch| {
            let lower = ch.to_ascii_lowercase();
            (lower.is_ascii_lowercase() || lower.is_ascii_digit() || lower == '_' || lower == '-').then_some(lower)
        })
        .collect()
}

/// Normalize a `#rgb` / `#rrggbb` color to lowercase. `None` if malformed.
#[must_use]
pub fn hex_color(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#')?;
    if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(trimmed.to_ascii_lowercase())
}

/// Accept absolute `http(s)` URLs and root-relative paths. `None` otherwise.
#[must_use]
pub fn url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '`'))
    {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    let allowed = lower.starts_with("https://")
        || lower.starts_with("http://")
        || (trimmed.starts_with('/') && !trimmed.starts_with("//"));
    allowed.then(|| trimmed.to_owned())
}

/// Loose boolean coercion for form-style payloads.
#[must_use]
pub fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read a string field; numbers are rendered to text, anything else is `None`.
#[must_use]
pub fn string_field<'a>(obj: &'a serde_json::Map<String, Value>, name: &str) -> Option<std::borrow::Cow<'a, str>> {
    match obj.get(name)? {
        Value::String(s) => Some(std::borrow::Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(std::borrow::Cow::Owned(n.to_string())),
        _ => None,
    }
}

/// Read an integer field; accepts JSON numbers (floats truncated) and numeric strings.
#[must_use]
pub fn int_field(obj: &serde_json::Map<String, Value>, name: &str) -> Option<i64> {
    match obj.get(name)? {
        #[allow(clippy::cast_possible_truncation)]
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "sanitize_test.rs"]
mod tests;
