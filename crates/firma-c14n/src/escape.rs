#![forbid(unsafe_code)]

//! Character escaping for canonical output.

fn escape_with(s: &str, replacement: impl Fn(char) -> Option<&'static str>) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match replacement(ch) {
            Some(r) => out.push_str(r),
            None => out.push(ch),
        }
    }
    out
}

/// Text node content: `&`, `<`, `>` and CR.
pub fn escape_text(s: &str) -> String {
    escape_with(s, |ch| match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\r' => Some("&#xD;"),
        _ => None,
    })
}

/// Attribute values: `&`, `<`, `"` and the whitespace characters that
/// attribute-value normalization would otherwise fold.
pub fn escape_attr(s: &str) -> String {
    escape_with(s, |ch| match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#x9;"),
        '\n' => Some("&#xA;"),
        '\r' => Some("&#xD;"),
        _ => None,
    })
}

/// Processing-instruction data: CR only.
pub fn escape_pi(s: &str) -> String {
    escape_with(s, |ch| (ch == '\r').then_some("&#xD;"))
}
