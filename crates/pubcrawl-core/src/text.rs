//! Text clean-up shared by publishers and crawlers.

/// Strip HTML tags from a string and normalize whitespace.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of Unicode scalar values, which is how the platforms count length.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cut `text` to `max_chars` characters, appending `...` when anything was
/// dropped.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => {
            tracing::info!(max_chars, "content truncated");
            format!("{}...", &text[..byte_idx])
        }
    }
}

/// Strip tags but keep line structure, then truncate. Used for bodies typed
/// into editors where paragraphs matter.
#[must_use]
pub fn sanitize_content(content: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_tag = false;
    for ch in content.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    truncate_chars(out.trim(), max_chars)
}
