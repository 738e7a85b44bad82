/// Truncate a string to at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Strip a markdown code fence from a response.
///
/// Everything between the opening fence and the next closing fence is kept,
/// minus an optional language tag (`json`, `JSON`, ...) right after the opening
/// fence. Unfenced input is only trimmed.
pub fn strip_code_blocks(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };

    let tag_len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    let untagged = &body[tag_len..];
    if tag_len > 0 && !untagged.trim().is_empty() {
        untagged.trim()
    } else {
        body.trim()
    }
}
