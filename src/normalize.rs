//! Response normalization.
//!
//! Models often wrap the document in a markdown code fence even when told
//! not to. [`normalize`] peels that wrapper off and does nothing else: the
//! text is not checked for being well-formed markup.

const FENCE: &str = "```";

/// Strip a leading fence (with optional language tag) and a trailing fence
/// when both enclose the whole response. Surrounding whitespace around the
/// wrapper is tolerated. Text without a complete wrapper is returned as-is.
///
/// A wrapper nested inside another is peeled too, so
/// `normalize(normalize(x)) == normalize(x)` for every input.
pub fn normalize(raw: &str) -> String {
    let mut text = raw.trim();
    let mut stripped = false;

    while let Some(inner) = strip_fence(text) {
        text = inner.trim();
        stripped = true;
    }

    if stripped {
        text.to_string()
    } else {
        raw.to_string()
    }
}

fn strip_fence(text: &str) -> Option<&str> {
    let body = text.strip_prefix(FENCE)?.strip_suffix(FENCE)?;

    let tag_len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '_' | '.')))
        .unwrap_or(body.len());
    let after_tag = &body[tag_len..];

    // A tag ends the opening line or runs straight into the markup.
    // Anything else on that line is content.
    if after_tag.starts_with('\n') || after_tag.starts_with("\r\n") || after_tag.starts_with('<') {
        Some(after_tag)
    } else {
        Some(body)
    }
}
