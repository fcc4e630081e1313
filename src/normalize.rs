//! HTML body normalization

use crate::types::BodyType;
use regex::Regex;
use std::borrow::Cow;

static BREAK_TAG: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

static PARAGRAPH_CLOSE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"(?i)</p>").unwrap());

static BLOCK_CLOSE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"(?i)</div>").unwrap());

static ANY_TAG: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Entities decoded after tag stripping, applied in this order
const ENTITIES: [(&str, &str); 5] = [
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
];

/// Normalize an email body to plain text.
///
/// Plain text bodies are returned unchanged. HTML bodies have line breaks and
/// block closings turned into newlines, every other tag removed, and the
/// common character entities decoded. Nothing else about the markup is
/// interpreted.
#[must_use]
pub fn normalize_body(body: &str, body_type: BodyType) -> Cow<'_, str> {
    match body_type {
        BodyType::Text => Cow::Borrowed(body),
        BodyType::Html => Cow::Owned(html_to_text(body)),
    }
}

/// Strip HTML markup while keeping paragraph and line structure
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let text = BREAK_TAG.replace_all(html, "\n");
    let text = PARAGRAPH_CLOSE.replace_all(&text, "\n\n");
    let text = BLOCK_CLOSE.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");

    ENTITIES
        .iter()
        .fold(text.into_owned(), |acc, (entity, decoded)| {
            acc.replace(entity, decoded)
        })
}

