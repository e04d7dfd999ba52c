//! Normalization applied to every display name before it is stored.

use html_escape::decode_html_entities;

/// Decodes HTML entities (named, decimal and hex) and expands tabs.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    decode_html_entities(text).replace('\t', "    ")
}
