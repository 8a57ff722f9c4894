//! Sanitization boundary
//!
//! Pure functions applied at both edges of the orchestrator: user text on the
//! way out to the backend, backend text on the way in to the presentation
//! layer, and file names before they touch the file system. Tag stripping and
//! the rich allow-list both go through ammonia so the result is tree-based,
//! not regex substitution.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use ammonia::Builder;

/// Name used when a file name sanitizes down to nothing
pub const FALLBACK_DOCUMENT_NAME: &str = "document";

/// Extension appended to saved documents
pub const DOCUMENT_EXTENSION: &str = ".md";

/// Tags preserved in backend-originated replies
const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "em", "strong", "i", "b", "u", "s", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol",
    "li", "blockquote", "code", "pre", "a", "table", "thead", "tbody", "tr", "th", "td", "hr",
    "div", "span",
];

static RICH_CLEANER: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    tag_attributes.insert("a", ["href", "title"].into_iter().collect());

    let mut builder = Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .tag_attributes(tag_attributes)
        .generic_attributes(["class"].into_iter().collect())
        .url_schemes(["http", "https", "mailto"].into_iter().collect());
    builder
});

static TEXT_CLEANER: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut builder = Builder::default();
    builder
        .tags(HashSet::new())
        .generic_attributes(HashSet::new());
    builder
});

/// Strip all markup from user-supplied text
///
/// Tags are removed entirely (script and style bodies included), common HTML
/// entities are decoded back to characters, and surrounding whitespace is
/// trimmed. Applied to every free-text intake field and every outbound chat
/// message.
pub fn sanitize_plain_text(input: &str) -> String {
    let stripped = TEXT_CLEANER.clean(input).to_string();
    decode_entities(&stripped).trim().to_string()
}

/// Sanitize each element of a string list, dropping entries that end up empty
pub fn sanitize_string_list(input: &[String]) -> Vec<String> {
    input
        .iter()
        .map(|s| sanitize_plain_text(s))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Sanitize backend-originated reply text
///
/// Keeps a bounded allow-list of structural and formatting markup while
/// removing script blocks, inline event handlers, and `javascript:` URIs.
/// Content inside disallowed structural tags is preserved. Idempotent on
/// already-clean input.
pub fn sanitize_rich_reply(text: &str) -> String {
    RICH_CLEANER.clean(text).to_string()
}

/// Normalize a file name for writing into the document target directory
///
/// Removes path separators and filesystem-hostile characters, trims leading
/// and trailing dots and spaces, falls back to [`FALLBACK_DOCUMENT_NAME`] when
/// nothing is left, and appends [`DOCUMENT_EXTENSION`] when absent.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| {
            !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') && !c.is_control()
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c == ' ');
    let base = if trimmed.is_empty() {
        FALLBACK_DOCUMENT_NAME
    } else {
        trimmed
    };

    if base.to_lowercase().ends_with(DOCUMENT_EXTENSION) {
        base.to_string()
    } else {
        format!("{base}{DOCUMENT_EXTENSION}")
    }
}

/// Decode the entities ammonia re-encodes when emitting text nodes
///
/// `&amp;` must come last so encoded sequences are not decoded twice.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}
