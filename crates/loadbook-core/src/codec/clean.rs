//! Free-text cleaning applied to every component before it enters a test id.

use regex::Regex;
use std::sync::LazyLock;

static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip everything except word characters, whitespace and hyphens, then
/// collapse each whitespace run into a single hyphen.
///
/// The order matters: stripping first means `"6.5 CM"` becomes `"65-CM"`,
/// which is what existing identifiers on disk contain.
pub fn clean_component(value: &str) -> String {
    let stripped = DISALLOWED_RE.replace_all(value, "");
    WHITESPACE_RE.replace_all(&stripped, "-").into_owned()
}
