use std::sync::LazyLock;

use regex::Regex;

static RE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a medication or substance name for lookup and comparison:
/// trim, collapse internal whitespace, lowercase.
pub fn normalize_name(name: &str) -> String {
    RE_WS.replace_all(name.trim(), " ").to_lowercase()
}
