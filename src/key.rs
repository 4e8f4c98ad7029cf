//! Lookup key validation and candidate extraction.
//!
//! A key is the identifier the lookup service knows a deep link by. Keys
//! come from two places: the first path segment (or host) of an explicit
//! launch URL, and the clipboard on a cold start. Both are validated here
//! before any network round trip is spent on them.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Letters, digits, underscore, hyphen; 4 to 64 characters.
const KEY_PATTERN: &str = r"^[A-Za-z0-9_-]{4,64}$";

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(KEY_PATTERN).expect("key pattern is a valid regex"));

/// Returns `true` if `candidate` is a syntactically plausible lookup key.
///
/// Total and side-effect free: garbage clipboard contents and decorative
/// URL segments simply return `false`.
pub fn is_valid_key(candidate: &str) -> bool {
    KEY_RE.is_match(candidate)
}

/// Extract a lookup key from a launch URL.
///
/// The first non-empty path segment wins if it validates; otherwise the
/// host is tried. Returns `None` when neither is a valid key.
pub fn key_from_url(url: &Url) -> Option<String> {
    let first_segment = url
        .path_segments()
        .and_then(|mut segments| segments.find(|s| !s.is_empty()));

    if let Some(segment) = first_segment
        && is_valid_key(segment)
    {
        return Some(segment.to_string());
    }

    url.host_str()
        .filter(|host| is_valid_key(host))
        .map(str::to_string)
}
