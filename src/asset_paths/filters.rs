use regex::Regex;

fn cms_asset_reference_pattern() -> &'static Regex {
    use std::sync::OnceLock;

    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^.*/sites/.*/files/").expect("invalid CMS asset reference regex")
    })
}

fn html_fragment_pattern() -> &'static Regex {
    use std::sync::OnceLock;

    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)</?[a-z][\s\S]*>").expect("invalid HTML tag regex"))
}

/// Determine whether a string leaf is a candidate CMS asset reference.
///
/// This only looks for a `/sites/<anything>/files/` segment on the first line, without any
/// domain check. Relative paths and markup can therefore match; callers confirm the host
/// separately before queueing a download.
pub fn is_cms_asset_reference(value: &str) -> bool {
    cms_asset_reference_pattern().is_match(value)
}

/// Determine whether a value contains something shaped like an HTML tag.
pub fn looks_like_html(value: &str) -> bool {
    html_fragment_pattern().is_match(value)
}
