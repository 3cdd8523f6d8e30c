use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Produce the manifest key for a normalised local path.
///
/// The key is the percent-decoded path without its leading slash, so it can be joined onto
/// the site root directly. Paths that do not decode to UTF-8 are kept as they are.
pub fn make_manifest_key(local_path: &str) -> String {
    let decoded = percent_decode_str(local_path)
        .decode_utf8()
        .map(Cow::into_owned)
        .unwrap_or_else(|_| local_path.to_string());

    match decoded.strip_prefix('/') {
        Some(stripped) => stripped.to_string(),
        None => decoded,
    }
}

/// Whether normalisation actually produced a site path rather than passing a URL through.
pub fn is_localized_path(path: &str) -> bool {
    path.starts_with('/')
}
