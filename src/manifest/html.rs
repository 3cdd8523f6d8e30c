//! Attribute-level rewriting of rich content HTML fragments.

use std::error::Error;

use html_escape::{decode_html_entities, encode_double_quoted_attribute};
use lol_html::errors::RewritingError;
use lol_html::html_content::Element;
use lol_html::{RewriteStrSettings, element, rewrite_str};

use crate::asset_paths::{AssetPathClassifier, is_localized_path, make_manifest_key};

type AttributeResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Asset referenced by an attribute that was rewritten to a local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichContentAsset {
    /// Manifest key derived from the rewritten attribute value.
    pub path: String,
    /// Attribute value before rewriting, with character references decoded.
    pub source: String,
}

/// Rewrite CMS asset links in an HTML fragment.
///
/// Every `href` and then every `src` attribute pointing at CMS site files is replaced with its
/// local path. The returned assets list the `href` rewrites before the `src` rewrites, each
/// group in document order. Attribute values are entity-decoded before classification, so
/// `&amp;` in a URL reaches the manifest as `&`. The rest of the markup is emitted unchanged.
///
/// `lol_html` recovers from malformed markup the way browsers do, so errors only surface for
/// strict-mode parsing ambiguities or exhausted memory limits.
pub fn rewrite_rich_content(
    classifier: &AssetPathClassifier,
    html: &str,
) -> Result<(String, Vec<RichContentAsset>), RewritingError> {
    let mut href_assets = Vec::new();
    let mut src_assets = Vec::new();

    let output = rewrite_str(html, RewriteStrSettings {
        element_content_handlers: vec![
            element!("[href]", |el| {
                localize_attribute(classifier, el, "href", &mut href_assets)
            }),
            element!("[src]", |el| {
                localize_attribute(classifier, el, "src", &mut src_assets)
            }),
        ],
        ..RewriteStrSettings::default()
    })?;

    href_assets.extend(src_assets);
    Ok((output, href_assets))
}

fn localize_attribute(
    classifier: &AssetPathClassifier,
    element: &mut Element<'_, '_>,
    attribute: &str,
    assets: &mut Vec<RichContentAsset>,
) -> AttributeResult {
    let Some(raw) = element.get_attribute(attribute) else {
        return Ok(());
    };
    let source = decode_html_entities(&raw).into_owned();
    if !classifier.is_rich_content_asset(&source) {
        return Ok(());
    }

    let local_path = classifier.normalize_asset_path(&source);
    if !is_localized_path(&local_path) {
        return Ok(());
    }

    element.set_attribute(attribute, &encode_double_quoted_attribute(&local_path))?;
    assets.push(RichContentAsset {
        path: make_manifest_key(&local_path),
        source,
    });
    Ok(())
}
