//! Rewriting CMS asset references in a content tree while collecting the assets to fetch.

use tracing::{debug, trace};

use crate::asset_paths::{
    AssetPathClassifier, is_cms_asset_reference, is_localized_path, looks_like_html,
    make_manifest_key,
};
use crate::config::LocalizerConfig;
use crate::content::ContentNode;
use crate::error::LocalizeError;
use crate::manifest::html::rewrite_rich_content;
use crate::models::AssetManifest;
use crate::rewrite::{LeafTransform, rewrite_tree};

/// Localizes CMS asset references for one configuration.
#[derive(Debug, Clone)]
pub struct AssetLocalizer {
    config: LocalizerConfig,
    classifier: AssetPathClassifier,
}

impl AssetLocalizer {
    /// Compile the classifier for `config`.
    pub fn new(config: LocalizerConfig) -> Result<Self, LocalizeError> {
        let classifier = AssetPathClassifier::new(&config)?;
        Ok(Self { config, classifier })
    }

    /// Configuration the localizer was built from.
    pub fn config(&self) -> &LocalizerConfig {
        &self.config
    }

    /// Classifier used for every leaf and attribute.
    pub fn classifier(&self) -> &AssetPathClassifier {
        &self.classifier
    }

    /// Rewrite asset references in `tree`, registering every queued download in `manifest`.
    ///
    /// String leaves that reference CMS site files are replaced with their local path. The
    /// rich content field is parsed as HTML and its `href`/`src` attributes are rewritten
    /// instead. Every manifest key matches the path written into the returned tree.
    pub fn convert_asset_references(
        &self,
        tree: &ContentNode,
        manifest: &mut AssetManifest,
    ) -> Result<ContentNode, LocalizeError> {
        let mut transform = ManifestTransform {
            classifier: &self.classifier,
            rich_content_key: &self.config.rich_content_key,
            manifest,
        };
        rewrite_tree(tree, &mut transform)
    }
}

/// Rewrite asset references in `tree` with the default configuration.
pub fn convert_asset_references(
    tree: &ContentNode,
    manifest: &mut AssetManifest,
) -> Result<ContentNode, LocalizeError> {
    AssetLocalizer::new(LocalizerConfig::default())?.convert_asset_references(tree, manifest)
}

struct ManifestTransform<'a> {
    classifier: &'a AssetPathClassifier,
    rich_content_key: &'a str,
    manifest: &'a mut AssetManifest,
}

impl ManifestTransform<'_> {
    fn localize_reference(&mut self, value: &str) -> String {
        let local_path = self.classifier.normalize_asset_path(value);
        let key = make_manifest_key(&local_path);

        // The loose reference check also matches relative paths and markup; only absolute
        // CMS URLs that actually became local are fetchable.
        if !self.classifier.is_cms_hosted(value) || !is_localized_path(&local_path) {
            trace!(source = value, "asset reference is not a CMS download");
        } else if looks_like_html(&key) {
            trace!(source = value, "asset reference contains markup");
        } else {
            self.register(key, value);
        }

        local_path
    }

    fn localize_rich_content(&mut self, key: &str, html: &str) -> Result<String, LocalizeError> {
        let (output, assets) =
            rewrite_rich_content(self.classifier, html).map_err(|source| {
                LocalizeError::RichContent {
                    key: key.to_string(),
                    source,
                }
            })?;

        for asset in assets {
            self.register(asset.path, &asset.source);
        }
        Ok(output)
    }

    fn register(&mut self, path: String, source: &str) {
        debug!(path = %path, source, "queued CMS asset");
        if let Some(previous) = self.manifest.register(path, source) {
            if previous.source != source {
                debug!(
                    path = %previous.path,
                    previous = %previous.source,
                    source,
                    "replaced manifest entry from a different source"
                );
            }
        }
    }
}

impl LeafTransform for ManifestTransform<'_> {
    type Error = LocalizeError;

    fn transform_leaf(
        &mut self,
        value: &str,
        key: Option<&str>,
    ) -> Result<Option<String>, LocalizeError> {
        match key {
            Some(key) if key == self.rich_content_key && looks_like_html(value) => {
                self.localize_rich_content(key, value).map(Some)
            }
            _ if is_cms_asset_reference(value) => Ok(Some(self.localize_reference(value))),
            _ => Ok(None),
        }
    }
}
