use std::sync::OnceLock;

use regex::Regex;

use crate::config::LocalizerConfig;

/// Domain-aware classifier turning CMS-hosted URLs into local site paths.
///
/// Only URLs on `<label>.(<label>.)*<cms_domain>` are recognised. Other hosts are passed
/// through untouched, even when they serve the same `/sites/<site>/files/` layout.
#[derive(Debug, Clone)]
pub struct AssetPathClassifier {
    hosted_prefix: Regex,
    hosted_domain: Regex,
    rich_content_marker: String,
    image_extensions: Vec<String>,
    image_dir: String,
    files_dir: String,
}

impl AssetPathClassifier {
    /// Compile the classifier patterns for the configured CMS domain.
    pub fn new(config: &LocalizerConfig) -> Result<Self, regex::Error> {
        let domain = regex::escape(&config.cms_domain);
        let hosted_prefix = Regex::new(&format!(
            r"^https?://([a-z0-9]+(-[a-z0-9]+)*\.)+{domain}/sites/.*/files/"
        ))?;
        let hosted_domain =
            Regex::new(&format!(r"(?i)^https?://([a-z0-9]+(-[a-z0-9]+)*\.)+{domain}"))?;

        Ok(Self {
            hosted_prefix,
            hosted_domain,
            rich_content_marker: format!("{}/sites", config.cms_domain),
            image_extensions: config
                .image_extensions
                .iter()
                .map(|extension| extension.to_ascii_lowercase())
                .collect(),
            image_dir: config.image_dir.trim_matches('/').to_string(),
            files_dir: config.files_dir.trim_matches('/').to_string(),
        })
    }

    /// Convert an asset URL into the local path it is served from after the build.
    ///
    /// The CMS prefix up to and including the last `/files/` segment is dropped together with
    /// any query string. Values that are still absolute URLs afterwards come back unchanged.
    /// Already-normalised paths are not recognised and would be prefixed a second time.
    pub fn normalize_asset_path(&self, url: &str) -> String {
        let asset_path = self.hosted_prefix.replace(url, "");
        if asset_path.starts_with("http") {
            return asset_path.into_owned();
        }

        let path = asset_path.split('?').next().unwrap_or_default();
        let dir = if self.is_image_path(path) {
            &self.image_dir
        } else {
            &self.files_dir
        };

        format!("/{dir}/{path}")
    }

    /// Strict check that the value is an absolute URL on the configured CMS domain.
    pub fn is_cms_hosted(&self, value: &str) -> bool {
        self.hosted_domain.is_match(value)
    }

    /// Whether an HTML attribute value points at CMS-hosted site files.
    pub fn is_rich_content_asset(&self, value: &str) -> bool {
        value.contains(&self.rich_content_marker)
    }

    /// Whether the text after the last `.` is one of the configured image extensions.
    pub fn is_image_path(&self, path: &str) -> bool {
        path.rsplit_once('.').is_some_and(|(_, extension)| {
            self.image_extensions.contains(&extension.to_ascii_lowercase())
        })
    }
}

fn default_classifier() -> &'static AssetPathClassifier {
    static CLASSIFIER: OnceLock<AssetPathClassifier> = OnceLock::new();
    CLASSIFIER.get_or_init(|| {
        AssetPathClassifier::new(&LocalizerConfig::default())
            .expect("invalid default CMS domain regex")
    })
}

/// Normalise an asset URL using the default configuration.
pub fn normalize_asset_path(url: &str) -> String {
    default_classifier().normalize_asset_path(url)
}
