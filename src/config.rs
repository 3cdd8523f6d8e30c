//! Localizer configuration describing the recognised CMS and local asset layout.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default configuration file searched for by [`LocalizerConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "asset-localizer.config.json";

/// Discoverable configuration describing which URLs are localized and where they land.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LocalizerConfig {
    /// Domain suffix of the CMS, preceded by at least one subdomain label in hosted URLs.
    pub cms_domain: String,
    /// Key of the field whose string value is an HTML fragment.
    pub rich_content_key: String,
    /// Extensions (without the dot, compared case-insensitively) routed to the image directory.
    pub image_extensions: Vec<String>,
    /// Site directory receiving image assets.
    pub image_dir: String,
    /// Site directory receiving every other asset.
    pub files_dir: String,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            cms_domain: "cms.va.gov".into(),
            rich_content_key: "processed".into(),
            image_extensions: ["png", "jpg", "jpeg", "gif", "svg"]
                .into_iter()
                .map(String::from)
                .collect(),
            image_dir: "img".into(),
            files_dir: "files".into(),
        }
    }
}

impl LocalizerConfig {
    /// Attempt to load configuration from the provided directory.
    ///
    /// A missing or unreadable configuration file falls back to the defaults.
    pub fn discover(dir: &Path) -> Self {
        Self::from_path(&dir.join(DEFAULT_CONFIG_FILE)).unwrap_or_default()
    }

    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
