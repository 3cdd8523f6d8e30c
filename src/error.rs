//! Error types shared by the localizer core.

use std::path::PathBuf;

use lol_html::errors::RewritingError;
use thiserror::Error;

/// Errors raised while rewriting asset references in a content tree.
#[derive(Debug, Error)]
pub enum LocalizeError {
    /// The HTML engine rejected a rich content fragment.
    ///
    /// `lol_html` parses malformed markup leniently, so this only surfaces for strict-mode
    /// parsing ambiguities or memory limits.
    #[error("failed to rewrite rich content field `{key}`: {source}")]
    RichContent {
        /// Key of the field holding the HTML fragment.
        key: String,
        /// Error reported by the HTML engine.
        #[source]
        source: RewritingError,
    },
    /// The configured CMS domain produced an invalid pattern.
    #[error("invalid CMS domain pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors raised while converting a content tree back into plain JSON.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    /// A container was reached again while it was still being serialized.
    #[error("content tree contains a cyclic reference and cannot be serialized")]
    CyclicReference,
}

/// Errors that can occur while loading the localizer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// Path that caused the error.
        path: PathBuf,
        /// Source I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Failed to parse the JSON configuration file.
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        /// Path that caused the error.
        path: PathBuf,
        /// Source parse error.
        #[source]
        source: serde_json::Error,
    },
}
