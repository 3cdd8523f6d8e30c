#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod builder;
pub mod config;
pub mod content;
pub mod error;
pub mod manifest;
pub mod models;
pub mod rewrite;

pub use builder::{BuildResult, ExportBuilder, LocalizeSummary};
pub use config::LocalizerConfig;
pub use content::ContentNode;
pub use error::{ConfigError, ContentError, LocalizeError};
pub use manifest::{AssetLocalizer, convert_asset_references};
pub use models::{AssetManifest, AssetManifestEntry};
pub use rewrite::{LeafTransform, rewrite_tree};
