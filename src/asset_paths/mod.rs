//! Helpers for classifying CMS asset references and normalising them to local paths.
//!
//! The responsibilities are split into focused submodules so that the domain-aware
//! classifier, the configuration-independent filters, and the manifest key derivation can be
//! tested independently. The tree transform and the HTML attribute pass share all of them so
//! that both produce identical local paths for the same source URL.

mod bundle;
mod classifier;
mod filters;

pub use bundle::{is_localized_path, make_manifest_key};
pub use classifier::{AssetPathClassifier, normalize_asset_path};
pub use filters::{is_cms_asset_reference, looks_like_html};
