//! Data structures produced while localizing a content export.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

/// Asset queued for download because the rewritten export now points at a local copy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetManifestEntry {
  /// Site-relative destination without a leading slash; also the manifest key.
  pub path: String,
  /// Original URL the asset is fetched from.
  pub source: String,
  /// Whether the asset is served by the CMS rather than another origin.
  pub is_asset_from_cms: bool,
  /// Downloaded bytes, empty until the fetch stage fills them in.
  #[serde(with = "base64_contents", default)]
  pub contents: Vec<u8>,
}

impl AssetManifestEntry {
  /// Create a pending CMS asset entry.
  pub fn from_cms(path: impl Into<String>, source: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      source: source.into(),
      is_asset_from_cms: true,
      contents: Vec::new(),
    }
  }

  /// Whether the asset still has to be fetched.
  pub fn is_pending(&self) -> bool {
    self.contents.is_empty()
  }
}

/// Assets to fetch, keyed by their local path.
///
/// Registering the same path twice keeps the later source; there is no conflict detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AssetManifest {
  entries: BTreeMap<String, AssetManifestEntry>,
}

impl AssetManifest {
  /// Create an empty manifest.
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue `source` for download to `path`, returning the entry it replaced.
  pub fn register(
    &mut self,
    path: impl Into<String>,
    source: impl Into<String>,
  ) -> Option<AssetManifestEntry> {
    let entry = AssetManifestEntry::from_cms(path, source);
    self.entries.insert(entry.path.clone(), entry)
  }

  /// Look up the entry stored under `path`.
  pub fn get(&self, path: &str) -> Option<&AssetManifestEntry> {
    self.entries.get(path)
  }

  /// Store downloaded bytes for `path`, returning `false` when no such entry exists.
  pub fn fill_contents(&mut self, path: &str, contents: Vec<u8>) -> bool {
    match self.entries.get_mut(path) {
      Some(entry) => {
        entry.contents = contents;
        true
      }
      None => false,
    }
  }

  /// Entries whose contents have not been fetched yet.
  pub fn pending(&self) -> impl Iterator<Item = &AssetManifestEntry> {
    self.entries.values().filter(|entry| entry.is_pending())
  }

  /// Iterate over all entries in path order.
  pub fn iter(&self) -> btree_map::Values<'_, String, AssetManifestEntry> {
    self.entries.values()
  }

  /// Number of queued assets.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Whether no asset has been queued.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl<'a> IntoIterator for &'a AssetManifest {
  type Item = &'a AssetManifestEntry;
  type IntoIter = btree_map::Values<'a, String, AssetManifestEntry>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

mod base64_contents {
  use base64::{Engine as _, engine::general_purpose};
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  pub fn serialize<S: Serializer>(contents: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&general_purpose::STANDARD.encode(contents))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    general_purpose::STANDARD
      .decode(encoded.as_bytes())
      .map_err(D::Error::custom)
  }
}
