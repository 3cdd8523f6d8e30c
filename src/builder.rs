//! File-level orchestrator that localizes an exported content tree and records its manifest.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use same_file::is_same_file;
use tracing::info;

use crate::config::LocalizerConfig;
use crate::content::ContentNode;
use crate::manifest::AssetLocalizer;
use crate::models::AssetManifest;

/// Generic build result type used by the file-level helpers.
pub type BuildResult<T> = Result<T>;

/// Outcome of localizing one export file.
#[derive(Debug)]
pub struct LocalizeSummary {
  /// Path the rewritten export was written to.
  pub output_path: PathBuf,
  /// Assets that have to be fetched for the rewritten export.
  pub manifest: AssetManifest,
}

/// High-level helper reading CMS exports from disk and writing localized copies.
#[derive(Debug, Clone)]
pub struct ExportBuilder {
  localizer: AssetLocalizer,
}

impl ExportBuilder {
  /// Create a builder for the provided configuration.
  pub fn new(config: LocalizerConfig) -> BuildResult<Self> {
    let localizer =
      AssetLocalizer::new(config).context("failed to compile asset classifier")?;
    Ok(Self { localizer })
  }

  /// Create a builder from the configuration discovered in `dir`, or the defaults.
  pub fn discover(dir: &Path) -> BuildResult<Self> {
    Self::new(LocalizerConfig::discover(dir))
  }

  /// Localizer shared by every file processed through this builder.
  pub fn localizer(&self) -> &AssetLocalizer {
    &self.localizer
  }

  /// Rewrite the export at `input`, writing the localized tree to `output`.
  ///
  /// The manifest is returned rather than written so callers can merge several exports
  /// before persisting it with [`write_manifest`].
  pub fn localize_file(&self, input: &Path, output: &Path) -> BuildResult<LocalizeSummary> {
    ensure_distinct_output(input, output)?;

    let tree = load_export(input)?;
    let mut manifest = AssetManifest::new();
    let localized = self
      .localizer
      .convert_asset_references(&tree, &mut manifest)
      .with_context(|| format!("failed to localize assets in {}", input.display()))?;

    let json = serde_json::to_string_pretty(&localized)
      .with_context(|| format!("failed to serialize localized export {}", input.display()))?;
    write_file(output, &json)?;

    info!(
      input = %input.display(),
      output = %output.display(),
      assets = manifest.len(),
      "localized CMS export"
    );

    Ok(LocalizeSummary {
      output_path: output.to_path_buf(),
      manifest,
    })
  }
}

/// Load a JSON content export from disk.
pub fn load_export(path: &Path) -> BuildResult<ContentNode> {
  let content = fs::read_to_string(path)
    .with_context(|| format!("export not found at {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse export JSON {}", path.display()))
}

/// Persist a manifest as prettified JSON.
pub fn write_manifest(manifest: &AssetManifest, path: &Path) -> BuildResult<()> {
  let json = serde_json::to_string_pretty(manifest).context("failed to serialize asset manifest")?;
  write_file(path, &json)
}

/// Load a manifest previously written by [`write_manifest`].
pub fn load_manifest(path: &Path) -> BuildResult<AssetManifest> {
  let content = fs::read_to_string(path)
    .with_context(|| format!("manifest not found at {}", path.display()))?;
  serde_json::from_str(&content).context("failed to parse asset manifest JSON")
}

fn ensure_distinct_output(input: &Path, output: &Path) -> BuildResult<()> {
  if output.exists() && is_same_file(input, output)? {
    bail!(
      "refusing to overwrite the source export {} with its localized copy",
      input.display()
    );
  }
  Ok(())
}

fn write_file(path: &Path, content: &str) -> BuildResult<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create directory {}", parent.display()))?;
  }
  fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::{Value, json};
  use tempfile::tempdir;

  fn write_export(dir: &Path, value: &Value) -> PathBuf {
    let path = dir.join("export.json");
    fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
  }

  #[test]
  fn localizes_exports_on_disk() -> BuildResult<()> {
    let temp = tempdir()?;
    let input = write_export(temp.path(), &json!({
      "entities": [{
        "title": "Forms",
        "fieldMedia": { "url": "https://prod.cms.va.gov/sites/default/files/banner.jpg" },
        "processed": "<a href=\"https://prod.cms.va.gov/sites/default/files/10-10EZ.pdf\">Apply</a>",
      }]
    }));
    let output = temp.path().join("out/localized.json");

    let builder = ExportBuilder::new(LocalizerConfig::default())?;
    let summary = builder.localize_file(&input, &output)?;

    let written: Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    assert_eq!(
      written,
      json!({
        "entities": [{
          "title": "Forms",
          "fieldMedia": { "url": "/img/banner.jpg" },
          "processed": "<a href=\"/files/10-10EZ.pdf\">Apply</a>",
        }]
      })
    );
    assert_eq!(summary.output_path, output);
    assert_eq!(summary.manifest.len(), 2);
    assert!(summary.manifest.get("img/banner.jpg").is_some());
    assert!(summary.manifest.get("files/10-10EZ.pdf").is_some());
    Ok(())
  }

  #[test]
  fn manifests_round_trip_through_disk() -> BuildResult<()> {
    let temp = tempdir()?;
    let path = temp.path().join("manifest.json");
    let mut manifest = AssetManifest::new();
    manifest.register("img/a.png", "https://a.cms.va.gov/sites/x/files/a.png");

    write_manifest(&manifest, &path)?;
    assert_eq!(load_manifest(&path)?, manifest);
    Ok(())
  }

  #[test]
  fn refuses_to_overwrite_the_input() -> BuildResult<()> {
    let temp = tempdir()?;
    let input = write_export(temp.path(), &json!({ "title": "x" }));

    let builder = ExportBuilder::new(LocalizerConfig::default())?;
    let error = builder.localize_file(&input, &input).unwrap_err();
    assert!(error.to_string().contains("refusing to overwrite"));
    assert_eq!(fs::read_to_string(&input)?, r#"{"title":"x"}"#);
    Ok(())
  }

  #[test]
  fn reports_malformed_exports() -> BuildResult<()> {
    let temp = tempdir()?;
    let input = temp.path().join("export.json");
    fs::write(&input, "{ nope")?;

    let builder = ExportBuilder::new(LocalizerConfig::default())?;
    let error = builder
      .localize_file(&input, &temp.path().join("out.json"))
      .unwrap_err();
    assert!(error.to_string().contains("failed to parse export JSON"));
    Ok(())
  }

  #[test]
  fn discovers_configuration_next_to_exports() -> BuildResult<()> {
    let temp = tempdir()?;
    fs::write(
      temp.path().join(crate::config::DEFAULT_CONFIG_FILE),
      r#"{ "cms_domain": "cms.example.org" }"#,
    )?;

    let builder = ExportBuilder::discover(temp.path())?;
    assert_eq!(builder.localizer().config().cms_domain, "cms.example.org");
    Ok(())
  }
}
