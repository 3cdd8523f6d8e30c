use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cms_asset_localizer::builder::write_manifest;
use cms_asset_localizer::{ExportBuilder, LocalizerConfig};
use tracing::info;

/// Rewrite CMS asset URLs in a content export to local site paths.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// JSON export produced by the CMS.
    input: PathBuf,
    /// Destination for the localized export.
    output: PathBuf,
    /// Where to write the manifest of assets to fetch.
    #[arg(long, default_value = "asset-manifest.json")]
    manifest: PathBuf,
    /// Localizer configuration file; defaults to the one next to the input, if any.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let builder = match &cli.config {
        Some(path) => ExportBuilder::new(
            LocalizerConfig::from_path(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
        )?,
        None => {
            let dir = cli
                .input
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            ExportBuilder::discover(&dir)?
        }
    };

    let summary = builder.localize_file(&cli.input, &cli.output)?;
    write_manifest(&summary.manifest, &cli.manifest)?;
    info!(
        manifest = %cli.manifest.display(),
        assets = summary.manifest.len(),
        "wrote asset manifest"
    );

    Ok(())
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
