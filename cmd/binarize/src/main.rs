//! binarize - turns a processed corpus into split binary training records.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voxbin_binarizer::{Binarizer, BinarizerConfig, Dispatch, ManifestCorpus};

/// Binarize a corpus described by `metadata.json` manifests.
///
/// Reads every directory of `processed_data_dir`, then writes `phone_set.json`,
/// `spk_map.json` and the valid/test/train containers with their length and
/// pitch statistics into `binary_data_dir`.
#[derive(Parser)]
#[command(name = "binarize")]
#[command(about = "Corpus binarizer")]
#[command(version)]
pub struct Cli {
    /// YAML config file
    #[arg(long)]
    pub config: PathBuf,

    /// Override binary_data_dir
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Rebuild phone_set.json even if it exists
    #[arg(long)]
    pub reset_phone_dict: bool,

    /// Extract on a worker pool of this size
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let mut cfg = BinarizerConfig::from_yaml_file(&cli.config)
        .with_context(|| format!("load config {}", cli.config.display()))?;
    if let Some(out) = cli.output {
        cfg.binary_data_dir = out;
    }
    if cli.reset_phone_dict {
        cfg.reset_phone_dict = true;
    }

    let corpus = Arc::new(ManifestCorpus::from_config(&cfg));
    let mut binarizer = Binarizer::new(cfg, corpus).context("load corpus")?;
    if let Some(workers) = cli.workers {
        binarizer = binarizer.with_dispatch(Dispatch::Pool { workers });
    }

    for summary in binarizer.process().context("binarize")? {
        info!(
            split = %summary.split,
            records = summary.records,
            skipped = summary.skipped,
            f0_mean_std = ?summary.f0_mean_std,
            "split done"
        );
    }
    Ok(())
}
