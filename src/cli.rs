//! CLI: argument parsing, pipeline invocation, and manifest writing.
//!
//! Everything here is glue; the pipeline itself lives in [`crate::generate`].

use crate::generate;
use crate::logging::LogFormat;
use crate::schema;
use anyhow::{Context, Result};
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "gomod2nix",
    version,
    about = "Generate deterministic Nix dependency hashes for Go modules"
)]
pub struct Cli {
    /// Go project directory containing go.mod
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Output manifest path, resolved relative to --dir unless absolute
    #[arg(long, default_value = "gomod2nix.toml")]
    pub outfile: PathBuf,

    /// Maximum concurrent hash computations (defaults to available CPUs)
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn jobs(&self) -> usize {
        self.jobs.unwrap_or_else(default_jobs)
    }

    pub fn default_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Manifest path with `--dir` applied.
    pub fn manifest_path(&self) -> PathBuf {
        if self.outfile.is_absolute() {
            self.outfile.clone()
        } else {
            self.dir.join(&self.outfile)
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Run the generation pipeline and write the manifest.
pub fn run(cli: &Cli) -> Result<()> {
    let manifest_path = cli.manifest_path();

    let packages = generate::generate_pkgs(&cli.dir, &manifest_path, cli.jobs())?;
    let rendered = schema::render_manifest(&packages)?;
    std::fs::write(&manifest_path, rendered)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    info!(
        manifest = %manifest_path.display(),
        packages = packages.len(),
        "Wrote manifest"
    );
    Ok(())
}
