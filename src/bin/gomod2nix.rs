//! gomod2nix CLI binary.

use clap::Parser;
use gomod2nix::cli::{self, Cli};
use gomod2nix::logging::init_logging;
use std::process;
use tracing::error;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.default_log_level(), cli.log_format);

    if let Err(e) = cli::run(&cli) {
        error!("Generation failed: {e:#}");
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
