//! Main entry point for the upgrade-bundle CLI tool

use anyhow::Context;
use clap::Parser;
use upgrade_bundle::cli::{Args, run_cli};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .format_timestamp(None)
        .parse_default_env()
        .init();

    let output = args.output.clone();
    run_cli(args).with_context(|| format!("failed to build {}", output.display()))
}
