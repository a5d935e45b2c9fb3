//! Command-line entry point for LoopForge.

use anyhow::Result;
use clap::Parser;
use loopforge_engine::cli::{run_cli, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    run_cli(cli)
}
