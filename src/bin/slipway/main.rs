//! Slipway CLI - build preparation for Arduino-on-ESP32 projects

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use slipway::util::shell::Shell;
use slipway::util::GlobalContext;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("slipway=debug")
    } else {
        EnvFilter::new("slipway=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let shell = Arc::new(Shell::from_flags(cli.quiet, cli.verbose, cli.color));

    let mut gctx = match &cli.project_dir {
        Some(dir) => GlobalContext::with_cwd(dir.clone())?,
        None => GlobalContext::new()?,
    };
    gctx.set_packages_root(cli.packages_root.clone());

    // Execute command
    match cli.command {
        Commands::Prepare(args) => commands::prepare::execute(args, &gctx, &shell),
        Commands::Check(args) => commands::check::execute(args, &gctx, &shell),
        Commands::Deps(args) => commands::deps::execute(args, &gctx, &shell),
        Commands::Fingerprint(args) => commands::fingerprint::execute(args, &gctx),
        Commands::Clean(args) => commands::clean::execute(args, &gctx, &shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
