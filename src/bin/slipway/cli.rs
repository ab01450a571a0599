//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use slipway::util::shell::ColorChoice;

/// Slipway - build preparation for Arduino-on-ESP32 projects
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress status output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto", value_name = "WHEN")]
    pub color: ColorChoice,

    /// Run as if started in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Root directory for installed framework packages
    #[arg(
        long,
        global = true,
        env = "SLIPWAY_PACKAGES_ROOT",
        value_name = "DIR"
    )]
    pub packages_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prepare an environment for building
    Prepare(PrepareArgs),

    /// Report framework-libs freshness without changing anything
    Check(CheckArgs),

    /// Install the Python packages the build tooling needs
    Deps(DepsArgs),

    /// Print the custom sdkconfig fingerprint for an environment
    Fingerprint(FingerprintArgs),

    /// Remove the installed framework libs package
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct PrepareArgs {
    /// Environment to prepare (defaults to the project default)
    pub env: Option<String>,

    /// Skip the Python dependency bootstrap
    #[arg(long)]
    pub skip_python_deps: bool,

    /// Python interpreter to use
    #[arg(long, env = "SLIPWAY_PYTHON", value_name = "PATH")]
    pub python: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Environment to check (defaults to the project default)
    pub env: Option<String>,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DepsArgs {
    /// Show what would be installed without installing
    #[arg(long)]
    pub dry_run: bool,

    /// Python interpreter to use
    #[arg(long, env = "SLIPWAY_PYTHON", value_name = "PATH")]
    pub python: Option<PathBuf>,
}

#[derive(Args)]
pub struct FingerprintArgs {
    /// Environment to fingerprint (defaults to the project default)
    pub env: Option<String>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Environment whose settings to resolve (defaults to the project default)
    pub env: Option<String>,

    /// Also remove the recorded sdkconfig marker from the project
    #[arg(long)]
    pub marker: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
