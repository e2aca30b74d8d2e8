//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Cooler - keeps Kodi add-ons and skins in sync with their upstream releases
#[derive(Parser, Debug)]
#[command(name = "cooler")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a runtime config file (default: ~/.cooler/cooler-runtime.yaml)
    #[arg(short, long, global = true, env = "COOLER_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version(VersionArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Run as a service: startup pass, on-ready actions, background loop
    Run(RunArgs),

    /// Reconcile components once and exit
    Reconcile(ReconcileArgs),

    /// Compare installed and latest versions without installing
    Check(CheckArgs),
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Config commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration
    Show(ConfigShowArgs),

    /// Print the runtime config file location
    Path,
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Service command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Skip the periodic background loop
    #[arg(long)]
    pub no_background: bool,

    /// Exit after the startup pass instead of waiting for Ctrl-C
    #[arg(long)]
    pub once: bool,
}

// Reconcile command
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Only reconcile this component (repeatable)
    #[arg(short = 'C', long = "component")]
    pub components: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Only check this component (repeatable)
    #[arg(short = 'C', long = "component")]
    pub components: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
