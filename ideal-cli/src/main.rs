//! ideal: keep a project's `.claude/` workflow directory in sync with a
//! template repository.
//!
//! # Usage
//!
//! ```text
//! ideal init   [--force] [--name N] [--branch B] [--stack S] [--repo OWNER/REPO]
//!              [--ref BRANCH] [--template-path P] [--template-dir DIR]
//! ideal update [--force] [--dry-run] [--template-dir DIR]
//! ideal diff   [--path P] [--template-dir DIR]
//! ideal config list | get <key> | set <key> <value>
//! ideal doctor [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigCommand, diff::DiffArgs, doctor::DoctorArgs, init::InitArgs,
    update::UpdateArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ideal",
    version,
    about = "Bootstrap and update a project's .claude workflow templates",
    long_about = None,
)]
struct Cli {
    /// Log debug output to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install the workflow template into the current project.
    Init(InitArgs),

    /// Pull template updates, preserving local edits where possible.
    Update(UpdateArgs),

    /// Show unified diffs between local files and the current template.
    Diff(DiffArgs),

    /// Read or edit `.claude/project-config.md`.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Check the environment and project setup.
    Doctor(DoctorArgs),
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "warn,ideal_core=debug,ideal_sync=debug,ideal_detector=debug,ideal=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Update(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
        Commands::Doctor(args) => args.run(),
    }
}
