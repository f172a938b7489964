//! tokensync CLI: keep design-token files and a design file's variables in sync.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use manifest::TokensyncManifest;

#[derive(Parser)]
#[command(name = "tokensync", version, about = "Sync design tokens with design-file variables")]
struct Cli {
    /// Log per-entity decisions
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tokensync.toml and a tokens/ directory
    Init {
        /// Project directory (default: current directory)
        dir: Option<String>,
    },
    /// Show the changes a sync would submit
    Plan {
        /// Directory of token files (default: tokens.dir from tokensync.toml)
        #[arg(long)]
        tokens_dir: Option<PathBuf>,
        /// Key of the design file
        #[arg(long, env = "FILE_KEY")]
        file_key: Option<String>,
        /// Print the change-set payload as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reconcile token files and submit the change-set
    Sync {
        /// Directory of token files (default: tokens.dir from tokensync.toml)
        #[arg(long)]
        tokens_dir: Option<PathBuf>,
        /// Key of the design file
        #[arg(long, env = "FILE_KEY")]
        file_key: Option<String>,
        /// Compute and print the change-set without submitting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Write token files from the design file's variables
    Export {
        /// Output directory (default: tokens.export_dir from tokensync.toml)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Key of the design file
        #[arg(long, env = "FILE_KEY")]
        file_key: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { dir } => commands::init::run(&cwd, dir.as_deref()),

        Commands::Plan {
            tokens_dir,
            file_key,
            json,
        } => {
            let (manifest, project_dir) = load_manifest(&cwd)?;
            let tokens_dir = tokens_dir.map(|d| cwd.join(d));
            commands::plan::run(
                &project_dir,
                &manifest,
                tokens_dir.as_deref(),
                file_key.as_deref(),
                json,
            )
        }

        Commands::Sync {
            tokens_dir,
            file_key,
            dry_run,
        } => {
            let (manifest, project_dir) = load_manifest(&cwd)?;
            let tokens_dir = tokens_dir.map(|d| cwd.join(d));
            commands::sync::run(
                &project_dir,
                &manifest,
                tokens_dir.as_deref(),
                file_key.as_deref(),
                dry_run,
            )
        }

        Commands::Export {
            output_dir,
            file_key,
        } => {
            let (manifest, project_dir) = load_manifest(&cwd)?;
            let output_dir = output_dir.map(|d| cwd.join(d));
            commands::export::run(
                &project_dir,
                &manifest,
                output_dir.as_deref(),
                file_key.as_deref(),
            )
        }
    }
}

/// Load `tokensync.toml` if there is one; otherwise use defaults rooted at `cwd`.
fn load_manifest(cwd: &Path) -> anyhow::Result<(TokensyncManifest, PathBuf)> {
    match TokensyncManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((manifest, dir)),
        None => {
            log::debug!("no tokensync.toml found, using defaults");
            Ok((TokensyncManifest::default(), cwd.to_path_buf()))
        }
    }
}
