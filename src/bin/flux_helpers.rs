//! flux-helpers - Flux YAML and HelmRelease automation tools
//!
//! Bumps image tags in HelmRelease files and wires image pull secrets into
//! Helm charts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flux_helpers::chart::inject_image_pull_secrets;
use flux_helpers::{bump_release_file, UpdateDirective};

/// Flux YAML and HelmRelease automation tools
#[derive(Parser, Debug)]
#[command(name = "flux-helpers")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bump one or more image tags in a HelmRelease file
    Bump(BumpArgs),

    /// Add an optional imagePullSecrets block to a chart's deployments
    InjectPullSecrets(InjectArgs),
}

#[derive(Args, Debug)]
struct BumpArgs {
    /// Path to HelmRelease YAML file
    #[arg(short, long, env = "FLUX_HELPERS_FILE")]
    file: PathBuf,

    /// Image update in the form repo=version (repeatable)
    #[arg(long = "set", value_name = "REPO=VERSION", required = true)]
    sets: Vec<String>,

    /// Preview changes without modifying the file
    #[arg(long, env = "FLUX_HELPERS_DRY_RUN")]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct InjectArgs {
    /// Path to the Helm chart directory
    #[arg(short, long, env = "FLUX_HELPERS_CHART")]
    chart: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Bump(args) => bump(args),
        Commands::InjectPullSecrets(args) => inject(args),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        })
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn bump(args: BumpArgs) -> Result<()> {
    let updates = UpdateDirective::from_args(&args.sets)?;

    bump_release_file(&args.file, &updates, args.dry_run)
        .with_context(|| format!("failed to bump tags in {}", args.file.display()))?;
    Ok(())
}

fn inject(args: InjectArgs) -> Result<()> {
    let summary = inject_image_pull_secrets(&args.chart)
        .with_context(|| format!("failed to inject imagePullSecrets into {}", args.chart.display()))?;
    tracing::info!(
        "injection complete: {} template(s) updated, values.yaml {}",
        summary.templates_updated.len(),
        if summary.values_updated { "updated" } else { "unchanged" }
    );
    Ok(())
}
