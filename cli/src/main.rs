use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

mod commands;
mod config;
mod logging;
mod utils;

use commands::{check, subjects, view};
use config::Settings;

/// TwinGuard CLI - Evaluate digital twin access policies
#[derive(Parser)]
#[command(name = "twg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./twinguard.yaml when present)
    #[arg(short, long, global = true, env = "TWINGUARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether subjects may access a resource
    Check(check::CheckArgs),

    /// List the subjects holding permissions on a resource
    Subjects(subjects::SubjectsArgs),

    /// Filter a document down to what subjects may see
    View(view::ViewArgs),

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() {
    // Pick up TWINGUARD_* variables from .env before clap reads them
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let _guard = logging::init_logging(&settings, cli.verbose)?;

    match cli.command {
        Commands::Check(args) => check::execute(args, &settings)?,
        Commands::Subjects(args) => subjects::execute(args, &settings)?,
        Commands::View(args) => view::execute(args, &settings)?,
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(&settings, format)?,
        },
    }

    Ok(())
}
