use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use mounthole_layout::MountConfig;
use std::path::{Path, PathBuf};

mod actions;
mod generate;
mod place;
mod scan;

#[derive(Parser)]
#[command(name = "mounthole")]
#[command(about = "Mounting hole placement for KiCad boards", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    /// Path to mount.toml (defaults to ./mount.toml when present)
    #[arg(long, global = true, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the mounting hole coordinate table
    #[command(alias = "g")]
    Generate(generate::GenerateArgs),

    /// Move the mounting holes on a board to the table coordinates
    #[command(alias = "p")]
    Place(place::PlaceArgs),

    /// Show which footprints on a board are mounting holes
    Scan(scan::ScanArgs),

    /// List registered board actions
    Actions,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug; RUST_LOG still wins.
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate(args) => generate::execute(args, &config),
        Commands::Place(args) => place::execute(args, config),
        Commands::Scan(args) => scan::execute(args, &config),
        Commands::Actions => actions::execute(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<MountConfig> {
    let config = match path {
        Some(path) => MountConfig::load(path)?,
        None => {
            let cwd = std::env::current_dir().context("failed to get current directory")?;
            MountConfig::discover(&cwd)?
        }
    };
    Ok(config)
}
