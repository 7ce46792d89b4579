use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mounthole_layout::{CoordinateTable, MountConfig};
use std::io;
use std::path::PathBuf;

#[derive(Args, Debug, Default, Clone)]
pub struct GenerateArgs {
    /// Where to write the table (defaults to paths.table, ./pcb/mount_locations.json)
    #[arg(short, long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: GenerateArgs, config: &MountConfig) -> Result<()> {
    let path = args.output.unwrap_or_else(|| config.paths.table.clone());
    let table = CoordinateTable::generate();

    table.write_csv(io::stdout().lock())?;
    table.write(&path)?;

    eprintln!(
        "{} {} hole coordinates to {}",
        "Wrote".green(),
        table.len(),
        path.display()
    );
    Ok(())
}
