use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mounthole_layout::{
    ActionContext, KicadBoard, MOUNT_HOLE_LAYOUT, MountConfig, Pairing, default_registry,
};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug, Default, Clone)]
pub struct PlaceArgs {
    /// Board to edit (overrides paths.board)
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub board: Option<PathBuf>,

    /// Coordinate table (overrides paths.table)
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub table: Option<PathBuf>,

    /// How holes are matched to table entries: 'reference' (H1 gets the first
    /// entry) or 'ordinal' (board order)
    #[arg(long, value_name = "MODE")]
    pub pairing: Option<Pairing>,

    /// Show the new positions without saving the board
    #[arg(long)]
    pub dry_run: bool,

    /// Save the edited board here instead of overwriting the input
    #[arg(short, long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: PlaceArgs, mut config: MountConfig) -> Result<()> {
    if let Some(board) = args.board {
        config.paths.board = Some(board);
    }
    if let Some(table) = args.table {
        config.paths.table = table;
    }
    if let Some(pairing) = args.pairing {
        config.placement.pairing = pairing;
    }

    let board_path = config.board_path()?.to_path_buf();
    let registry = default_registry(&config)?;
    let mut board = KicadBoard::load(&board_path)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    registry.run(
        MOUNT_HOLE_LAYOUT,
        &mut ActionContext {
            board: &mut board,
            out: &mut out,
        },
    )?;
    out.flush()?;

    if !board.is_modified() && args.output.is_none() {
        eprintln!("{}", "No footprints moved; board left as is".yellow());
        return Ok(());
    }
    if args.dry_run {
        eprintln!("{}", "Dry run: board not saved".yellow());
        return Ok(());
    }

    let target = args.output.unwrap_or(board_path);
    board.save(&target)?;
    eprintln!("{} {}", "Saved".green(), target.display());
    Ok(())
}
