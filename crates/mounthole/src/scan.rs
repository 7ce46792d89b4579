use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mounthole_layout::{BoardDocument, KicadBoard, MountConfig};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug, Default, Clone)]
pub struct ScanArgs {
    /// Board to inspect (overrides paths.board)
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub board: Option<PathBuf>,
}

pub fn execute(args: ScanArgs, config: &MountConfig) -> Result<()> {
    let board_path = match args.board {
        Some(path) => path,
        None => config.board_path()?.to_path_buf(),
    };
    let board = KicadBoard::load(&board_path)?;
    let classifier = config.classifier();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut matched = 0;
    for footprint in board.footprints() {
        if classifier.classify(&footprint.label, &mut out)? {
            matched += 1;
        }
    }
    out.flush()?;

    let total = board.footprints().len();
    log::debug!("{matched} of {total} footprints in {} matched", board_path.display());
    eprintln!(
        "{} mounting holes among {} footprints",
        matched.to_string().bold(),
        total
    );
    Ok(())
}
