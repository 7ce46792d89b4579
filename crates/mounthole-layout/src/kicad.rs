//! [`BoardDocument`] over a `.kicad_pcb` file.
//!
//! Moves are kept as pending patches against the original text and only
//! touch each footprint's own `(at ...)` list, so a save leaves the rest of
//! the file byte-identical.

use crate::board::{BoardDocument, BoardError, Footprint, Position};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use mounthole_sexpr::board::{FootprintAt, extract_footprints};
use mounthole_sexpr::{PatchSet, Span, parse};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const IN_MEMORY: &str = "<memory>";

#[derive(Debug, Clone, Copy)]
enum AtSlot {
    Replace(Span),
    Insert(usize),
}

#[derive(Debug, Clone)]
pub struct KicadBoard {
    source: String,
    footprints: Vec<Footprint>,
    slots: Vec<AtSlot>,
    moves: BTreeMap<usize, Position>,
}

impl KicadBoard {
    pub fn load(path: &Path) -> Result<Self, BoardError> {
        let source = fs::read_to_string(path).map_err(|source| BoardError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let board = Self::parse(source, path.to_path_buf())?;
        log::debug!(
            "Loaded {} footprints from {}",
            board.footprints.len(),
            path.display()
        );
        Ok(board)
    }

    pub fn from_source(source: impl Into<String>) -> Result<Self, BoardError> {
        Self::parse(source.into(), PathBuf::from(IN_MEMORY))
    }

    fn parse(source: String, path: PathBuf) -> Result<Self, BoardError> {
        let root = match parse(&source) {
            Ok(root) => root,
            Err(source) => return Err(BoardError::Parse { path, source }),
        };
        let extracted = match extract_footprints(&root) {
            Ok(extracted) => extracted,
            Err(source) => return Err(BoardError::NotABoard { path, source }),
        };

        let mut footprints = Vec::with_capacity(extracted.len());
        let mut slots = Vec::with_capacity(extracted.len());
        for (index, fp) in extracted.into_iter().enumerate() {
            slots.push(match fp.at_span {
                Some(span) => AtSlot::Replace(span),
                None => AtSlot::Insert(fp.insert_offset),
            });
            footprints.push(Footprint {
                index,
                reference: fp.reference,
                label: fp.value.unwrap_or_default(),
                position: fp.at.map(|at| Position { x: at.x, y: at.y }),
                rotation: fp.at.and_then(|at| at.rot),
            });
        }

        Ok(Self {
            source,
            footprints,
            slots,
            moves: BTreeMap::new(),
        })
    }

    pub fn is_modified(&self) -> bool {
        !self.moves.is_empty()
    }

    fn patches(&self) -> PatchSet {
        let mut patches = PatchSet::new();
        for (&index, position) in &self.moves {
            let at = FootprintAt {
                x: position.x,
                y: position.y,
                rot: self.footprints[index].rotation,
            };
            match self.slots[index] {
                AtSlot::Replace(span) => patches.replace_raw(span, at.to_sexpr_text()),
                AtSlot::Insert(offset) => patches.insert(offset, format!(" {}", at.to_sexpr_text())),
            }
        }
        patches
    }

    /// Board text with all moves applied.
    pub fn render(&self) -> String {
        self.patches().apply(&self.source)
    }

    /// Atomically write the board, with all moves applied, to `path`.
    pub fn save(&self, path: &Path) -> Result<(), BoardError> {
        let patches = self.patches();
        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|f| {
                patches.write_to(&self.source, &mut *f)?;
                f.flush()
            })
            .map_err(|err| match err {
                atomicwrites::Error::Internal(source) | atomicwrites::Error::User(source) => {
                    BoardError::Write {
                        path: path.to_path_buf(),
                        source,
                    }
                }
            })?;
        log::info!(
            "Saved board with {} moved footprints to {}",
            patches.len(),
            path.display()
        );
        Ok(())
    }
}

impl BoardDocument for KicadBoard {
    fn footprints(&self) -> &[Footprint] {
        &self.footprints
    }

    fn set_position(&mut self, index: usize, position: Position) -> Result<(), BoardError> {
        if !position.is_finite() {
            return Err(BoardError::NonFinitePosition { index, position });
        }
        let fp = self
            .footprints
            .get_mut(index)
            .ok_or(BoardError::NoSuchFootprint(index))?;
        log::debug!("Moving {} to {position}", fp.display_name());
        fp.position = Some(position);
        self.moves.insert(index, position);
        Ok(())
    }
}
