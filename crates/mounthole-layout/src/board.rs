//! The board document as the placer sees it: an ordered list of footprints
//! whose positions can be changed in place.

use mounthole_sexpr::ParseError;
use mounthole_sexpr::board::ExtractError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Board position in mm, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    /// Position in the document's footprint enumeration.
    pub index: usize,
    pub reference: Option<String>,
    /// Value text; empty when the footprint has none.
    pub label: String,
    pub position: Option<Position>,
    pub rotation: Option<f64>,
}

impl Footprint {
    /// Reference designator if there is one, the label otherwise.
    pub fn display_name(&self) -> &str {
        self.reference.as_deref().unwrap_or(&self.label)
    }
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("failed to read board {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write board {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse board {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("{} is not a KiCad board", path.display())]
    NotABoard {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },
    #[error("board has no footprint #{0}")]
    NoSuchFootprint(usize),
    #[error("cannot move footprint #{index} to non-finite position {position}")]
    NonFinitePosition { index: usize, position: Position },
}

/// Host-owned board document.
///
/// Footprints are enumerated in a stable order for the lifetime of the
/// document. Only positions change; footprints are never added or removed.
pub trait BoardDocument {
    fn footprints(&self) -> &[Footprint];

    /// Move footprint `index`, keeping its rotation.
    fn set_position(&mut self, index: usize, position: Position) -> Result<(), BoardError>;
}
