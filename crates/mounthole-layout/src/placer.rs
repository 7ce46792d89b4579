//! Moves mounting hole footprints to their coordinate table positions.

use crate::board::{BoardDocument, BoardError, Footprint, Position};
use crate::classify::Classifier;
use crate::table::CoordinateTable;
use crate::transform::{NonFiniteTransform, OffsetTransform};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use thiserror::Error;

/// How matched footprints are paired with table entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pairing {
    /// Table entry `i` goes to the `i`-th hole by reference designator in
    /// natural order (`H1`, `H2`, ..., `H10`). Independent of file order.
    #[default]
    Reference,
    /// Table entry `i` goes to the `i`-th hole in board enumeration order.
    Ordinal,
}

impl fmt::Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pairing::Reference => "reference",
            Pairing::Ordinal => "ordinal",
        })
    }
}

impl FromStr for Pairing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reference" => Ok(Pairing::Reference),
            "ordinal" => Ok(Pairing::Ordinal),
            other => Err(format!(
                "unknown pairing '{other}', expected 'reference' or 'ordinal'"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementOptions {
    pub classifier: Classifier,
    pub transform: OffsetTransform,
    pub pairing: Pairing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub table_index: usize,
    pub footprint_index: usize,
    pub reference: Option<String>,
    pub label: String,
    pub previous: Option<Position>,
    pub position: Position,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementReport {
    /// Footprints the classifier looked at.
    pub examined: usize,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Error)]
pub enum PlaceError {
    #[error(
        "found {matched} mounting hole footprints but the coordinate table has {expected} entries"
    )]
    CountMismatch { matched: usize, expected: usize },
    #[error("mounting hole footprint #{index} ({label}) has no reference designator")]
    MissingReference { index: usize, label: String },
    #[error("more than one mounting hole footprint has reference {0}")]
    DuplicateReference(String),
    #[error("invalid placement transform")]
    Transform(#[from] NonFiniteTransform),
    #[error("table entry hole_{table_index} maps to non-finite position {position}")]
    NonFinitePosition {
        table_index: usize,
        position: Position,
    },
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("failed to write placement diagnostics")]
    Diagnostics(#[from] io::Error),
}

/// Classify every footprint, pair the mounting holes with `table`, and move
/// them.
///
/// Every check runs before the first move, so on error the board is
/// unchanged. The board is not saved; that is up to the caller.
pub fn place_holes<B: BoardDocument + ?Sized>(
    board: &mut B,
    table: &CoordinateTable,
    options: &PlacementOptions,
    out: &mut dyn Write,
) -> Result<PlacementReport, PlaceError> {
    options.transform.validate()?;

    let mut matched = Vec::new();
    for fp in board.footprints() {
        if options.classifier.classify(&fp.label, out)? {
            matched.push(fp.clone());
        }
    }
    let examined = board.footprints().len();

    if matched.len() != table.len() {
        return Err(PlaceError::CountMismatch {
            matched: matched.len(),
            expected: table.len(),
        });
    }

    let ordered = order_holes(matched, options.pairing)?;
    let placements: Vec<Placement> = ordered
        .into_iter()
        .zip(table)
        .enumerate()
        .map(|(table_index, (fp, hole))| Placement {
            table_index,
            footprint_index: fp.index,
            reference: fp.reference,
            label: fp.label,
            previous: fp.position,
            position: options.transform.apply(*hole),
        })
        .collect();

    if let Some(bad) = placements.iter().find(|p| !p.position.is_finite()) {
        return Err(PlaceError::NonFinitePosition {
            table_index: bad.table_index,
            position: bad.position,
        });
    }

    for placement in &placements {
        if placement.previous.is_none() {
            log::warn!(
                "Footprint #{} ({}) has no position; adding one",
                placement.footprint_index,
                placement.label
            );
        }
        board.set_position(placement.footprint_index, placement.position)?;
    }

    log::debug!(
        "Placed {} of {examined} footprints using {} pairing",
        placements.len(),
        options.pairing
    );
    Ok(PlacementReport {
        examined,
        placements,
    })
}

fn order_holes(mut holes: Vec<Footprint>, pairing: Pairing) -> Result<Vec<Footprint>, PlaceError> {
    match pairing {
        Pairing::Ordinal => Ok(holes),
        Pairing::Reference => {
            let mut seen = HashSet::new();
            for fp in &holes {
                let Some(reference) = fp.reference.as_deref() else {
                    return Err(PlaceError::MissingReference {
                        index: fp.index,
                        label: fp.label.clone(),
                    });
                };
                if !seen.insert(reference) {
                    return Err(PlaceError::DuplicateReference(reference.to_string()));
                }
            }
            holes.sort_by(|a, b| {
                natord::compare(
                    a.reference.as_deref().unwrap_or_default(),
                    b.reference.as_deref().unwrap_or_default(),
                )
            });
            Ok(holes)
        }
    }
}
