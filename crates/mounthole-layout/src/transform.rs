use crate::board::Position;
use crate::table::HoleCoordinate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A transform parameter that is NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("transform.{field} must be a finite number, got {value}")]
pub struct NonFiniteTransform {
    pub field: &'static str,
    pub value: f64,
}

/// Maps table coordinates (y up, centered) to board coordinates (y down,
/// origin at the sheet corner).
///
/// `x = offset_x + table_x + width / 2`, `y = offset_y - table_y + height / 2`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OffsetTransform {
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for OffsetTransform {
    fn default() -> Self {
        Self {
            offset_x: 50.0,
            offset_y: 50.0,
            width: 80.0,
            height: 80.0,
        }
    }
}

impl OffsetTransform {
    /// TOML accepts `nan` and `inf`, which would end up in the board file.
    pub fn validate(&self) -> Result<(), NonFiniteTransform> {
        let fields = [
            ("offset_x", self.offset_x),
            ("offset_y", self.offset_y),
            ("width", self.width),
            ("height", self.height),
        ];
        match fields.into_iter().find(|(_, value)| !value.is_finite()) {
            Some((field, value)) => Err(NonFiniteTransform { field, value }),
            None => Ok(()),
        }
    }

    pub fn apply(&self, hole: HoleCoordinate) -> Position {
        Position {
            x: self.offset_x + hole.x + self.width / 2.0,
            y: self.offset_y - hole.y + self.height / 2.0,
        }
    }
}
