//! Mounting hole placement.
//!
//! The flow is: [`CoordinateTable`] holds the target hole coordinates,
//! [`Classifier`] picks the mounting hole footprints out of a
//! [`BoardDocument`], and [`place_holes`] moves each of them to its
//! coordinate after the [`OffsetTransform`]. [`action`] wraps that in a
//! named action a host can register and invoke.

pub mod action;
pub mod board;
pub mod classify;
pub mod config;
pub mod kicad;
pub mod placer;
pub mod table;
pub mod transform;

pub use action::{
    ActionContext, ActionInfo, ActionPlugin, ActionRegistry, MOUNT_HOLE_LAYOUT, MountHoleLayout,
    default_registry,
};
pub use board::{BoardDocument, BoardError, Footprint, Position};
pub use classify::{Classifier, MOUNTING_HOLE_MARKER};
pub use config::{ConfigError, MountConfig};
pub use kicad::KicadBoard;
pub use placer::{Pairing, PlaceError, Placement, PlacementOptions, PlacementReport, place_holes};
pub use table::{CoordinateTable, DEFAULT_TABLE_PATH, HoleCoordinate, OFFSET_CENTER, TableError};
pub use transform::{NonFiniteTransform, OffsetTransform};
