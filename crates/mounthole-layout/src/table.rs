//! The coordinate table: target hole positions handed from the generator to
//! the placer through `mount_locations.json`.

use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Distance of the three corner holes from the layout center, in mm.
pub const OFFSET_CENTER: f64 = 35.0;

pub const DEFAULT_TABLE_PATH: &str = "./pcb/mount_locations.json";

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read coordinate table {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write coordinate table {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed coordinate table {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize coordinate table")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write coordinate CSV")]
    Csv(#[from] csv::Error),
}

/// A hole position in the logical layout space, in mm. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleCoordinate {
    pub x: f64,
    pub y: f64,
}

impl HoleCoordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Whole millimeter values are written as JSON integers.
struct JsonNumber(f64);

impl Serialize for JsonNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;
        if self.0.fract() == 0.0 && self.0.abs() < EXACT_INT_LIMIT {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl Serialize for HoleCoordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&JsonNumber(self.x))?;
        pair.serialize_element(&JsonNumber(self.y))?;
        pair.end()
    }
}

impl<'de> Deserialize<'de> for HoleCoordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (x, y) = <(f64, f64)>::deserialize(deserializer)?;
        Ok(Self { x, y })
    }
}

/// Ordered hole coordinates. Table index is the only hole identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateTable {
    pub holes: Vec<HoleCoordinate>,
}

impl CoordinateTable {
    pub fn new(holes: Vec<HoleCoordinate>) -> Self {
        Self { holes }
    }

    /// The warning light enclosure's four holes.
    pub fn generate() -> Self {
        Self::new(vec![
            // -x, y
            HoleCoordinate::new(-13.0, 32.0),
            // -x, -y
            HoleCoordinate::new(-OFFSET_CENTER, -OFFSET_CENTER),
            // x, -y
            HoleCoordinate::new(OFFSET_CENTER, -OFFSET_CENTER),
            // x, y
            HoleCoordinate::new(OFFSET_CENTER, OFFSET_CENTER),
        ])
    }

    pub fn len(&self) -> usize {
        self.holes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HoleCoordinate> {
        self.holes.iter()
    }

    /// Pretty JSON with 4-space indentation.
    pub fn to_json(&self) -> Result<String, TableError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser).map_err(TableError::Serialize)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn from_json(text: &str, path: &Path) -> Result<Self, TableError> {
        serde_json::from_str(text).map_err(|source| TableError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the table to `path`, replacing whatever is there.
    pub fn write(&self, path: &Path) -> Result<(), TableError> {
        let contents = self.to_json()?;
        let write_err = |source| TableError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|f| {
                f.write_all(contents.as_bytes())?;
                f.flush()
            })
            .map_err(|err| match err {
                atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => write_err(e),
            })?;

        log::info!("Wrote {} hole coordinates to {}", self.len(), path.display());
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, TableError> {
        let text = fs::read_to_string(path).map_err(|source| TableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json(&text, path)?;
        log::debug!("Read {} hole coordinates from {}", table.len(), path.display());
        Ok(table)
    }

    /// Dump as `hole_N x,X` / `hole_N y,Y` lines for checking against the
    /// mechanical drawing.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        for (i, hole) in self.holes.iter().enumerate() {
            csv.write_record([format!("hole_{i} x"), hole.x.to_string()])?;
            csv.write_record([format!("hole_{i} y"), hole.y.to_string()])?;
        }
        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a CoordinateTable {
    type Item = &'a HoleCoordinate;
    type IntoIter = std::slice::Iter<'a, HoleCoordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.holes.iter()
    }
}
