//! `mount.toml` configuration.
//!
//! Every key is optional and defaults to the warning light board's values,
//! except the board path, which has to come from the file or the command line.

use crate::classify::{Classifier, MOUNTING_HOLE_MARKER};
use crate::placer::{Pairing, PlacementOptions};
use crate::table::DEFAULT_TABLE_PATH;
use crate::transform::{NonFiniteTransform, OffsetTransform};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "mount.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config {}", path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: NonFiniteTransform,
    },
    #[error("no board file given; pass --board or set paths.board in mount.toml")]
    MissingBoardPath,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountConfig {
    pub paths: PathsConfig,
    pub transform: OffsetTransform,
    pub placement: PlacementConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// `.kicad_pcb` file to edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<PathBuf>,
    /// Coordinate table, relative to the working directory.
    pub table: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            board: None,
            table: PathBuf::from(DEFAULT_TABLE_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementConfig {
    pub marker: String,
    pub pairing: Pairing,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            marker: MOUNTING_HOLE_MARKER.to_string(),
            pairing: Pairing::default(),
        }
    }
}

impl MountConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config
            .transform
            .validate()
            .map_err(|source| ConfigError::Transform {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `dir/mount.toml` if it exists, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            log::debug!("No {CONFIG_FILE_NAME} in {}, using defaults", dir.display());
            Ok(Self::default())
        }
    }

    pub fn board_path(&self) -> Result<&Path, ConfigError> {
        self.paths
            .board
            .as_deref()
            .ok_or(ConfigError::MissingBoardPath)
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.placement.marker.clone())
    }

    pub fn placement_options(&self) -> PlacementOptions {
        PlacementOptions {
            classifier: self.classifier(),
            transform: self.transform,
            pairing: self.placement.pairing,
        }
    }
}
