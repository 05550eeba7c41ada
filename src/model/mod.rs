pub mod descriptor;
pub mod options;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use descriptor::{Descriptor, DescriptorError, MAP_IMAGE_PROPERTY, SCRIPT_PROPERTY};
pub use options::{ChunkSize, MapOutput, OptimizeOptions, OutputOptions, TilesetOutput};

/// Name of a map, taken from the descriptor's filename stem.
///
/// The scanner derives it exactly once; the optimizer options and the
/// reconciler both receive this value instead of re-deriving it from
/// their own paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(String);

impl MapId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `maps/forest.json` → `forest`
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(|s| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A map descriptor on disk, keyed by its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub id: MapId,
    pub path: PathBuf,
}

impl MapEntry {
    /// Directory every relative asset reference of the map resolves against.
    pub fn project_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// A validated map as it comes out of the scanner.
#[derive(Debug, Clone)]
pub struct ScannedMap {
    pub entry: MapEntry,
    pub descriptor: Descriptor,
}

/// What a single reconciliation changed in the optimized descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub map: MapId,
    /// New `mapImage` value, when the image was copied.
    pub image: Option<String>,
    /// New `script` value, when the script was resolved.
    pub script: Option<String>,
}

impl ReconcileReport {
    pub fn new(map: MapId) -> Self {
        Self {
            map,
            image: None,
            script: None,
        }
    }
}
