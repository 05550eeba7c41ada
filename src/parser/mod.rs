//! Descriptor scanner.
//!
//! Walks one directory (non-recursively) and keeps every `.json` file that
//! is a Tiled map. Unrelated JSON is skipped without error; I/O failures
//! and maps that break the property rules are errors.

pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::model::{Descriptor, DescriptorError, MapEntry, MapId, ScannedMap};

pub const DESCRIPTOR_EXTENSION: &str = "json";

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cannot read directory {}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("map {} has no usable file name", path.display())]
    FileName { path: PathBuf },

    #[error("invalid map {}", path.display())]
    Descriptor {
        path: PathBuf,
        #[source]
        source: DescriptorError,
    },
}

/// Every map in `dir`, sorted by path.
pub fn scan_maps(dir: &Path) -> Result<Vec<ScannedMap>, ScanError> {
    let read_dir = |source| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut maps = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir)? {
        let path = entry.map_err(read_dir)?.path();
        if !is_descriptor_file(&path) {
            continue;
        }
        if let Some(map) = load_map(&path)? {
            maps.push(map);
        }
    }

    maps.sort_by(|a, b| a.entry.path.cmp(&b.entry.path));
    debug!(dir = %dir.display(), count = maps.len(), "scanned maps");
    Ok(maps)
}

fn is_descriptor_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(DESCRIPTOR_EXTENSION)
}

/// Load `path` if it is a map, `Ok(None)` if it is some other file.
pub fn load_map(path: &Path) -> Result<Option<ScannedMap>, ScanError> {
    let bytes = fs::read(path).map_err(|source| ScanError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // Non-UTF-8 content is a parse error here, not an I/O one.
    let value: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping file: not JSON");
            return Ok(None);
        }
    };

    match schema::check_map(&value) {
        Ok(shape) => debug!(
            path = %path.display(),
            width = shape.width,
            height = shape.height,
            layers = shape.layers.len(),
            "found map"
        ),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping file: not a map");
            return Ok(None);
        }
    }

    let id = MapId::from_path(path).ok_or_else(|| ScanError::FileName {
        path: path.to_path_buf(),
    })?;
    let descriptor = Descriptor::from_value(value).map_err(|source| ScanError::Descriptor {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(ScannedMap {
        entry: MapEntry {
            id,
            path: path.to_path_buf(),
        },
        descriptor,
    }))
}
