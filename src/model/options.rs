//! Per-map settings handed to the external optimizer.
//!
//! Serialises to the shape the optimizer expects:
//! `{ logs, output: { path, map: { name }, tileset: { name, size: { height, width } } } }`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::MapId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeOptions {
    pub logs: bool,
    pub output: OutputOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    /// Build output root the optimized descriptor is written into.
    pub path: PathBuf,
    pub map: MapOutput,
    pub tileset: TilesetOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapOutput {
    /// Stem of the optimized descriptor, `<path>/<name>.json`.
    pub name: MapId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilesetOutput {
    /// Prefix of every emitted tileset chunk.
    pub name: String,
    pub size: ChunkSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSize {
    pub height: u32,
    pub width: u32,
}

impl OptimizeOptions {
    /// Where the optimizer is expected to leave its descriptor.
    pub fn descriptor_path(&self) -> PathBuf {
        self.output
            .path
            .join(format!("{}.json", self.output.map.name))
    }
}
