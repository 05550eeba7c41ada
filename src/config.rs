//! Build configuration.
//!
//! Loaded from an optional TOML file, then overridden from the command line
//! (see [`crate::cli::Overrides`]). Every field has a default, so an empty
//! file is a valid configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{ChunkSize, MapId, MapOutput, OptimizeOptions, OutputOptions, TilesetOutput};

/// Placeholder replaced by the map name in `chunk_name_pattern`.
pub const MAP_PLACEHOLDER: &str = "{map}";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("chunk size must be non-zero, got {width}x{height}")]
    ZeroChunk { width: u32, height: u32 },

    #[error("chunk name pattern `{0}` does not contain `{{map}}`")]
    ChunkPattern(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogVerbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl LogVerbosity {
    /// Default `tracing` filter directive for this level.
    pub fn filter(self) -> &'static str {
        match self {
            LogVerbosity::Quiet => "warn",
            LogVerbosity::Normal => "info",
            LogVerbosity::Verbose => "debug",
        }
    }
}

/// Which optimizer runs once the bundle has closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OptimizerConfig {
    /// Copy the descriptor into the output root unchanged.
    #[default]
    Passthrough,
    /// Run `program [args…] <map> <options-json>`.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub output_root: PathBuf,
    pub chunk_width: u32,
    pub chunk_height: u32,
    pub chunk_name_pattern: String,
    pub log_verbosity: LogVerbosity,
    /// Bundler manifest; `<output_root>/.vite/manifest.json` is tried when unset.
    pub manifest: Option<PathBuf>,
    /// Bundler inputs that exist regardless of maps, alias → path.
    pub base_entries: BTreeMap<String, String>,
    pub optimizer: OptimizerConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("dist"),
            chunk_width: 2048,
            chunk_height: 2048,
            chunk_name_pattern: format!("{MAP_PLACEHOLDER}-chunk"),
            log_verbosity: LogVerbosity::Normal,
            manifest: None,
            base_entries: BTreeMap::from([("index".to_string(), "./index.html".to_string())]),
            optimizer: OptimizerConfig::Passthrough,
        }
    }
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_width == 0 || self.chunk_height == 0 {
            return Err(ConfigError::ZeroChunk {
                width: self.chunk_width,
                height: self.chunk_height,
            });
        }
        if !self.chunk_name_pattern.contains(MAP_PLACEHOLDER) {
            return Err(ConfigError::ChunkPattern(self.chunk_name_pattern.clone()));
        }
        Ok(())
    }

    pub fn tileset_name(&self, map: &MapId) -> String {
        self.chunk_name_pattern
            .replace(MAP_PLACEHOLDER, map.as_str())
    }

    pub fn optimize_options(&self, map: &MapId) -> OptimizeOptions {
        OptimizeOptions {
            logs: self.log_verbosity == LogVerbosity::Verbose,
            output: OutputOptions {
                path: self.output_root.clone(),
                map: MapOutput { name: map.clone() },
                tileset: TilesetOutput {
                    name: self.tileset_name(map),
                    size: ChunkSize {
                        height: self.chunk_height,
                        width: self.chunk_width,
                    },
                },
            },
        }
    }
}
