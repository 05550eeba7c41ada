//! Post-build reconciliation of an optimized map.
//!
//! Once the bundler has emitted its hashed assets and the optimizer has
//! written `<output>/<map>.json`, the optimized descriptor still points at
//! source files. This pass copies the background image next to it and
//! redirects `script` to the hashed bundle, then writes the descriptor back.
//!
//! Stages run in order and the first failure aborts the map. Nothing is
//! written to the optimized descriptor unless every stage succeeded.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::model::{
    Descriptor, DescriptorError, MAP_IMAGE_PROPERTY, MapEntry, MapId, ReconcileReport,
    SCRIPT_PROPERTY,
};
use crate::processor::entries::script_alias;
use crate::processor::registry::{ASSETS_DIR, AssetRegistry, RegistryError};
use crate::writer;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("cannot find {} build folder", path.display())]
    MissingOutputRoot { path: PathBuf },

    #[error("cannot find {} assets build folder", path.display())]
    MissingAssetsDir { path: PathBuf },

    #[error("unknown optimized map file on: {}", path.display())]
    MissingOptimizedDescriptor { path: PathBuf },

    #[error("optimized map {} has no properties, the optimizer did not run correctly", path.display())]
    MissingProperties { path: PathBuf },

    #[error("`script` of map `{map}` is not a string")]
    InvalidScript { map: MapId },

    #[error("script `{script}` of map `{map}` has no bundled file in {}", assets.display())]
    MissingScript {
        map: MapId,
        script: String,
        assets: PathBuf,
    },

    #[error("script `{script}` of map `{map}` is ambiguous: {}", candidates.join(", "))]
    AmbiguousScript {
        map: MapId,
        script: String,
        candidates: Vec<String>,
    },

    #[error("invalid map descriptor {}", path.display())]
    Descriptor {
        path: PathBuf,
        #[source]
        source: DescriptorError,
    },

    #[error("cannot {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where things live under the build output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join(ASSETS_DIR)
    }

    /// `<root>/<map>.json`
    pub fn descriptor_path(&self, map: &MapId) -> PathBuf {
        self.root.join(format!("{map}.json"))
    }

    /// The output root and its `assets` folder must both exist.
    pub fn check(&self) -> Result<(), ReconcileError> {
        if !self.root.is_dir() {
            return Err(ReconcileError::MissingOutputRoot {
                path: self.root.clone(),
            });
        }
        let assets = self.assets_dir();
        if !assets.is_dir() {
            return Err(ReconcileError::MissingAssetsDir { path: assets });
        }
        Ok(())
    }
}

/// Rewrite the optimized descriptor of `map` in place.
pub fn reconcile(
    map: &MapEntry,
    layout: &OutputLayout,
    registry: &AssetRegistry,
) -> Result<ReconcileReport, ReconcileError> {
    // 1. ── Preconditions ──────────────────────────────────────────────
    layout.check()?;
    let optimized_path = layout.descriptor_path(&map.id);
    if !optimized_path.is_file() {
        return Err(ReconcileError::MissingOptimizedDescriptor {
            path: optimized_path,
        });
    }

    // 2. ── Load ───────────────────────────────────────────────────────
    let original = read_descriptor(&map.path)?;
    let mut optimized = read_descriptor(&optimized_path)?;

    let mut report = ReconcileReport::new(map.id.clone());
    if original.has_properties() {
        // The optimizer carries properties over; losing them means it broke.
        if !optimized.has_properties() {
            return Err(ReconcileError::MissingProperties {
                path: optimized_path,
            });
        }
        // 3. ── Image ──────────────────────────────────────────────────
        report.image = rewrite_image(map, &original, &mut optimized, layout)?;
        // 4. ── Script ─────────────────────────────────────────────────
        report.script = rewrite_script(map, &original, &mut optimized, layout, registry)?;
    } else {
        debug!(map = %map.id, "original map has no properties");
    }

    // 5. ── Persist ────────────────────────────────────────────────────
    writer::descriptor::emit(&optimized, &optimized_path).map_err(|source| {
        ReconcileError::Io {
            action: "write",
            path: optimized_path.clone(),
            source,
        }
    })?;

    info!(
        map = %map.id,
        image = report.image.as_deref().unwrap_or("-"),
        script = report.script.as_deref().unwrap_or("-"),
        "reconciled"
    );
    Ok(report)
}

fn read_descriptor(path: &Path) -> Result<Descriptor, ReconcileError> {
    let json = fs::read_to_string(path).map_err(|source| ReconcileError::Io {
        action: "read",
        path: path.to_path_buf(),
        source,
    })?;
    Descriptor::from_json(&json).map_err(|source| ReconcileError::Descriptor {
        path: path.to_path_buf(),
        source,
    })
}

/// Copy the background image to `<root>/<map><ext>` and point `mapImage` at it.
fn rewrite_image(
    map: &MapEntry,
    original: &Descriptor,
    optimized: &mut Descriptor,
    layout: &OutputLayout,
) -> Result<Option<String>, ReconcileError> {
    let Some(image) = original.string_property(MAP_IMAGE_PROPERTY) else {
        return Ok(None);
    };

    let source = map.project_dir().join(image);
    if !source.is_file() {
        debug!(map = %map.id, image = %source.display(), "map image not found, skipping");
        return Ok(None);
    }

    let extension = Path::new(image)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let file_name = format!("{}{extension}", map.id);
    let target = layout.root().join(&file_name);

    fs::copy(&source, &target).map_err(|source| ReconcileError::Io {
        action: "copy map image to",
        path: target.clone(),
        source,
    })?;

    if !optimized.set_property(MAP_IMAGE_PROPERTY, file_name.as_str()) {
        warn!(map = %map.id, "optimized map has no `mapImage` property, image copied but not referenced");
        return Ok(None);
    }
    Ok(Some(file_name))
}

/// Point `script` at the hashed bundle built from the original script.
fn rewrite_script(
    map: &MapEntry,
    original: &Descriptor,
    optimized: &mut Descriptor,
    layout: &OutputLayout,
    registry: &AssetRegistry,
) -> Result<Option<String>, ReconcileError> {
    let Some(value) = original.property(SCRIPT_PROPERTY) else {
        return Ok(None);
    };
    let script = value.as_str().ok_or_else(|| ReconcileError::InvalidScript {
        map: map.id.clone(),
    })?;

    let missing = || ReconcileError::MissingScript {
        map: map.id.clone(),
        script: script.to_string(),
        assets: layout.assets_dir(),
    };
    let stem = script_alias(script).ok_or_else(missing)?;

    let artifact = registry.resolve(&stem).map_err(|e| match e {
        RegistryError::Ambiguous { candidates, .. } => ReconcileError::AmbiguousScript {
            map: map.id.clone(),
            script: script.to_string(),
            candidates,
        },
        _ => missing(),
    })?;

    let reference = format!("{ASSETS_DIR}/{artifact}");
    if !optimized.set_property(SCRIPT_PROPERTY, reference.as_str()) {
        warn!(map = %map.id, "optimized map has no `script` property");
        return Ok(None);
    }
    Ok(Some(reference))
}
