//! Bundler integration: entry points, watch files and the close-bundle phase.
//!
//! Each map becomes a [`MapPlugin`]. While the bundle is being configured
//! the plugin registers its descriptor for watching; once the bundle has
//! closed it runs the optimizer for its map and then the reconciler.
//! Plugins of different maps run concurrently, the first failure aborts
//! the rest.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::model::{MapEntry, MapId, OptimizeOptions, ReconcileReport, ScannedMap};
use crate::processor::entries::{self, EntryTable};
use crate::processor::optimizer::{MapOptimizer, OptimizeError};
use crate::processor::reconcile::{self, OutputLayout, ReconcileError};
use crate::processor::registry::{AssetRegistry, RegistryError};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("maps {} and {} would both be written as `{id}`", first.display(), second.display())]
    DuplicateMap {
        id: MapId,
        first: PathBuf,
        second: PathBuf,
    },

    #[error(transparent)]
    Layout(ReconcileError),

    #[error("cannot index bundled assets")]
    Registry(#[from] RegistryError),

    #[error("optimizer failed for map `{map}`")]
    Optimize {
        map: MapId,
        #[source]
        source: OptimizeError,
    },

    #[error("cannot reconcile map `{map}`")]
    Reconcile {
        map: MapId,
        #[source]
        source: ReconcileError,
    },

    #[error("map task failed")]
    Task(#[from] JoinError),
}

/// Host-side hooks a plugin may call while the bundle is configured.
pub trait BundleHost {
    fn add_watch_file(&mut self, path: &Path);
}

/// Everything the build adds to the host bundler's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BundleContribution {
    /// Bundler inputs, alias → path.
    pub input: EntryTable,
    /// Files whose edits must retrigger the build.
    pub watch: Vec<PathBuf>,
}

impl BundleHost for BundleContribution {
    fn add_watch_file(&mut self, path: &Path) {
        if !self.watch.iter().any(|p| p == path) {
            self.watch.push(path.to_path_buf());
        }
    }
}

/// Optimize + reconcile for one map.
#[derive(Debug, Clone)]
pub struct MapPlugin {
    entry: MapEntry,
    options: OptimizeOptions,
}

impl MapPlugin {
    pub fn new(entry: MapEntry, config: &BuildConfig) -> Self {
        let options = config.optimize_options(&entry.id);
        Self { entry, options }
    }

    pub fn options(&self) -> &OptimizeOptions {
        &self.options
    }

    pub fn load(&self, host: &mut dyn BundleHost) {
        host.add_watch_file(&self.entry.path);
    }

    /// Run the optimizer to completion, then reconcile its output.
    pub async fn close_bundle(
        &self,
        optimizer: &dyn MapOptimizer,
        layout: &OutputLayout,
        registry: Arc<AssetRegistry>,
    ) -> Result<ReconcileReport, BuildError> {
        let map = self.entry.id.clone();
        info!(%map, path = %self.entry.path.display(), "optimizing");
        optimizer
            .optimize(&self.entry.path, &self.options)
            .await
            .map_err(|source| BuildError::Optimize {
                map: map.clone(),
                source,
            })?;

        let entry = self.entry.clone();
        let layout = layout.clone();
        tokio::task::spawn_blocking(move || reconcile::reconcile(&entry, &layout, &registry))
            .await?
            .map_err(|source| BuildError::Reconcile { map, source })
    }
}

/// One plugin per map, rejecting maps that would share an output name.
pub fn plugins(maps: &[ScannedMap], config: &BuildConfig) -> Result<Vec<MapPlugin>, BuildError> {
    let mut seen = HashMap::<&MapId, &Path>::new();
    let mut plugins = Vec::with_capacity(maps.len());
    for map in maps {
        if let Some(first) = seen.insert(&map.entry.id, &map.entry.path) {
            return Err(BuildError::DuplicateMap {
                id: map.entry.id.clone(),
                first: first.to_path_buf(),
                second: map.entry.path.clone(),
            });
        }
        plugins.push(MapPlugin::new(map.entry.clone(), config));
    }
    Ok(plugins)
}

/// Base entries, then one entry per map script, plus every map as a watch file.
pub fn contribute(maps: &[ScannedMap], config: &BuildConfig) -> Result<BundleContribution, BuildError> {
    let mut contribution = BundleContribution::default();
    for (alias, path) in &config.base_entries {
        contribution.input.insert(alias.clone(), path.clone());
    }
    for (alias, path) in entries::derive_entries(maps) {
        entries::insert_entry(&mut contribution.input, alias, path);
    }
    for plugin in plugins(maps, config)? {
        plugin.load(&mut contribution);
    }
    Ok(contribution)
}

/// The close-bundle phase for every map.
///
/// The output layout is checked and the asset registry built once, up
/// front; then each map is optimized and reconciled on its own task.
pub async fn close_bundle(
    plugins: Vec<MapPlugin>,
    optimizer: Arc<dyn MapOptimizer>,
    layout: OutputLayout,
    manifest: Option<PathBuf>,
) -> Result<Vec<ReconcileReport>, BuildError> {
    layout.check().map_err(BuildError::Layout)?;
    let registry = Arc::new(AssetRegistry::build(layout.root(), manifest.as_deref())?);

    let mut tasks = JoinSet::new();
    for plugin in plugins {
        let optimizer = Arc::clone(&optimizer);
        let layout = layout.clone();
        let registry = Arc::clone(&registry);
        tasks.spawn(async move {
            plugin
                .close_bundle(&*optimizer, &layout, registry)
                .await
        });
    }

    let mut reports = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok(report) => {
                reports.insert(report.map.clone(), report);
            }
            Err(e) => {
                warn!(error = %e, "aborting remaining maps");
                tasks.abort_all();
                return Err(e);
            }
        }
    }
    Ok(reports.into_values().collect())
}
