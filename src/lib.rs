pub mod cli;
pub mod config;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{BuildConfig, LogVerbosity};
use model::{MapEntry, MapId, ReconcileReport};
use processor::optimizer::{self, MapOptimizer};
use processor::{AssetRegistry, BundleContribution, OutputLayout, driver};

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let mut config = match &args.config {
        Some(path) => BuildConfig::load(path)?,
        None => BuildConfig::default(),
    };
    args.overrides.apply(&mut config);
    config.validate().with_context(|| "Invalid build configuration")?;
    init_tracing(config.log_verbosity);

    match args.command {
        cli::Command::Scan { dir } => {
            for map in parser::scan_maps(&dir)? {
                println!("{}\t{}", map.entry.id, map.entry.path.display());
            }
        }
        cli::Command::Entries { dir, output } => {
            let contribution = contribution(&dir, &config)?;
            match output {
                Some(path) => {
                    let mut file = std::fs::File::create(&path)
                        .with_context(|| format!("Creating {}", path.display()))?;
                    writer::contribution::emit(&contribution, &mut file)
                        .with_context(|| format!("Writing {}", path.display()))?;
                }
                None => writer::contribution::emit(&contribution, &mut std::io::stdout().lock())
                    .with_context(|| "Writing bundle contribution")?,
            }
        }
        cli::Command::Reconcile { map } => {
            let report = reconcile_one(&map, &config)?;
            info!(map = %report.map, "done");
        }
        cli::Command::Build { dir } => {
            let optimizer = optimizer::from_config(&config.optimizer);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .with_context(|| "Starting async runtime")?;
            let reports = runtime.block_on(build(&dir, &config, optimizer))?;
            info!(maps = reports.len(), "build finished");
        }
    }

    Ok(())
}

fn init_tracing(verbosity: LogVerbosity) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.filter()));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Everything the bundler needs before it starts: inputs and watch files.
pub fn contribution(dir: &Path, config: &BuildConfig) -> anyhow::Result<BundleContribution> {
    // 1. ── Scan ───────────────────────────────────────────────────────
    let maps = parser::scan_maps(dir).with_context(|| format!("Scanning {}", dir.display()))?;
    // 2. ── Derive ─────────────────────────────────────────────────────
    let contribution = driver::contribute(&maps, config)?;
    Ok(contribution)
}

/// The close-bundle phase: optimize and reconcile every map in `dir`.
pub async fn build(
    dir: &Path,
    config: &BuildConfig,
    optimizer: Arc<dyn MapOptimizer>,
) -> anyhow::Result<Vec<ReconcileReport>> {
    // 1. ── Scan ───────────────────────────────────────────────────────
    let maps = parser::scan_maps(dir).with_context(|| format!("Scanning {}", dir.display()))?;
    info!(maps = maps.len(), dir = %dir.display(), "found maps");

    // 2. ── Optimize + reconcile ───────────────────────────────────────
    let plugins = driver::plugins(&maps, config)?;
    let reports = driver::close_bundle(
        plugins,
        optimizer,
        OutputLayout::new(&config.output_root),
        config.manifest.clone(),
    )
    .await?;

    Ok(reports)
}

/// Reconcile a single map against the current output tree.
pub fn reconcile_one(map: &Path, config: &BuildConfig) -> anyhow::Result<ReconcileReport> {
    let id = MapId::from_path(map).ok_or_else(|| anyhow!("{} has no file name", map.display()))?;
    let entry = MapEntry {
        id,
        path: map.to_path_buf(),
    };
    let layout = OutputLayout::new(&config.output_root);

    layout.check()?;
    let registry = AssetRegistry::build(layout.root(), config.manifest.as_deref())
        .with_context(|| "Indexing bundled assets")?;
    let report = processor::reconcile(&entry, &layout, &registry)
        .with_context(|| format!("Reconciling {}", map.display()))?;
    Ok(report)
}
