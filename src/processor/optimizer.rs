//! The external map optimizer.
//!
//! Repacking tiles into chunks is not done here. The build only needs
//! something that, given a map and [`OptimizeOptions`], leaves an optimized
//! descriptor at [`OptimizeOptions::descriptor_path`].

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::OptimizerConfig;
use crate::model::OptimizeOptions;

#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error("cannot serialise optimizer options")]
    Options(#[from] serde_json::Error),

    #[error("cannot start optimizer `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("optimizer `{program}` failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("cannot copy {} to {}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait MapOptimizer: Send + Sync {
    async fn optimize(&self, map: &Path, options: &OptimizeOptions) -> Result<(), OptimizeError>;
}

pub fn from_config(config: &OptimizerConfig) -> Arc<dyn MapOptimizer> {
    match config {
        OptimizerConfig::Passthrough => Arc::new(PassthroughOptimizer),
        OptimizerConfig::Command { program, args } => Arc::new(CommandOptimizer {
            program: program.clone(),
            args: args.clone(),
        }),
    }
}

/// Runs `program [args…] <map> <options-json>` and waits for it.
#[derive(Debug, Clone)]
pub struct CommandOptimizer {
    pub program: String,
    pub args: Vec<String>,
}

#[async_trait]
impl MapOptimizer for CommandOptimizer {
    async fn optimize(&self, map: &Path, options: &OptimizeOptions) -> Result<(), OptimizeError> {
        let options_json = serde_json::to_string(options)?;
        debug!(program = %self.program, map = %map.display(), options = %options_json, "running optimizer");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(map)
            .arg(&options_json)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| OptimizeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if options.logs && !output.stdout.is_empty() {
            debug!(program = %self.program, "{}", String::from_utf8_lossy(&output.stdout).trim_end());
        }
        if !output.status.success() {
            return Err(OptimizeError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Writes the map unchanged where the optimizer would have put its output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughOptimizer;

#[async_trait]
impl MapOptimizer for PassthroughOptimizer {
    async fn optimize(&self, map: &Path, options: &OptimizeOptions) -> Result<(), OptimizeError> {
        let target = options.descriptor_path();
        tokio::fs::copy(map, &target)
            .await
            .map_err(|source| OptimizeError::Copy {
                from: map.to_path_buf(),
                to: target.clone(),
                source,
            })?;
        debug!(map = %map.display(), target = %target.display(), "copied map unchanged");
        Ok(())
    }
}
