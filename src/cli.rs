use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{BuildConfig, LogVerbosity, OptimizerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Build orchestration for Tiled map projects")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML build configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the maps found in a project directory
    Scan {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Print bundler inputs and watch files as JSON
    Entries {
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Reconcile one map whose optimized descriptor is already in the output root
    Reconcile {
        /// Original map descriptor
        map: PathBuf,
    },

    /// After bundling: optimize and reconcile every map
    Build {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Build output root
    #[arg(long = "out", global = true)]
    pub output_root: Option<PathBuf>,

    #[arg(long, global = true)]
    pub chunk_width: Option<u32>,

    #[arg(long, global = true)]
    pub chunk_height: Option<u32>,

    /// Tileset chunk name, `{map}` is replaced by the map name
    #[arg(long = "chunk-name", global = true)]
    pub chunk_name_pattern: Option<String>,

    /// Bundler manifest
    #[arg(long, global = true)]
    pub manifest: Option<PathBuf>,

    /// External optimizer program
    #[arg(long, global = true)]
    pub optimizer: Option<String>,

    /// Extra argument passed to the optimizer before the map path (repeatable)
    #[arg(long = "optimizer-arg", global = true, allow_hyphen_values = true)]
    pub optimizer_args: Vec<String>,

    /// Extra bundler input as `alias=path` (repeatable)
    #[arg(long = "entry", global = true, value_parser = parse_entry)]
    pub entries: Vec<(String, String)>,

    /// -v for optimizer logs and debug output
    #[arg(short, long, global = true, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut BuildConfig) {
        if let Some(root) = &self.output_root {
            config.output_root = root.clone();
        }
        if let Some(width) = self.chunk_width {
            config.chunk_width = width;
        }
        if let Some(height) = self.chunk_height {
            config.chunk_height = height;
        }
        if let Some(pattern) = &self.chunk_name_pattern {
            config.chunk_name_pattern = pattern.clone();
        }
        if let Some(manifest) = &self.manifest {
            config.manifest = Some(manifest.clone());
        }
        if let Some(program) = &self.optimizer {
            config.optimizer = OptimizerConfig::Command {
                program: program.clone(),
                args: self.optimizer_args.clone(),
            };
        }
        for (alias, path) in &self.entries {
            config.base_entries.insert(alias.clone(), path.clone());
        }
        if self.quiet {
            config.log_verbosity = LogVerbosity::Quiet;
        } else if self.verbose > 0 {
            config.log_verbosity = LogVerbosity::Verbose;
        }
    }
}

fn parse_entry(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((alias, path)) if !alias.is_empty() && !path.is_empty() => {
            Ok((alias.to_string(), path.to_string()))
        }
        _ => Err(format!("expected `alias=path`, got `{raw}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_config() {
        let cli = Cli::try_parse_from([
            "mapforge",
            "build",
            "maps",
            "--out",
            "public",
            "--chunk-width",
            "512",
            "--chunk-name",
            "{map}-tiles",
            "--optimizer",
            "npx",
            "--optimizer-arg",
            "wa-map-optimizer",
            "--entry",
            "admin=./admin.html",
            "-v",
        ])
        .unwrap();

        let mut config = BuildConfig::default();
        cli.overrides.apply(&mut config);

        assert!(matches!(cli.command, Command::Build { ref dir } if dir == &PathBuf::from("maps")));
        assert_eq!(config.output_root, PathBuf::from("public"));
        assert_eq!(config.chunk_width, 512);
        assert_eq!(config.chunk_height, 2048);
        assert_eq!(config.chunk_name_pattern, "{map}-tiles");
        assert_eq!(
            config.optimizer,
            OptimizerConfig::Command {
                program: "npx".into(),
                args: vec!["wa-map-optimizer".into()],
            }
        );
        assert_eq!(config.base_entries.len(), 2);
        assert_eq!(config.log_verbosity, LogVerbosity::Verbose);
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let cli = Cli::try_parse_from(["mapforge", "scan"]).unwrap();
        let mut config = BuildConfig::default();
        cli.overrides.apply(&mut config);
        assert_eq!(config, BuildConfig::default());
    }

    #[test]
    fn malformed_entry_is_rejected() {
        assert!(Cli::try_parse_from(["mapforge", "entries", "--entry", "index"]).is_err());
        assert!(parse_entry("=x").is_err());
        assert_eq!(parse_entry("a=b=c").unwrap(), ("a".into(), "b=c".into()));
    }
}
