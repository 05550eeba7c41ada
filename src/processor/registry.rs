//! Lookup from a source stem to the hashed file the bundler emitted for it.
//!
//! Built once per build, after the bundle has closed. The bundler manifest
//! is authoritative when there is one; otherwise the `assets` directory is
//! listed and matched by name prefix.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

/// Output subdirectory holding the hashed artifacts.
pub const ASSETS_DIR: &str = "assets";

/// Manifest location the bundler uses by default, relative to the output root.
pub const DEFAULT_MANIFEST: &str = ".vite/manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("cannot list assets folder {}", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read bundler manifest {}", path.display())]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid bundler manifest {}", path.display())]
    ParseManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no bundled artifact for `{stem}`")]
    NotFound { stem: String },

    #[error("`{stem}` matches several bundled artifacts: {}", candidates.join(", "))]
    Ambiguous { stem: String, candidates: Vec<String> },
}

/// One record of the bundler manifest. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct ManifestChunk {
    file: String,
    #[serde(default, rename = "isEntry")]
    is_entry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Index {
    /// stem → artifact names, from the manifest.
    Manifest(BTreeMap<String, Vec<String>>),
    /// Every file name in the assets folder.
    Listing(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRegistry {
    index: Index,
}

impl AssetRegistry {
    /// Manifest if `manifest` (or the default location) exists, listing otherwise.
    pub fn build(output_root: &Path, manifest: Option<&Path>) -> Result<Self, RegistryError> {
        let manifest = manifest
            .map(Path::to_path_buf)
            .unwrap_or_else(|| output_root.join(DEFAULT_MANIFEST));

        if manifest.is_file() {
            debug!(manifest = %manifest.display(), "asset registry from manifest");
            Self::from_manifest(&manifest)
        } else {
            debug!(assets = %output_root.join(ASSETS_DIR).display(), "asset registry from listing");
            Self::from_listing(&output_root.join(ASSETS_DIR))
        }
    }

    pub fn from_listing(assets_dir: &Path) -> Result<Self, RegistryError> {
        let list = |source| RegistryError::List {
            path: assets_dir.to_path_buf(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(assets_dir).map_err(list)? {
            let entry = entry.map_err(list)?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();

        Ok(Self {
            index: Index::Listing(names),
        })
    }

    pub fn from_manifest(path: &Path) -> Result<Self, RegistryError> {
        let json = fs::read_to_string(path).map_err(|source| RegistryError::ReadManifest {
            path: path.to_path_buf(),
            source,
        })?;
        let chunks: BTreeMap<String, ManifestChunk> =
            serde_json::from_str(&json).map_err(|source| RegistryError::ParseManifest {
                path: path.to_path_buf(),
                source,
            })?;

        let prefix = format!("{ASSETS_DIR}/");
        let mut by_stem = BTreeMap::<String, Vec<String>>::new();
        for (source, chunk) in chunks {
            if !chunk.is_entry {
                continue;
            }
            let Some(file) = chunk.file.strip_prefix(&prefix) else {
                continue;
            };
            let Some(stem) = Path::new(&source).file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            by_stem
                .entry(stem.to_string())
                .or_default()
                .push(file.to_string());
        }

        Ok(Self {
            index: Index::Manifest(by_stem),
        })
    }

    /// File name (inside `assets/`) of the artifact built from `stem`.
    pub fn resolve(&self, stem: &str) -> Result<&str, RegistryError> {
        let candidates: Vec<&str> = match &self.index {
            Index::Manifest(by_stem) => by_stem
                .get(stem)
                .map(|files| files.iter().map(String::as_str).collect())
                .unwrap_or_default(),
            Index::Listing(names) => names
                .iter()
                .map(String::as_str)
                .filter(|name| is_artifact_of(name, stem))
                .collect(),
        };

        match candidates.as_slice() {
            [] => Err(RegistryError::NotFound {
                stem: stem.to_string(),
            }),
            [only] => Ok(*only),
            _ => Err(RegistryError::Ambiguous {
                stem: stem.to_string(),
                candidates: candidates.iter().map(|c| c.to_string()).collect(),
            }),
        }
    }
}

/// Extensions a bundled script can end up with.
const SCRIPT_EXTENSIONS: [&str; 3] = [".js", ".mjs", ".cjs"];

/// `behavior.ABCD1234.js` and `behavior-ABCD1234.js` are artifacts of
/// `behavior`; `behaviors.js`, `behavior-ABCD1234.css` and source maps are not.
fn is_artifact_of(name: &str, stem: &str) -> bool {
    if !SCRIPT_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        return false;
    }
    match name.strip_prefix(stem) {
        Some(rest) => rest.starts_with('.') || rest.starts_with('-'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn assets(files: &[&str]) -> TempDir {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join(ASSETS_DIR);
        fs::create_dir(&dir).unwrap();
        for file in files {
            fs::write(dir.join(file), "").unwrap();
        }
        temp
    }

    #[test]
    fn listing_resolves_hashed_names() {
        let temp = assets(&["behavior.ABCD1234.js", "index-9f8e.js", "index-9f8e.css"]);
        let registry = AssetRegistry::build(temp.path(), None).unwrap();

        assert_eq!(registry.resolve("behavior").unwrap(), "behavior.ABCD1234.js");
        assert_eq!(registry.resolve("index").unwrap(), "index-9f8e.js");
    }

    #[test]
    fn listing_requires_a_separator_after_the_stem() {
        let temp = assets(&["behaviors-1111.js", "behavior-2222.js", "behavior-2222.js.map"]);
        let registry = AssetRegistry::build(temp.path(), None).unwrap();

        assert_eq!(registry.resolve("behavior").unwrap(), "behavior-2222.js");
        assert_eq!(registry.resolve("behaviors").unwrap(), "behaviors-1111.js");
    }

    #[test]
    fn listing_reports_missing_and_ambiguous() {
        let temp = assets(&["main-aaaa.js", "main-bbbb.js"]);
        let registry = AssetRegistry::build(temp.path(), None).unwrap();

        assert!(matches!(
            registry.resolve("missing"),
            Err(RegistryError::NotFound { stem }) if stem == "missing"
        ));
        match registry.resolve("main") {
            Err(RegistryError::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates, vec!["main-aaaa.js", "main-bbbb.js"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn manifest_takes_precedence_over_listing() {
        let temp = assets(&["behavior-aaaa.js", "behavior-bbbb.js"]);
        let manifest_dir = temp.path().join(".vite");
        fs::create_dir(&manifest_dir).unwrap();
        fs::write(
            manifest_dir.join("manifest.json"),
            r#"{
                "index.html": { "file": "assets/index-1234.js", "src": "index.html", "isEntry": true },
                "scripts/behavior.ts": { "file": "assets/behavior-bbbb.js", "src": "scripts/behavior.ts", "isEntry": true },
                "_shared.js": { "file": "assets/behavior-aaaa.js" }
            }"#,
        )
        .unwrap();

        let registry = AssetRegistry::build(temp.path(), None).unwrap();
        assert_eq!(registry.resolve("behavior").unwrap(), "behavior-bbbb.js");
        assert_eq!(registry.resolve("index").unwrap(), "index-1234.js");
        assert!(registry.resolve("_shared").is_err());
    }

    #[test]
    fn explicit_manifest_path_is_used() {
        let temp = assets(&[]);
        let manifest = temp.path().join("build-manifest.json");
        fs::write(
            &manifest,
            r#"{ "office.ts": { "file": "assets/office.5f5f.js", "isEntry": true } }"#,
        )
        .unwrap();

        let registry = AssetRegistry::build(temp.path(), Some(&manifest)).unwrap();
        assert_eq!(registry.resolve("office").unwrap(), "office.5f5f.js");
    }

    #[test]
    fn missing_assets_folder_cannot_be_listed() {
        let temp = TempDir::new().expect("tempdir");
        assert!(matches!(
            AssetRegistry::build(temp.path(), None),
            Err(RegistryError::List { .. })
        ));
    }
}
