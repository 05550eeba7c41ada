#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Copy of `tests/fixtures/project` inside a temp dir, plus an empty
/// `dist/assets` next to it.
pub struct Project {
    pub temp: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("tempdir");
        copy_dir(
            &Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/project"),
            &temp.path().join("project"),
        );
        fs::create_dir_all(temp.path().join("dist/assets")).expect("dist/assets");
        Self { temp }
    }

    pub fn dir(&self) -> PathBuf {
        self.temp.path().join("project")
    }

    pub fn dist(&self) -> PathBuf {
        self.temp.path().join("dist")
    }

    /// Pretend the bundler emitted `name` into `dist/assets`.
    pub fn bundle(&self, name: &str) {
        fs::write(self.dist().join("assets").join(name), "// bundled").expect("asset");
    }

    pub fn read_json(&self, path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("json")
    }
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).expect("mkdir");
    for entry in fs::read_dir(from).expect("read_dir") {
        let entry = entry.expect("entry");
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).expect("copy");
        }
    }
}
