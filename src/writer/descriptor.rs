//! Persist a descriptor, replacing the whole file.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::Descriptor;

/// Compact JSON, no trailing newline, same key order as it was read in.
///
/// Written to a sibling file first and renamed over `path`, so a failed
/// write never leaves a truncated descriptor behind.
pub fn emit(descriptor: &Descriptor, path: &Path) -> io::Result<()> {
    let json = descriptor.to_json()?;
    let staging = staging_path(path);
    fs::write(&staging, json)
        .and_then(|()| fs::rename(&staging, path))
        .inspect_err(|_| {
            let _ = fs::remove_file(&staging);
        })
}

/// `<dir>/.<name>.tmp`
fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn overwrites_existing_file() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("forest.json");
        fs::write(&path, "{\n  \"old\": true,\n  \"padding\": \"xxxxxxxxxxxxxxxx\"\n}").unwrap();

        let descriptor = Descriptor::from_json(r#"{"b":1,"a":[]}"#).unwrap();
        emit(&descriptor, &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"b":1,"a":[]}"#);
        let names: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![OsString::from("forest.json")]);
    }

    #[test]
    fn failed_replace_leaves_target_and_no_staging_file() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("forest.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let descriptor = Descriptor::from_json(r#"{"a":1}"#).unwrap();
        assert!(emit(&descriptor, &path).is_err());

        assert_eq!(fs::read_to_string(path.join("keep")).unwrap(), "x");
        assert!(!staging_path(&path).exists());
    }
}
