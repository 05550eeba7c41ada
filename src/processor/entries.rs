//! Bundler entry points derived from map scripts.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use crate::model::{SCRIPT_PROPERTY, ScannedMap};

/// Bundler inputs, alias → source path.
pub type EntryTable = BTreeMap<String, String>;

/// One entry per map whose `script` property is a string. The alias is the
/// script's file stem; the path is the property value as written.
///
/// When two maps use scripts with the same stem, the later map wins.
pub fn derive_entries(maps: &[ScannedMap]) -> EntryTable {
    let mut entries = EntryTable::new();
    for map in maps {
        if !map.descriptor.has_properties() {
            continue;
        }
        let Some(script) = map.descriptor.string_property(SCRIPT_PROPERTY) else {
            continue;
        };
        let Some(alias) = script_alias(script) else {
            continue;
        };
        insert_entry(&mut entries, alias, script.to_string());
    }
    entries
}

/// `scripts/forest.ts` → `forest`
pub fn script_alias(script: &str) -> Option<String> {
    Path::new(script)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Insert, warning when an earlier entry is replaced.
pub fn insert_entry(entries: &mut EntryTable, alias: String, path: String) {
    if let Some(previous) = entries.insert(alias.clone(), path.clone()) {
        if previous != path {
            warn!(%alias, replaced = %previous, by = %path, "entry alias collision");
        }
    }
}
