//! JSON-lines manifest reading and writing.
//!
//! A manifest holds one JSON object per line ([`ManifestEntry`]). Reading
//! reports failures with the 1-based line number; writing buffers the whole
//! output and writes it once, so an interrupted run leaves no partial
//! manifest behind.

use std::fs;
use std::path::{Path, PathBuf};

use stitch_core::ManifestEntry;

use crate::error::{Error, Result};

/// Read a JSON-lines manifest, one entry per non-blank line.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let content = fs::read_to_string(path)?;
    let mut entries = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: ManifestEntry = serde_json::from_str(line)
            .map_err(|e| Error::manifest(idx + 1, e.to_string()))?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Write entries as a JSON-lines manifest, input order preserved.
pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    let mut output = String::new();
    for entry in entries {
        let line = serde_json::to_string(entry)
            .map_err(|e| stitch_core::Error::parse(e.to_string()))?;
        output.push_str(&line);
        output.push('\n');
    }
    fs::write(path, output)?;
    Ok(())
}

/// Derive the sibling output path: `dir/name.ext` → `dir/name_modified.ext`.
#[must_use]
pub fn modified_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}_modified");
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    path.with_file_name(name)
}

/// Whether a path already carries the `_modified` marker in its stem.
#[must_use]
pub fn is_modified_path(path: &Path) -> bool {
    path.file_stem()
        .map(|s| s.to_string_lossy().ends_with("_modified"))
        .unwrap_or(false)
}

/// Resolve a manifest URI to a local file: strip the storage root prefix and
/// join the remainder onto the datasets directory.
#[must_use]
pub fn resolve_text_path(uri: &str, gcs_root: &str, datasets_dir: &Path) -> PathBuf {
    let relative = if !gcs_root.is_empty() {
        uri.strip_prefix(gcs_root).unwrap_or(uri)
    } else {
        uri
    };
    datasets_dir.join(relative)
}
