//! Input discovery for batch conversion

use anyhow::{bail, Context, Result};
use hashbrown::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::source::is_supported;

/// Expand files and directories into the list of inputs to convert.
///
/// Directories are searched recursively for supported extensions. Each file is
/// returned once, however many arguments reach it.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut inputs = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.with_context(|| format!("Failed to walk {:?}", path))?;
                if entry.file_type().is_file() && is_supported(entry.path()) {
                    push_unique(entry.path(), &mut seen, &mut inputs)?;
                }
            }
        } else if path.is_file() {
            if !is_supported(path) {
                bail!(
                    "Unsupported mesh format: {:?} (use .obj, .gltf, or .glb)",
                    path
                );
            }
            push_unique(path, &mut seen, &mut inputs)?;
        } else {
            bail!("Input not found: {:?}", path);
        }
    }

    Ok(inputs)
}

fn push_unique(path: &Path, seen: &mut HashSet<PathBuf>, inputs: &mut Vec<PathBuf>) -> Result<()> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {:?}", path))?;
    if seen.insert(canonical) {
        inputs.push(path.to_path_buf());
    } else {
        tracing::debug!("Skipping duplicate input {:?}", path);
    }
    Ok(())
}
