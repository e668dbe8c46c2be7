//! Manifest parsing and build orchestration
//!
//! Parses meshes.toml and converts every listed mesh.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::convert::{convert_file, ConvertOptions, ConvertSummary};
use crate::formats::MESH_EXT;
use crate::mesh::Winding;
use crate::source::is_supported;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    /// Options applied to every entry unless overridden
    #[serde(default)]
    pub defaults: ConvertOptions,
    #[serde(default)]
    pub meshes: BTreeMap<String, MeshEntry>,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("assets/")
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MeshEntry {
    Simple(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        skip_normals: Option<bool>,
        #[serde(default)]
        skip_tangents: Option<bool>,
        #[serde(default)]
        skip_joints: Option<bool>,
        #[serde(default)]
        winding: Option<Winding>,
    },
}

impl MeshEntry {
    pub fn path(&self) -> &Path {
        match self {
            MeshEntry::Simple(p) => p,
            MeshEntry::Detailed { path, .. } => path,
        }
    }

    /// Entry options layered over the manifest defaults
    pub fn options(&self, defaults: &ConvertOptions) -> ConvertOptions {
        match self {
            MeshEntry::Simple(_) => *defaults,
            MeshEntry::Detailed {
                skip_normals,
                skip_tangents,
                skip_joints,
                winding,
                ..
            } => ConvertOptions {
                skip_normals: skip_normals.unwrap_or(defaults.skip_normals),
                skip_tangents: skip_tangents.unwrap_or(defaults.skip_tangents),
                skip_joints: skip_joints.unwrap_or(defaults.skip_joints),
                winding: winding.unwrap_or(defaults.winding),
            },
        }
    }
}

/// Load and parse a manifest file.
///
/// Relative mesh paths are resolved against the manifest's directory.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let mut manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;

    if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        for entry in manifest.meshes.values_mut() {
            let resolved = base.join(entry.path());
            match entry {
                MeshEntry::Simple(p) => *p = resolved,
                MeshEntry::Detailed { path, .. } => *path = resolved,
            }
        }
        if manifest.output.dir.is_relative() {
            manifest.output.dir = base.join(&manifest.output.dir);
        }
    }

    Ok(manifest)
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    for (name, entry) in &manifest.meshes {
        if !entry.path().exists() {
            anyhow::bail!("Mesh '{}' source not found: {:?}", name, entry.path());
        }
        if !is_supported(entry.path()) {
            anyhow::bail!("Unsupported mesh format for '{}': {:?}", name, entry.path());
        }
    }
    Ok(())
}

/// Build all meshes from a manifest
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<Vec<ConvertSummary>> {
    let output_dir = output_override.unwrap_or(&manifest.output.dir);
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut summaries = Vec::with_capacity(manifest.meshes.len());
    for (name, entry) in &manifest.meshes {
        let output = output_dir.join(format!("{}.{}", name, MESH_EXT));
        tracing::info!("Converting mesh: {} -> {:?}", name, output);

        let options = entry.options(&manifest.defaults);
        let summary = convert_file(entry.path(), &output, &options)
            .with_context(|| format!("Mesh '{}' failed", name))?;
        summaries.push(summary);
    }

    Ok(summaries)
}
