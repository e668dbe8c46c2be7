//! Mesh converter (OBJ/glTF -> .mesh + .skeleton)

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use crate::formats::{
    skeleton_document, write_mesh_file, write_skeleton_document, MeshLayout, SkeletonDocument,
    MESH_EXT, SKELETON_EXT,
};
use crate::mesh::Winding;
use crate::scene::{Scene, SceneGraphBuilder};
use crate::source::open_source;

/// Per-conversion switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Omit the normals sub-chunk
    pub skip_normals: bool,
    /// Skip tangent generation and omit the tangents sub-chunk
    pub skip_tangents: bool,
    /// Omit joint sub-chunks and the skeleton document
    pub skip_joints: bool,
    pub winding: Winding,
}

/// Result of in-memory conversion
#[derive(Debug, Clone)]
pub struct ConvertedScene {
    /// Complete `.mesh` container
    pub mesh: Vec<u8>,
    pub layout: MeshLayout,
    /// Present when the scene has bound joints and joints are not skipped
    pub skeleton: Option<SkeletonDocument>,
}

/// Paths written by [`convert_file`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub mesh: PathBuf,
    pub skeleton: Option<PathBuf>,
    pub layout: MeshLayout,
}

/// Default `.mesh` path for an input
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension(MESH_EXT)
}

/// Skeleton document path next to a `.mesh` output
pub fn skeleton_output(mesh_output: &Path) -> PathBuf {
    mesh_output.with_extension(SKELETON_EXT)
}

/// Read and process an input without writing anything
pub fn load_scene(input: &Path, options: &ConvertOptions) -> Result<Scene> {
    let source = open_source(input)?
        .read_scene()
        .with_context(|| format!("Failed to read {:?}", input))?;

    let scene = SceneGraphBuilder::new(*options)
        .build(&source)
        .with_context(|| format!("Failed to convert {:?}", input))?;

    if scene.mesh_count() == 0 {
        bail!("No meshes found in {:?}", input);
    }

    dump_scene(&scene);
    Ok(scene)
}

fn writes_skeleton(scene: &Scene, options: &ConvertOptions) -> bool {
    !options.skip_joints && !scene.joints.is_empty()
}

/// Convert an input to in-memory outputs
pub fn convert_to_memory(input: &Path, options: &ConvertOptions) -> Result<ConvertedScene> {
    let scene = load_scene(input, options)?;

    let mut cursor = Cursor::new(Vec::new());
    let layout = write_mesh_file(&mut cursor, &scene, options)?;
    let skeleton = writes_skeleton(&scene, options).then(|| skeleton_document(&scene.joints));

    Ok(ConvertedScene {
        mesh: cursor.into_inner(),
        layout,
        skeleton,
    })
}

/// Convert an input file, writing `output` and, for skinned scenes, a
/// `.skeleton` document beside it.
///
/// The whole pipeline runs before any file is created, so a failed conversion
/// leaves nothing behind.
pub fn convert_file(input: &Path, output: &Path, options: &ConvertOptions) -> Result<ConvertSummary> {
    let scene = load_scene(input, options)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }

    let layout = {
        let file = File::create(output)
            .with_context(|| format!("Failed to create output: {:?}", output))?;
        let mut writer = BufWriter::new(file);
        let layout = write_mesh_file(&mut writer, &scene, options)
            .with_context(|| format!("Failed to write {:?}", output))?;
        writer.flush()?;
        layout
    };

    let skeleton = if writes_skeleton(&scene, options) {
        let path = skeleton_output(output);
        let file =
            File::create(&path).with_context(|| format!("Failed to create output: {:?}", path))?;
        let mut writer = BufWriter::new(file);
        write_skeleton_document(&mut writer, &scene.joints)
            .with_context(|| format!("Failed to write {:?}", path))?;
        writer.flush()?;
        Some(path)
    } else {
        None
    };

    tracing::info!(
        "Converted {:?}: {} objects, {} meshes, {} joints ({} bytes)",
        input,
        layout.object_count,
        layout.mesh_count,
        scene.joints.len(),
        layout.total_size
    );

    Ok(ConvertSummary {
        mesh: output.to_path_buf(),
        skeleton,
        layout,
    })
}

/// Log every welded vertex at debug level
fn dump_scene(scene: &Scene) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    for (id, node) in scene.nodes.iter().enumerate() {
        tracing::debug!("[{}] '{}' parent={:?}", id, node.name, node.parent);
        let Some(mesh) = &node.mesh else { continue };
        for (i, v) in mesh.vertices.iter().enumerate() {
            tracing::debug!(
                "  v{}: pos={} uv={} n={} t={} joints={:?} weights={:?}",
                i,
                v.position,
                v.uv,
                v.normal,
                v.tangent,
                v.joint_indices.as_slice(),
                v.weights.as_slice()
            );
        }
        for triangle in mesh.indices.chunks(3) {
            tracing::debug!("  f: {:?}", triangle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_format::MeshFile;
    use std::fs;

    const QUAD_OBJ: &str = "\
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ConvertOptions = toml::from_str("skip_normals = true\nwinding = \"ccw\"").unwrap();
        assert!(options.skip_normals);
        assert!(!options.skip_tangents);
        assert_eq!(options.winding, Winding::Ccw);

        let options: ConvertOptions = toml::from_str("").unwrap();
        assert_eq!(options, ConvertOptions::default());
    }

    #[test]
    fn test_convert_file_writes_mesh_only_for_static_scene() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("quad.obj");
        fs::write(&input, QUAD_OBJ).unwrap();
        let output = dir.path().join("out").join("quad.mesh");

        let summary = convert_file(&input, &output, &ConvertOptions::default()).unwrap();

        assert_eq!(summary.mesh, output);
        assert!(summary.skeleton.is_none());
        assert!(!skeleton_output(&output).exists());

        let bytes = fs::read(&output).unwrap();
        assert_eq!(bytes.len() as u64, summary.layout.total_size);
        let file = MeshFile::parse(&bytes).unwrap();
        assert_eq!(file.meshes.len(), 1);
        assert_eq!(file.meshes[0].vertex_count(), 4);
        assert_eq!(file.meshes[0].indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(file.objects[0].name, "quad");
    }

    #[test]
    fn test_memory_and_file_outputs_match() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("quad.obj");
        fs::write(&input, QUAD_OBJ).unwrap();
        let output = default_output(&input);

        let converted = convert_to_memory(&input, &ConvertOptions::default()).unwrap();
        convert_file(&input, &output, &ConvertOptions::default()).unwrap();

        assert_eq!(fs::read(&output).unwrap(), converted.mesh);
        assert!(converted.skeleton.is_none());
    }

    #[test]
    fn test_scene_without_meshes_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.obj");
        fs::write(&input, "v 0 0 0\n").unwrap();
        let output = dir.path().join("empty.mesh");

        assert!(convert_file(&input, &output, &ConvertOptions::default()).is_err());
        assert!(!output.exists());
    }
}
