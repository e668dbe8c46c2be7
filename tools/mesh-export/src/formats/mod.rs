//! Writers for `.mesh` containers and `.skeleton` documents
//!
//! Layout constants and headers come from `mesh-format`.

pub use mesh_format::formats::*;

use glam::{Mat4, Vec3};
use std::io::{Seek, SeekFrom, Write};

use crate::convert::ConvertOptions;
use crate::error::{check_u16, ConvertError};
use crate::mesh::MeshObject;
use crate::scene::Scene;
use crate::skeleton::SkeletonJoint;

/// Where things ended up in a written container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshLayout {
    /// Value stored in the header, relative to the start of the container
    pub scene_offset: u32,
    pub mesh_count: u16,
    pub object_count: u16,
    /// Total bytes written, header included
    pub total_size: u64,
}

/// Write a complete mesh container.
///
/// The header is written last: the geometry block goes first at byte 16, then
/// the scene block, then the writer seeks back to patch in the scene offset.
/// The writer is left positioned at the end of the container.
pub fn write_mesh_file<W: Write + Seek>(
    w: &mut W,
    scene: &Scene,
    options: &ConvertOptions,
) -> Result<MeshLayout, ConvertError> {
    let start = w.stream_position()?;
    w.seek(SeekFrom::Start(start + MeshFileHeader::SIZE as u64))?;

    // Joint chunks go on every mesh once the scene has a skeleton, so runtime
    // loaders can rely on them being present together.
    let write_joints = !options.skip_joints && !scene.skeleton.is_empty();

    write_u16(w, GEOMETRY_BLOCK_TAG)?;
    let mut mesh_count = 0u16;
    for mesh in scene.meshes() {
        write_mesh_record(w, mesh_count, mesh, options, write_joints)?;
        mesh_count = mesh_count.checked_add(1).ok_or(ConvertError::Limit {
            what: "mesh",
            count: mesh_count as usize + 1,
            max: u16::MAX as usize,
        })?;
    }

    let scene_position = w.stream_position()? - start;
    let scene_offset = u32::try_from(scene_position).map_err(|_| ConvertError::Limit {
        what: "geometry byte",
        count: scene_position as usize,
        max: u32::MAX as usize,
    })?;

    let object_count = write_scene_block(w, scene)?;

    let end = w.stream_position()?;
    w.seek(SeekFrom::Start(start))?;
    w.write_all(&MeshFileHeader::new(scene_offset).to_bytes())?;
    w.seek(SeekFrom::Start(end))?;

    Ok(MeshLayout {
        scene_offset,
        mesh_count,
        object_count,
        total_size: end - start,
    })
}

fn write_mesh_record<W: Write>(
    w: &mut W,
    mesh_id: u16,
    mesh: &MeshObject,
    options: &ConvertOptions,
    write_joints: bool,
) -> Result<(), ConvertError> {
    let vertex_count = u32::try_from(mesh.vertices.len()).map_err(|_| ConvertError::Limit {
        what: "vertex",
        count: mesh.vertices.len(),
        max: u32::MAX as usize,
    })?;
    let index_count = u32::try_from(mesh.indices.len()).map_err(|_| ConvertError::Limit {
        what: "index",
        count: mesh.indices.len(),
        max: u32::MAX as usize,
    })?;
    w.write_all(&MeshRecordHeader::new(mesh_id, vertex_count, index_count).to_bytes())?;

    write_u16(w, CHUNK_POSITIONS)?;
    for v in &mesh.vertices {
        write_vec4(w, v.position, 1.0)?;
    }

    if !options.skip_normals {
        write_u16(w, CHUNK_NORMALS)?;
        for v in &mesh.vertices {
            write_vec4(w, v.normal, 0.0)?;
        }
    }

    if !options.skip_tangents {
        write_u16(w, CHUNK_TANGENTS)?;
        for v in &mesh.vertices {
            write_vec4(w, v.tangent, 0.0)?;
        }
    }

    write_u16(w, CHUNK_UV0)?;
    for v in &mesh.vertices {
        for value in [v.uv.x, v.uv.y, 0.0, 1.0] {
            w.write_all(&value.to_le_bytes())?;
        }
    }

    if write_joints {
        write_u16(w, CHUNK_JOINT_WEIGHTS)?;
        for v in &mesh.vertices {
            write_u16(w, check_u16("influence", v.weights.len())?)?;
            for weight in &v.weights {
                w.write_all(&weight.to_le_bytes())?;
            }
        }

        // Counts come from the weights chunk
        write_u16(w, CHUNK_JOINT_INDICES)?;
        for v in &mesh.vertices {
            for index in &v.joint_indices {
                write_u16(w, *index)?;
            }
        }
    } else if mesh.vertices.iter().any(|v| v.is_skinned()) {
        tracing::debug!("Mesh '{}': joint data omitted", mesh.name);
    }

    write_u16(w, CHUNK_FACES)?;
    let format = IndexFormat::for_mesh(mesh.vertices.len(), mesh.indices.len());
    write_u16(w, format.selector())?;
    match format {
        IndexFormat::U16 => {
            for &index in &mesh.indices {
                // for_mesh only picks U16 when every vertex index fits
                write_u16(w, index as u16)?;
            }
        }
        IndexFormat::U32 => {
            for index in &mesh.indices {
                w.write_all(&index.to_le_bytes())?;
            }
        }
    }

    Ok(())
}

fn write_scene_block<W: Write>(w: &mut W, scene: &Scene) -> Result<u16, ConvertError> {
    let object_count = check_u16("object", scene.nodes.len())?;
    write_u16(w, SCENE_BLOCK_TAG)?;
    write_u16(w, object_count)?;

    // Ids stay below the sentinel because the count fits in 16 bits
    let mut next_mesh = 0u16;
    for (id, node) in scene.nodes.iter().enumerate() {
        let mesh_id = node.mesh.as_ref().map(|_| {
            let mesh_id = next_mesh;
            next_mesh += 1;
            mesh_id
        });
        let entry = SceneObjectEntry {
            name: node.name.clone(),
            object_id: id as u16,
            parent_id: node.parent.map(|p| p as u16),
            mesh_id,
        };
        if node.name.len() > OBJECT_NAME_SIZE {
            tracing::warn!(
                "Object name '{}' longer than {} bytes, truncated",
                node.name,
                OBJECT_NAME_SIZE
            );
        }
        w.write_all(&entry.to_bytes())?;
    }

    Ok(object_count)
}

/// Write the skeleton document for a set of resolved joints
pub fn write_skeleton_document<W: Write>(
    w: W,
    joints: &[SkeletonJoint],
) -> Result<(), ConvertError> {
    skeleton_document(joints)
        .write_to(w)
        .map_err(|e| ConvertError::Io(e.into()))
}

/// Convert resolved joints to the on-disk document
pub fn skeleton_document(joints: &[SkeletonJoint]) -> SkeletonDocument {
    let entries = joints
        .iter()
        .map(|joint| SkeletonJointEntry {
            id: joint.id as u32,
            parent_id: joint.parent.map_or(NO_PARENT_JOINT, i32::from),
            name: joint.name.clone(),
            bind_transform: matrix_table(transposed_rows(&joint.bind_transform)),
        })
        .collect();
    SkeletonDocument::new(entries)
}

/// Rows of the transposed bind matrix
fn transposed_rows(bind: &Mat4) -> [[f32; 4]; 4] {
    let transposed = bind.transpose();
    std::array::from_fn(|r| transposed.row(r).to_array())
}

fn write_u16<W: Write>(w: &mut W, value: u16) -> std::io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

fn write_vec4<W: Write>(w: &mut W, xyz: Vec3, w_component: f32) -> std::io::Result<()> {
    for value in [xyz.x, xyz.y, xyz.z, w_component] {
        w.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}
