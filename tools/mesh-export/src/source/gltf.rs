//! glTF/GLB scene reader

use glam::{Mat4, Vec2, Vec3};
use hashbrown::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{
    JointInfo, SceneSource, SkinBinding, SourceGeometry, SourceGroup, SourceNode, SourceScene,
    VertexInfluences,
};
use crate::error::ConvertError;
use crate::mesh::{Corner, Face, RawAttributes};

pub struct GltfSource {
    path: PathBuf,
}

impl GltfSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SceneSource for GltfSource {
    fn read_scene(&self) -> Result<SourceScene, ConvertError> {
        let (document, buffers, _images) = gltf::import(&self.path)?;
        read_document(&document, &buffers)
    }
}

/// Lookups shared by every node of a document
struct DocumentContext<'a> {
    buffers: &'a [gltf::buffer::Data],
    joint_nodes: HashSet<usize>,
    parent_names: HashMap<usize, String>,
}

fn read_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<SourceScene, ConvertError> {
    let joint_nodes = document
        .skins()
        .flat_map(|skin| skin.joints())
        .map(|node| node.index())
        .collect();

    let mut parent_names = HashMap::new();
    for node in document.nodes() {
        for child in node.children() {
            parent_names.insert(child.index(), node_name(&node));
        }
    }

    let context = DocumentContext {
        buffers,
        joint_nodes,
        parent_names,
    };

    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        tracing::warn!("glTF document has no scenes");
        return Ok(SourceScene::default());
    };

    let roots = scene
        .nodes()
        .map(|node| read_node(&node, &context))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SourceScene { roots })
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

fn read_node(node: &gltf::Node, context: &DocumentContext) -> Result<SourceNode, ConvertError> {
    let mut source = SourceNode::new(node_name(node));
    source.is_joint = context.joint_nodes.contains(&node.index());

    if let Some(mesh) = node.mesh() {
        source.geometry = Some(read_mesh(node, &mesh, context)?);
    }

    source.children = node
        .children()
        .map(|child| read_node(&child, context))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(source)
}

fn read_mesh(
    node: &gltf::Node,
    mesh: &gltf::Mesh,
    context: &DocumentContext,
) -> Result<SourceGeometry, ConvertError> {
    let mesh_name = mesh
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| node_name(node));

    // Skin joint order is what JOINTS_0 indexes into
    let skin = match node.skin() {
        Some(skin) => Some(read_skin(&skin, context)?),
        None => None,
    };
    let skin_joint_names: Vec<String> = skin
        .as_ref()
        .map(|binding| binding.joints.iter().map(|j| j.name.clone()).collect())
        .unwrap_or_default();

    let mut groups = Vec::new();
    for (primitive_index, primitive) in mesh.primitives().enumerate() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            return Err(ConvertError::UnsupportedPrimitive {
                mesh: mesh_name.clone(),
                primitive: primitive_index,
                mode: format!("{:?}", primitive.mode()),
            });
        }

        let reader = primitive.reader(|buffer| Some(&context.buffers[buffer.index()]));

        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| ConvertError::MissingAttribute {
                mesh: mesh_name.clone(),
                attribute: "POSITION",
            })?
            .map(Vec3::from)
            .collect();
        let uvs: Vec<Vec2> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().map(Vec2::from).collect())
            .unwrap_or_default();
        let normals: Vec<Vec3> = reader
            .read_normals()
            .map(|iter| iter.map(Vec3::from).collect())
            .unwrap_or_default();

        let indices: Vec<u32> = reader
            .read_indices()
            .map(|iter| iter.into_u32().collect())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());
        if indices.len() % 3 != 0 {
            return Err(ConvertError::Topology {
                face: indices.len() / 3,
                corners: indices.len() % 3,
            });
        }

        let has_uv = !uvs.is_empty();
        let has_normal = !normals.is_empty();
        let faces: Vec<Face> = indices
            .chunks_exact(3)
            .map(|triangle| {
                triangle
                    .iter()
                    .map(|&i| Corner::shared(i, has_uv, has_normal))
                    .collect()
            })
            .collect();

        let sets = read_influence_sets(&reader, &mesh_name);
        let influences = if sets.is_empty() {
            None
        } else if skin.is_none() {
            tracing::warn!("Mesh '{}' has joint data but no skin, ignoring skinning", mesh_name);
            None
        } else {
            Some(read_influences(positions.len(), &sets, &skin_joint_names)?)
        };

        groups.push(SourceGroup {
            name: format!("{}#{}", mesh_name, primitive_index),
            attributes: Rc::new(RawAttributes {
                positions,
                uvs,
                normals,
            }),
            faces,
            influences,
        });
    }

    Ok(SourceGeometry {
        name: mesh_name,
        groups,
        skin,
    })
}

/// One `JOINTS_n`/`WEIGHTS_n` attribute pair
type InfluenceSet = (Vec<[u16; 4]>, Vec<[f32; 4]>);

/// Read every complete joint/weight set, stopping at the first gap
fn read_influence_sets<'a, 's, F>(
    reader: &gltf::mesh::Reader<'a, 's, F>,
    mesh_name: &str,
) -> Vec<InfluenceSet>
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    let mut sets = Vec::new();
    for set in 0.. {
        match (reader.read_joints(set), reader.read_weights(set)) {
            (Some(joints), Some(weights)) => {
                sets.push((joints.into_u16().collect(), weights.into_f32().collect()));
            }
            (None, None) => break,
            _ => {
                tracing::warn!(
                    "Mesh '{}' has partial skinning data in set {} (joints or weights missing), ignoring it",
                    mesh_name,
                    set
                );
                break;
            }
        }
    }
    sets
}

/// Per-position influences across all sets, dropping zero-weight slots
fn read_influences(
    vertex_count: usize,
    sets: &[InfluenceSet],
    joint_names: &[String],
) -> Result<Vec<VertexInfluences>, ConvertError> {
    (0..vertex_count)
        .map(|vertex| {
            let mut influences = VertexInfluences::default();
            for (joints, weights) in sets {
                let (Some(slots), Some(slot_weights)) = (joints.get(vertex), weights.get(vertex))
                else {
                    continue;
                };
                for (&joint, &weight) in slots.iter().zip(slot_weights) {
                    if weight <= 0.0 {
                        continue;
                    }
                    let name = joint_names.get(joint as usize).ok_or_else(|| {
                        ConvertError::reference("joint", joint as usize, joint_names.len())
                    })?;
                    influences.joints.push(name.clone());
                    influences.weights.push(weight);
                }
            }
            Ok(influences)
        })
        .collect()
}

fn read_skin(skin: &gltf::Skin, context: &DocumentContext) -> Result<SkinBinding, ConvertError> {
    let reader = skin.reader(|buffer| Some(&context.buffers[buffer.index()]));
    // Absent inverse bind matrices mean identity
    let inverse_bind: Vec<Mat4> = reader
        .read_inverse_bind_matrices()
        .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
        .unwrap_or_default();

    let joints = skin
        .joints()
        .enumerate()
        .map(|(i, joint)| {
            let inverse = inverse_bind.get(i).copied().unwrap_or(Mat4::IDENTITY);
            JointInfo {
                name: node_name(&joint),
                bind_transform: inverse.inverse().transpose(),
                parent: context.parent_names.get(&joint.index()).cloned(),
            }
        })
        .collect();

    Ok(SkinBinding { joints })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_influences_drop_empty_slots() {
        let names = vec!["Root".to_string(), "Spine".to_string()];
        let sets = vec![(
            vec![[0u16, 1, 0, 0], [1, 0, 0, 0]],
            vec![[0.25f32, 0.75, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]],
        )];

        let influences = read_influences(2, &sets, &names).unwrap();

        assert_eq!(influences[0].joints, vec!["Root", "Spine"]);
        assert_eq!(influences[0].weights, vec![0.25, 0.75]);
        assert_eq!(influences[1].joints, vec!["Spine"]);
    }

    #[test]
    fn test_second_set_extends_influences() {
        let names: Vec<String> = (0..6).map(|i| format!("j{}", i)).collect();
        let sets = vec![
            (vec![[0u16, 1, 2, 3]], vec![[0.2f32, 0.2, 0.2, 0.2]]),
            (vec![[4u16, 5, 0, 0]], vec![[0.1f32, 0.1, 0.0, 0.0]]),
        ];

        let influences = read_influences(1, &sets, &names).unwrap();

        assert_eq!(influences[0].joints, vec!["j0", "j1", "j2", "j3", "j4", "j5"]);
        assert_eq!(influences[0].weights.len(), 6);
    }

    #[test]
    fn test_influence_joint_out_of_range() {
        let names = vec!["Root".to_string()];
        let sets = vec![(vec![[3u16, 0, 0, 0]], vec![[1.0f32, 0.0, 0.0, 0.0]])];
        let err = read_influences(1, &sets, &names).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Reference {
                attribute: "joint",
                index: 3,
                len: 1
            }
        ));
    }
}
