//! Scene graph assembly
//!
//! Flattens the source hierarchy breadth-first into dense node ids and runs the
//! per-mesh pipeline (weld, tangents, skin remap) for every meshed node.

use std::collections::VecDeque;

use crate::convert::ConvertOptions;
use crate::error::ConvertError;
use crate::mesh::{compute_tangents, MeshObject, VertexWelder};
use crate::skeleton::{Skeleton, SkeletonJoint};
use crate::source::{SourceGeometry, SourceNode, SourceScene};

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// Index into [`Scene::nodes`]
    pub parent: Option<usize>,
    pub mesh: Option<MeshObject>,
}

/// Output of [`SceneGraphBuilder::build`]
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Breadth-first order; a node's id is its position
    pub nodes: Vec<SceneNode>,
    pub skeleton: Skeleton,
    pub joints: Vec<SkeletonJoint>,
}

impl Scene {
    /// Meshes in node order; the n-th one gets mesh id n
    pub fn meshes(&self) -> impl Iterator<Item = &MeshObject> {
        self.nodes.iter().filter_map(|node| node.mesh.as_ref())
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes().count()
    }
}

pub struct SceneGraphBuilder {
    options: ConvertOptions,
}

impl SceneGraphBuilder {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn build(&self, source: &SourceScene) -> Result<Scene, ConvertError> {
        let skeleton = Skeleton::from_hierarchy(source)?;

        let mut nodes: Vec<SceneNode> = Vec::new();
        let mut bindings = Vec::new();
        let mut queue: VecDeque<(&SourceNode, Option<usize>)> =
            source.roots.iter().map(|node| (node, None)).collect();

        while let Some((node, parent)) = queue.pop_front() {
            let id = nodes.len();

            let mesh = match &node.geometry {
                Some(geometry) => {
                    if let Some(skin) = &geometry.skin {
                        bindings.push(skin);
                    }
                    Some(self.build_mesh(&node.name, geometry, &skeleton)?)
                }
                None => None,
            };

            nodes.push(SceneNode {
                name: node.name.clone(),
                parent,
                mesh,
            });
            queue.extend(node.children.iter().map(|child| (child, Some(id))));
        }

        let joints = skeleton.resolve_joints(&bindings);
        tracing::debug!(
            "Scene: {} nodes, {} joints ({} bound)",
            nodes.len(),
            skeleton.len(),
            joints.len()
        );

        Ok(Scene {
            nodes,
            skeleton,
            joints,
        })
    }

    fn build_mesh(
        &self,
        name: &str,
        geometry: &SourceGeometry,
        skeleton: &Skeleton,
    ) -> Result<MeshObject, ConvertError> {
        let mut welder = VertexWelder::new(self.options.winding);
        for group in &geometry.groups {
            welder.weld_group(&group.name, &group.attributes, &group.faces)?;
        }
        let mut pool = welder.finish();

        if !self.options.skip_tangents {
            compute_tangents(&mut pool.vertices, &pool.indices)?;
        }

        for (submesh, group) in pool.submeshes.iter().zip(&geometry.groups) {
            let Some(table) = &group.influences else {
                continue;
            };
            for vertex in submesh.vertex_range() {
                let source = pool.position_sources[vertex] as usize;
                let influences = table
                    .get(source)
                    .ok_or_else(|| ConvertError::reference("influence", source, table.len()))?;
                let (indices, weights) = skeleton.remap_influences(vertex, influences)?;
                pool.vertices[vertex].joint_indices = indices;
                pool.vertices[vertex].weights = weights;
            }
        }

        let mesh = pool.into_mesh(name);
        tracing::debug!(
            "Mesh '{}': {} vertices, {} triangles",
            mesh.name,
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }
}
