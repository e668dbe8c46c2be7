//! Types and constants for mesh processing

use glam::{Vec2, Vec3};
use serde::Deserialize;
use smallvec::SmallVec;

/// Maximum joint influences per vertex
pub const MAX_INFLUENCES: usize = 4;

/// Joint indices of one vertex (stable skeleton positions)
pub type JointIndices = SmallVec<[u16; MAX_INFLUENCES]>;

/// Joint weights of one vertex, parallel to [`JointIndices`]
pub type JointWeights = SmallVec<[f32; MAX_INFLUENCES]>;

/// Output vertex
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
    /// Accumulated during tangent generation, unit length afterwards
    pub tangent: Vec3,
    pub joint_indices: JointIndices,
    pub weights: JointWeights,
}

impl Vertex {
    pub fn is_skinned(&self) -> bool {
        !self.weights.is_empty()
    }
}

/// Mesh ready for serialization
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshObject {
    pub name: String,
    pub vertices: Vec<Vertex>,
    /// Triangle list (length is a multiple of 3)
    pub indices: Vec<u32>,
}

impl MeshObject {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// One face corner: indices into the raw attribute arrays.
///
/// Missing uv/normal references resolve to zero vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Corner {
    pub position: u32,
    pub uv: Option<u32>,
    pub normal: Option<u32>,
}

impl Corner {
    pub fn new(position: u32, uv: Option<u32>, normal: Option<u32>) -> Self {
        Self {
            position,
            uv,
            normal,
        }
    }

    /// Corner referencing the same index in every stream (per-vertex sources)
    pub fn shared(index: u32, has_uv: bool, has_normal: bool) -> Self {
        Self {
            position: index,
            uv: has_uv.then_some(index),
            normal: has_normal.then_some(index),
        }
    }
}

/// A source polygon
pub type Face = SmallVec<[Corner; 4]>;

/// Raw attribute arrays referenced by corners
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAttributes {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub normals: Vec<Vec3>,
}

/// Range of a shared vertex/index pool owned by one source group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmeshDescriptor {
    pub id: String,
    pub vertex_offset: u32,
    pub vertex_count: u32,
    pub index_offset: u32,
    pub index_count: u32,
}

impl SubmeshDescriptor {
    pub fn vertex_range(&self) -> std::ops::Range<usize> {
        let start = self.vertex_offset as usize;
        start..start + self.vertex_count as usize
    }

    pub fn index_range(&self) -> std::ops::Range<usize> {
        let start = self.index_offset as usize;
        start..start + self.index_count as usize
    }
}

/// Quad split order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winding {
    /// (0,1,2) + (0,2,3)
    #[default]
    Cw,
    /// (2,1,0) + (3,2,0)
    Ccw,
}

impl Winding {
    /// Corner order of the two triangles a quad is split into
    pub fn quad_triangles(self) -> [[usize; 3]; 2] {
        match self {
            Winding::Cw => [[0, 1, 2], [0, 2, 3]],
            Winding::Ccw => [[2, 1, 0], [3, 2, 0]],
        }
    }
}
