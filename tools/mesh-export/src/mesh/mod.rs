//! Mesh processing: welding, tangent generation, shared mesh types

mod tangent;
mod types;
mod weld;

// Re-export public API
pub use tangent::{compute_tangents, DETERMINANT_EPSILON};
pub use types::{
    Corner, Face, JointIndices, JointWeights, MeshObject, RawAttributes, SubmeshDescriptor,
    Vertex, Winding, MAX_INFLUENCES,
};
pub use weld::{weld_faces, VertexWelder, WeldedPool};
