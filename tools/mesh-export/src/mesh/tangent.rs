//! Per-vertex tangent generation from position and UV deltas

use glam::Vec3;

use super::types::Vertex;
use crate::error::ConvertError;

/// Relative tolerance for the UV determinant.
///
/// The determinant is compared against `DETERMINANT_EPSILON * |d1| * |d2|`, so
/// small but well-formed UV cells keep their tangent. Only triangles whose UV
/// edges are (nearly) parallel or zero contribute nothing.
pub const DETERMINANT_EPSILON: f32 = f32::EPSILON;

/// Accumulate a raw tangent from every triangle into its three vertices, then
/// normalize each vertex tangent.
///
/// Fails with [`ConvertError::DegenerateTangent`] when a vertex ends up with a
/// zero-length (or non-finite) accumulation.
pub fn compute_tangents(vertices: &mut [Vertex], indices: &[u32]) -> Result<(), ConvertError> {
    if indices.len() % 3 != 0 {
        return Err(ConvertError::Topology {
            face: indices.len() / 3,
            corners: indices.len() % 3,
        });
    }

    for vertex in vertices.iter_mut() {
        vertex.tangent = Vec3::ZERO;
    }

    for triangle in indices.chunks_exact(3) {
        let mut ids = [0usize; 3];
        for (slot, &index) in ids.iter_mut().zip(triangle) {
            if index as usize >= vertices.len() {
                return Err(ConvertError::reference("vertex", index as usize, vertices.len()));
            }
            *slot = index as usize;
        }

        let tangent = triangle_tangent(&vertices[ids[0]], &vertices[ids[1]], &vertices[ids[2]]);
        for id in ids {
            vertices[id].tangent += tangent;
        }
    }

    for (i, vertex) in vertices.iter_mut().enumerate() {
        vertex.tangent = vertex
            .tangent
            .try_normalize()
            .ok_or(ConvertError::DegenerateTangent { vertex: i })?;
    }

    Ok(())
}

/// Unnormalized tangent of a single triangle
fn triangle_tangent(v0: &Vertex, v1: &Vertex, v2: &Vertex) -> Vec3 {
    let e1 = v1.position - v0.position;
    let e2 = v2.position - v0.position;
    let d1 = v1.uv - v0.uv;
    let d2 = v2.uv - v0.uv;

    let det = d1.x * d2.y - d1.y * d2.x;
    let inv_det = if det.abs() <= DETERMINANT_EPSILON * d1.length() * d2.length() {
        0.0
    } else {
        1.0 / det
    };

    (e1 * d2.y - e2 * d1.y) * inv_det
}
