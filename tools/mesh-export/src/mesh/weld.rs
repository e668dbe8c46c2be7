//! Vertex welding
//!
//! Collapses face corners with identical (position, uv, normal) references into
//! a single output vertex and emits a triangle index list in corner order.

use glam::{Vec2, Vec3};
use hashbrown::HashMap;

use super::types::{
    Corner, Face, MeshObject, RawAttributes, SubmeshDescriptor, Vertex, Winding,
};
use crate::error::ConvertError;

/// Welds one or more source groups into a shared vertex/index pool.
///
/// Each group gets its own dedup table, so vertices never cross group
/// boundaries and every group occupies a contiguous vertex range.
#[derive(Debug, Default)]
pub struct VertexWelder {
    winding: Winding,
    vertices: Vec<Vertex>,
    position_sources: Vec<u32>,
    indices: Vec<u32>,
    submeshes: Vec<SubmeshDescriptor>,
}

/// Result of welding
#[derive(Debug, Clone, Default)]
pub struct WeldedPool {
    pub vertices: Vec<Vertex>,
    /// Pool-global triangle indices
    pub indices: Vec<u32>,
    /// Position index each vertex was materialized from, relative to its group
    pub position_sources: Vec<u32>,
    pub submeshes: Vec<SubmeshDescriptor>,
}

impl VertexWelder {
    pub fn new(winding: Winding) -> Self {
        Self {
            winding,
            ..Self::default()
        }
    }

    /// Weld every face of a group, appending to the pool
    pub fn weld_group(
        &mut self,
        id: &str,
        attributes: &RawAttributes,
        faces: &[Face],
    ) -> Result<&SubmeshDescriptor, ConvertError> {
        let vertex_offset = self.vertices.len();
        let index_offset = self.indices.len();
        let mut table: HashMap<Corner, u32> = HashMap::new();

        for (face_index, face) in faces.iter().enumerate() {
            match face.len() {
                3 => {
                    for &corner in face.iter() {
                        self.weld_corner(corner, attributes, &mut table)?;
                    }
                }
                4 => {
                    for triangle in self.winding.quad_triangles() {
                        for i in triangle {
                            self.weld_corner(face[i], attributes, &mut table)?;
                        }
                    }
                }
                corners => {
                    return Err(ConvertError::Topology {
                        face: face_index,
                        corners,
                    })
                }
            }
        }

        let descriptor = SubmeshDescriptor {
            id: id.to_string(),
            vertex_offset: to_u32("vertex", vertex_offset)?,
            vertex_count: to_u32("vertex", self.vertices.len() - vertex_offset)?,
            index_offset: to_u32("index", index_offset)?,
            index_count: to_u32("index", self.indices.len() - index_offset)?,
        };
        tracing::debug!(
            "Welded group '{}': {} corners -> {} vertices",
            descriptor.id,
            descriptor.index_count,
            descriptor.vertex_count
        );
        self.submeshes.push(descriptor);
        Ok(&self.submeshes[self.submeshes.len() - 1])
    }

    fn weld_corner(
        &mut self,
        corner: Corner,
        attributes: &RawAttributes,
        table: &mut HashMap<Corner, u32>,
    ) -> Result<(), ConvertError> {
        if let Some(&index) = table.get(&corner) {
            self.indices.push(index);
            return Ok(());
        }

        let vertex = materialize(corner, attributes)?;
        let index = to_u32("vertex", self.vertices.len())?;
        self.vertices.push(vertex);
        self.position_sources.push(corner.position);
        self.indices.push(index);
        table.insert(corner, index);
        Ok(())
    }

    pub fn finish(self) -> WeldedPool {
        WeldedPool {
            vertices: self.vertices,
            indices: self.indices,
            position_sources: self.position_sources,
            submeshes: self.submeshes,
        }
    }
}

impl WeldedPool {
    /// Merge every submesh of the pool into a single mesh
    pub fn into_mesh(self, name: impl Into<String>) -> MeshObject {
        MeshObject {
            name: name.into(),
            vertices: self.vertices,
            indices: self.indices,
        }
    }
}

/// Weld a single group
pub fn weld_faces(
    attributes: &RawAttributes,
    faces: &[Face],
    winding: Winding,
) -> Result<WeldedPool, ConvertError> {
    let mut welder = VertexWelder::new(winding);
    welder.weld_group("", attributes, faces)?;
    Ok(welder.finish())
}

fn materialize(corner: Corner, attributes: &RawAttributes) -> Result<Vertex, ConvertError> {
    let position = fetch(&attributes.positions, corner.position, "position")?;
    let uv = match corner.uv {
        Some(index) => fetch(&attributes.uvs, index, "uv")?,
        None => Vec2::ZERO,
    };
    let normal = match corner.normal {
        Some(index) => fetch(&attributes.normals, index, "normal")?,
        None => Vec3::ZERO,
    };

    Ok(Vertex {
        position,
        uv,
        normal,
        ..Vertex::default()
    })
}

fn fetch<T: Copy>(values: &[T], index: u32, attribute: &'static str) -> Result<T, ConvertError> {
    values
        .get(index as usize)
        .copied()
        .ok_or_else(|| ConvertError::reference(attribute, index as usize, values.len()))
}

fn to_u32(what: &'static str, count: usize) -> Result<u32, ConvertError> {
    u32::try_from(count).map_err(|_| ConvertError::Limit {
        what,
        count,
        max: u32::MAX as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use smallvec::smallvec;

    fn quad_attributes() -> RawAttributes {
        RawAttributes {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            uvs: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            normals: vec![Vec3::Z],
        }
    }

    fn corner(p: u32, t: u32) -> Corner {
        Corner::new(p, Some(t), Some(0))
    }

    #[test]
    fn test_identical_corners_share_vertex() {
        let attributes = quad_attributes();
        let faces: Vec<Face> = vec![
            smallvec![corner(0, 0), corner(1, 1), corner(2, 2)],
            smallvec![corner(0, 0), corner(2, 2), corner(3, 3)],
        ];

        let pool = weld_faces(&attributes, &faces, Winding::Cw).unwrap();

        assert_eq!(pool.vertices.len(), 4);
        assert_eq!(pool.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(pool.vertices[2].position, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(pool.vertices[3].uv, Vec2::new(0.0, 1.0));
        assert_eq!(pool.vertices[0].normal, Vec3::Z);
        assert_eq!(pool.position_sources, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_different_uv_reference_splits_vertex() {
        let attributes = quad_attributes();
        let faces: Vec<Face> = vec![
            smallvec![corner(0, 0), corner(1, 1), corner(2, 2)],
            smallvec![corner(0, 3), corner(2, 2), corner(3, 3)],
        ];

        let pool = weld_faces(&attributes, &faces, Winding::Cw).unwrap();

        assert_eq!(pool.vertices.len(), 5);
        assert_eq!(pool.indices, vec![0, 1, 2, 3, 2, 4]);
        assert_eq!(pool.position_sources[3], 0);
    }

    #[test]
    fn test_quad_split_clockwise() {
        let attributes = quad_attributes();
        let faces: Vec<Face> = vec![smallvec![
            corner(0, 0),
            corner(1, 1),
            corner(2, 2),
            corner(3, 3)
        ]];

        let pool = weld_faces(&attributes, &faces, Winding::Cw).unwrap();

        assert_eq!(pool.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_quad_split_counter_clockwise() {
        let attributes = quad_attributes();
        let faces: Vec<Face> = vec![smallvec![
            corner(0, 0),
            corner(1, 1),
            corner(2, 2),
            corner(3, 3)
        ]];

        let pool = weld_faces(&attributes, &faces, Winding::Ccw).unwrap();

        // First-seen order: corner 2, 1, 0, then 3
        assert_eq!(pool.vertices[0].position, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(pool.indices, vec![0, 1, 2, 3, 0, 2]);
        let positions: Vec<u32> = pool.indices.iter().map(|&i| pool.position_sources[i as usize]).collect();
        assert_eq!(positions, vec![2, 1, 0, 3, 2, 0]);
    }

    #[test]
    fn test_invalid_corner_counts() {
        let attributes = quad_attributes();
        for count in [2usize, 5] {
            let face: Face = (0..count as u32).map(|i| corner(i % 4, i % 4)).collect();
            let err = weld_faces(&attributes, &[face], Winding::Cw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Topology);
            assert!(matches!(err, ConvertError::Topology { face: 0, corners } if corners == count));
        }
    }

    #[test]
    fn test_out_of_range_reference() {
        let attributes = quad_attributes();
        let faces: Vec<Face> = vec![smallvec![corner(0, 0), corner(1, 9), corner(2, 2)]];

        let err = weld_faces(&attributes, &faces, Winding::Cw).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Reference {
                attribute: "uv",
                index: 9,
                len: 4
            }
        ));
    }

    #[test]
    fn test_missing_attributes_default_to_zero() {
        let attributes = quad_attributes();
        let faces: Vec<Face> = vec![smallvec![
            Corner::new(0, None, None),
            Corner::new(1, None, None),
            Corner::new(2, None, None)
        ]];

        let pool = weld_faces(&attributes, &faces, Winding::Cw).unwrap();
        assert!(pool.vertices.iter().all(|v| v.uv == Vec2::ZERO && v.normal == Vec3::ZERO));
    }

    #[test]
    fn test_groups_share_pool_but_not_vertices() {
        let attributes = quad_attributes();
        let triangle: Vec<Face> = vec![smallvec![corner(0, 0), corner(1, 1), corner(2, 2)]];

        let mut welder = VertexWelder::new(Winding::Cw);
        welder.weld_group("first", &attributes, &triangle).unwrap();
        let second = welder.weld_group("second", &attributes, &triangle).unwrap().clone();
        let pool = welder.finish();

        assert_eq!(pool.vertices.len(), 6);
        assert_eq!(pool.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(pool.submeshes.len(), 2);
        assert_eq!(second.id, "second");
        assert_eq!(second.vertex_range(), 3..6);
        assert_eq!(second.index_range(), 3..6);

        let mesh = pool.into_mesh("merged");
        assert_eq!(mesh.triangle_count(), 2);
    }
}
