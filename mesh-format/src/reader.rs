//! Decoder for `.mesh` containers
//!
//! Walks the geometry block record by record, using sub-chunk tags to detect
//! which optional streams are present, then decodes the scene description.

use crate::formats::*;

/// Error while decoding a mesh container
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("not a mesh container (bad signature or short header)")]
    BadHeader,

    #[error("unexpected end of data at offset {offset} (needed {needed} bytes)")]
    Truncated { offset: usize, needed: usize },

    #[error("unexpected tag {found:#06x} at offset {offset} (expected {expected})")]
    UnexpectedTag {
        offset: usize,
        found: u16,
        expected: &'static str,
    },

    #[error("invalid index format selector {0}")]
    IndexFormat(u16),

    #[error("scene offset {offset} lies outside the file ({len} bytes)")]
    SceneOffset { offset: usize, len: usize },

    #[error("invalid scene object entry at offset {0}")]
    ObjectEntry(usize),
}

/// One decoded mesh record
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRecord {
    pub mesh_id: u16,
    /// xyz + w (1.0)
    pub positions: Vec<[f32; 4]>,
    pub normals: Option<Vec<[f32; 4]>>,
    pub tangents: Option<Vec<[f32; 4]>>,
    /// uv + padding (0.0, 1.0)
    pub uvs: Vec<[f32; 4]>,
    pub joint_weights: Option<Vec<Vec<f32>>>,
    pub joint_indices: Option<Vec<Vec<u16>>>,
    pub index_format: IndexFormat,
    pub indices: Vec<u32>,
}

impl MeshRecord {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// A fully decoded mesh container
#[derive(Debug, Clone, PartialEq)]
pub struct MeshFile {
    pub header: MeshFileHeader,
    pub meshes: Vec<MeshRecord>,
    pub objects: Vec<SceneObjectEntry>,
}

impl MeshFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let header = MeshFileHeader::deserialize(bytes).ok_or(FormatError::BadHeader)?;
        let scene_offset = header.scene_offset as usize;
        if scene_offset < MeshFileHeader::SIZE || scene_offset > bytes.len() {
            return Err(FormatError::SceneOffset {
                offset: scene_offset,
                len: bytes.len(),
            });
        }

        let mut cursor = ByteCursor::new(&bytes[..scene_offset], MeshFileHeader::SIZE);
        cursor.expect_tag(GEOMETRY_BLOCK_TAG, "geometry block tag")?;

        let mut meshes = Vec::new();
        while !cursor.is_empty() {
            meshes.push(read_mesh_record(&mut cursor)?);
        }

        let mut cursor = ByteCursor::new(bytes, scene_offset);
        cursor.expect_tag(SCENE_BLOCK_TAG, "scene block tag")?;
        let object_count = cursor.u16()? as usize;
        let capacity = cursor.capacity_for(object_count, SceneObjectEntry::SIZE);
        let mut objects = Vec::with_capacity(capacity);
        for _ in 0..object_count {
            let at = cursor.offset;
            let entry = cursor.header::<SceneObjectEntry>()?;
            objects.push(entry.ok_or(FormatError::ObjectEntry(at))?);
        }

        Ok(Self {
            header,
            meshes,
            objects,
        })
    }

    /// Find the scene object owning a given mesh id
    pub fn object_for_mesh(&self, mesh_id: u16) -> Option<&SceneObjectEntry> {
        self.objects.iter().find(|o| o.mesh_id == Some(mesh_id))
    }
}

fn read_mesh_record(cursor: &mut ByteCursor) -> Result<MeshRecord, FormatError> {
    let at = cursor.offset;
    let header = match cursor.header::<MeshRecordHeader>()? {
        Some(header) => header,
        None => {
            return Err(FormatError::UnexpectedTag {
                offset: at,
                found: u16::from_le_bytes([cursor.bytes[at], cursor.bytes[at + 1]]),
                expected: "mesh record magic",
            })
        }
    };
    let vertex_count = header.vertex_count as usize;

    cursor.expect_tag(CHUNK_POSITIONS, "positions chunk")?;
    let positions = cursor.vec4_stream(vertex_count)?;

    let mut tag = cursor.u16()?;
    let normals = if tag == CHUNK_NORMALS {
        let normals = cursor.vec4_stream(vertex_count)?;
        tag = cursor.u16()?;
        Some(normals)
    } else {
        None
    };
    let tangents = if tag == CHUNK_TANGENTS {
        let tangents = cursor.vec4_stream(vertex_count)?;
        tag = cursor.u16()?;
        Some(tangents)
    } else {
        None
    };

    if tag != CHUNK_UV0 {
        return Err(FormatError::UnexpectedTag {
            offset: cursor.offset - 2,
            found: tag,
            expected: "uv0 chunk",
        });
    }
    let uvs = cursor.vec4_stream(vertex_count)?;

    tag = cursor.u16()?;
    let mut joint_weights = None;
    let mut joint_indices = None;
    if tag == CHUNK_JOINT_WEIGHTS {
        // Each vertex carries at least its 2-byte count
        let mut weights = Vec::with_capacity(cursor.capacity_for(vertex_count, 2));
        for _ in 0..vertex_count {
            let count = cursor.u16()? as usize;
            let vertex_weights = (0..count)
                .map(|_| cursor.f32())
                .collect::<Result<Vec<_>, _>>()?;
            weights.push(vertex_weights);
        }

        cursor.expect_tag(CHUNK_JOINT_INDICES, "joint indices chunk")?;
        let mut indices = Vec::with_capacity(vertex_count);
        for vertex_weights in &weights {
            let vertex_indices = (0..vertex_weights.len())
                .map(|_| cursor.u16())
                .collect::<Result<Vec<_>, _>>()?;
            indices.push(vertex_indices);
        }

        joint_weights = Some(weights);
        joint_indices = Some(indices);
        tag = cursor.u16()?;
    }

    if tag != CHUNK_FACES {
        return Err(FormatError::UnexpectedTag {
            offset: cursor.offset - 2,
            found: tag,
            expected: "faces chunk",
        });
    }
    let selector = cursor.u16()?;
    let index_format =
        IndexFormat::from_selector(selector).ok_or(FormatError::IndexFormat(selector))?;
    let indices = (0..header.index_count)
        .map(|_| match index_format {
            IndexFormat::U16 => cursor.u16().map(u32::from),
            IndexFormat::U32 => cursor.u32(),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MeshRecord {
        mesh_id: header.mesh_id,
        positions,
        normals,
        tangents,
        uvs,
        joint_weights,
        joint_indices,
        index_format,
        indices,
    })
}

/// Little-endian cursor over a byte slice with absolute offsets
struct ByteCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    fn is_empty(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    /// Upper bound on how many `stride`-byte items the rest of the data holds
    fn capacity_for(&self, count: usize, stride: usize) -> usize {
        count.min(self.remaining() / stride)
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], FormatError> {
        let end = self.offset + needed;
        if end > self.bytes.len() {
            return Err(FormatError::Truncated {
                offset: self.offset,
                needed,
            });
        }
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, FormatError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, FormatError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self) -> Result<f32, FormatError> {
        self.u32().map(f32::from_bits)
    }

    fn expect_tag(&mut self, expected_tag: u16, expected: &'static str) -> Result<(), FormatError> {
        let offset = self.offset;
        let found = self.u16()?;
        if found != expected_tag {
            return Err(FormatError::UnexpectedTag {
                offset,
                found,
                expected,
            });
        }
        Ok(())
    }

    fn header<T: BinarySerializable>(&mut self) -> Result<Option<T>, FormatError> {
        let raw = self.take(T::SIZE)?;
        Ok(T::deserialize(raw))
    }

    fn vec4_stream(&mut self, count: usize) -> Result<Vec<[f32; 4]>, FormatError> {
        let needed = count.saturating_mul(VEC4_STRIDE);
        if needed > self.remaining() {
            return Err(FormatError::Truncated {
                offset: self.offset,
                needed,
            });
        }
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push([self.f32()?, self.f32()?, self.f32()?, self.f32()?]);
        }
        Ok(out)
    }
}
