//! Mesh container binary format (.mesh)
//!
//! Little-endian chunked container holding the geometry of every meshed node
//! plus a flat scene description.
//!
//! # Layout
//! ```text
//! 0x00: signature "MESH" (4 bytes)
//! 0x04: version (major, minor, iteration, unused) (4 bytes)
//! 0x08: scene description offset u32
//! 0x0C: padding u32
//! 0x10: geometry block
//!       0x2F u16, then one mesh record per meshed node
//! var:  scene description block
//!       0x12 u16, object count u16, then one object entry per node
//! ```
//!
//! A mesh record is a 16-byte [`MeshRecordHeader`] followed by tagged sub-chunks
//! (positions, normals?, tangents?, uv0, joint weights?, joint indices?, faces).
//! Every tag is stored as a little-endian u16.

/// File signature at offset 0
pub const MESH_SIGNATURE: &[u8; 4] = b"MESH";

/// Version bytes: major, minor, iteration, unused
pub const MESH_VERSION: [u8; 4] = [0, 1, 0, 0];

/// Tag opening the geometry block (format version of the records)
pub const GEOMETRY_BLOCK_TAG: u16 = 0x2F;

/// Magic opening each mesh record
pub const MESH_RECORD_MAGIC: &[u8; 2] = b"MH";

/// Tag opening the scene description block
pub const SCENE_BLOCK_TAG: u16 = 0x12;

/// Magic opening each scene object entry
pub const SCENE_OBJECT_MAGIC: u16 = 0xF0CD;

/// Sub-chunk tags inside a mesh record
pub const CHUNK_POSITIONS: u16 = 0x01CD;
pub const CHUNK_NORMALS: u16 = 0xA10E;
pub const CHUNK_TANGENTS: u16 = 0xA2DF;
pub const CHUNK_UV0: u16 = 0x02F0;
pub const CHUNK_JOINT_WEIGHTS: u16 = 0xA401;
pub const CHUNK_JOINT_INDICES: u16 = 0xA502;
pub const CHUNK_FACES: u16 = 0x03FF;

/// "No parent" / "no mesh" marker in 16-bit id fields.
///
/// A real id of 0xFFFF would be indistinguishable from the sentinel, so a
/// container holds at most 65535 objects. Writers reject larger scenes.
pub const ID_SENTINEL: u16 = 0xFFFF;

/// Fixed width of an object name, zero padded
pub const OBJECT_NAME_SIZE: usize = 64;

/// Bytes per vertex in the position/normal/tangent/uv sub-chunks (4 × f32)
pub const VEC4_STRIDE: usize = 16;

/// Width of each packed triangle index in the faces sub-chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    /// Pick the narrowest width able to hold every index of a mesh.
    pub fn for_mesh(vertex_count: usize, index_count: usize) -> Self {
        if index_count < 65536 && vertex_count <= 65536 {
            IndexFormat::U16
        } else {
            IndexFormat::U32
        }
    }

    /// Selector value written before the packed indices (byte width)
    pub fn selector(self) -> u16 {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }

    pub fn from_selector(selector: u16) -> Option<Self> {
        match selector {
            2 => Some(IndexFormat::U16),
            4 => Some(IndexFormat::U32),
            _ => None,
        }
    }
}

/// Mesh container file header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshFileHeader {
    pub version: [u8; 4],
    /// Absolute offset of the scene description block
    pub scene_offset: u32,
}

impl MeshFileHeader {
    pub const SIZE: usize = 16;

    pub fn new(scene_offset: u32) -> Self {
        Self {
            version: MESH_VERSION,
            scene_offset,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(MESH_SIGNATURE);
        bytes[4..8].copy_from_slice(&self.version);
        bytes[8..12].copy_from_slice(&self.scene_offset.to_le_bytes());
        // padding bytes stay 0
        bytes
    }

    /// Read header from bytes, rejecting a wrong signature
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE || &bytes[0..4] != MESH_SIGNATURE {
            return None;
        }
        Some(Self {
            version: [bytes[4], bytes[5], bytes[6], bytes[7]],
            scene_offset: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }
}

/// Header of a single mesh record (16 bytes)
///
/// ```text
/// 0x00: "MH"
/// 0x02: mesh id u16
/// 0x04: vertex count u32
/// 0x08: face index count u32
/// 0x0C: padding u32
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRecordHeader {
    pub mesh_id: u16,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl MeshRecordHeader {
    pub const SIZE: usize = 16;

    pub fn new(mesh_id: u16, vertex_count: u32, index_count: u32) -> Self {
        Self {
            mesh_id,
            vertex_count,
            index_count,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(MESH_RECORD_MAGIC);
        bytes[2..4].copy_from_slice(&self.mesh_id.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.index_count.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE || &bytes[0..2] != MESH_RECORD_MAGIC {
            return None;
        }
        Some(Self {
            mesh_id: u16::from_le_bytes([bytes[2], bytes[3]]),
            vertex_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            index_count: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }
}

/// One node of the scene description block (72 bytes)
///
/// Parent and mesh ids use [`ID_SENTINEL`] for "none" on disk; in memory they
/// are `Option`s and only become the sentinel in [`SceneObjectEntry::to_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneObjectEntry {
    pub name: String,
    pub object_id: u16,
    pub parent_id: Option<u16>,
    pub mesh_id: Option<u16>,
}

impl SceneObjectEntry {
    pub const SIZE: usize = 2 + OBJECT_NAME_SIZE + 6;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&SCENE_OBJECT_MAGIC.to_le_bytes());
        let name = encode_object_name(&self.name);
        bytes[2..2 + OBJECT_NAME_SIZE].copy_from_slice(&name);
        let ids = 2 + OBJECT_NAME_SIZE;
        bytes[ids..ids + 2].copy_from_slice(&self.object_id.to_le_bytes());
        bytes[ids + 2..ids + 4]
            .copy_from_slice(&self.parent_id.unwrap_or(ID_SENTINEL).to_le_bytes());
        bytes[ids + 4..ids + 6].copy_from_slice(&self.mesh_id.unwrap_or(ID_SENTINEL).to_le_bytes());
        bytes
    }

    /// Read an entry; `None` if too short, wrong magic, or the name is not UTF-8
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        if u16::from_le_bytes([bytes[0], bytes[1]]) != SCENE_OBJECT_MAGIC {
            return None;
        }
        let name = decode_object_name(&bytes[2..2 + OBJECT_NAME_SIZE])?;
        let ids = 2 + OBJECT_NAME_SIZE;
        let read = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let optional = |id: u16| (id != ID_SENTINEL).then_some(id);
        Some(Self {
            name,
            object_id: read(ids),
            parent_id: optional(read(ids + 2)),
            mesh_id: optional(read(ids + 4)),
        })
    }
}

/// Encode a name into the fixed 64-byte field.
///
/// Longer names are truncated on a character boundary so the stored bytes stay
/// valid UTF-8. A name of exactly 64 bytes has no terminating zero.
pub fn encode_object_name(name: &str) -> [u8; OBJECT_NAME_SIZE] {
    let mut end = name.len().min(OBJECT_NAME_SIZE);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    let mut field = [0u8; OBJECT_NAME_SIZE];
    field[..end].copy_from_slice(&name.as_bytes()[..end]);
    field
}

/// Decode a zero-padded name field
pub fn decode_object_name(field: &[u8]) -> Option<String> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    std::str::from_utf8(&field[..end]).ok().map(str::to_owned)
}
