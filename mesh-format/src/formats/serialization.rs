//! Binary serialization trait for fixed-size format headers.
//!
//! Each header keeps its type-specific `to_bytes()` returning a fixed-size
//! array; the trait gives generic code a uniform `Vec<u8>` interface.

/// Trait for binary-serializable format headers.
///
/// # Example
///
/// ```
/// use mesh_format::formats::{BinarySerializable, MeshFileHeader};
///
/// let header = MeshFileHeader::new(128);
/// let bytes = header.serialize();
/// let parsed = MeshFileHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed.scene_offset, 128);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized header in bytes.
    const SIZE: usize;

    fn serialize(&self) -> Vec<u8>;

    /// Returns `None` if the byte slice is too short or contains invalid data.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

impl BinarySerializable for super::MeshFileHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for super::MeshRecordHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for super::SceneObjectEntry {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{MeshFileHeader, MeshRecordHeader, SceneObjectEntry};

    fn header_size<T: BinarySerializable>() -> usize {
        T::SIZE
    }

    #[test]
    fn test_generic_usage() {
        assert_eq!(header_size::<MeshFileHeader>(), 16);
        assert_eq!(header_size::<MeshRecordHeader>(), 16);
        assert_eq!(header_size::<SceneObjectEntry>(), 72);
    }

    #[test]
    fn test_deserialize_insufficient_bytes() {
        assert!(MeshFileHeader::deserialize(&[0; 15]).is_none());
        assert!(MeshRecordHeader::deserialize(&[0; 15]).is_none());
        assert!(SceneObjectEntry::deserialize(&[0; 71]).is_none());
    }

    #[test]
    fn test_record_header_trait() {
        let header = MeshRecordHeader::new(7, 100, 300);
        let bytes = header.serialize();
        assert_eq!(bytes.len(), MeshRecordHeader::SIZE);

        let parsed = MeshRecordHeader::deserialize(&bytes).unwrap();
        assert_eq!(parsed.mesh_id, 7);
        assert_eq!(parsed.vertex_count, 100);
        assert_eq!(parsed.index_count, 300);
    }
}
