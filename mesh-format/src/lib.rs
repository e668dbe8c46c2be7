//! Shared format definitions for the mesh export pipeline
//!
//! This crate is used by:
//! - `mesh-export` (writes containers and skeleton documents)
//! - runtime loaders and inspection tools (read them back)
//!
//! # Modules
//!
//! - [`formats`] - `.mesh` container layout and `.skeleton` document types
//! - [`reader`] - decoder for `.mesh` containers

pub mod formats;
pub mod reader;

pub use formats::{
    BinarySerializable, IndexFormat, MeshFileHeader, MeshRecordHeader, SceneObjectEntry,
    SkeletonDocument, SkeletonJointEntry, ID_SENTINEL, MESH_EXT, SKELETON_EXT,
};
pub use reader::{FormatError, MeshFile, MeshRecord};
