//! Binary mesh container and skeleton document formats
//!
//! All format headers implement the [`BinarySerializable`] trait for consistent
//! serialization/deserialization.

pub mod mesh;
mod serialization;
pub mod skeleton;

pub use mesh::*;
pub use serialization::BinarySerializable;
pub use skeleton::*;

/// Mesh container extension (without dot)
pub const MESH_EXT: &str = "mesh";

/// Skeleton document extension (without dot)
pub const SKELETON_EXT: &str = "skeleton";
