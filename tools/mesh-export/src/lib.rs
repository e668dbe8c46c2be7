//! mesh-export library
//!
//! Converts OBJ and glTF scenes to `.mesh` containers and `.skeleton`
//! documents. The pipeline runs source reader -> [`scene::SceneGraphBuilder`]
//! (welding, tangents, skin remap) -> writers in [`formats`].

pub mod convert;
pub mod error;
pub mod formats;
pub mod inputs;
pub mod manifest;
pub mod mesh;
pub mod scene;
pub mod skeleton;
pub mod source;

pub use convert::{
    convert_file, convert_to_memory, default_output, load_scene, skeleton_output, ConvertOptions,
    ConvertSummary, ConvertedScene,
};
pub use error::{ConvertError, ErrorKind};
pub use mesh::{MeshObject, Vertex, Winding};
pub use scene::{Scene, SceneGraphBuilder, SceneNode};
pub use skeleton::{Skeleton, SkeletonJoint};
pub use source::{open_source, SceneSource, SourceScene};
