//! Source scene readers
//!
//! Every supported input format implements [`SceneSource`], producing the same
//! intermediate node hierarchy. The pipeline only ever sees that hierarchy.

mod gltf;
mod obj;

use anyhow::{bail, Result};
use glam::Mat4;
use std::path::Path;
use std::rc::Rc;

use crate::error::ConvertError;
use crate::mesh::{Face, RawAttributes};

pub use self::gltf::GltfSource;
pub use self::obj::{parse_obj, ObjSource};

/// File extensions with a reader (lowercase, without dot)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["obj", "gltf", "glb"];

/// Joint influences of one source position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexInfluences {
    pub joints: Vec<String>,
    pub weights: Vec<f32>,
}

/// Bind data of one joint
#[derive(Debug, Clone, PartialEq)]
pub struct JointInfo {
    pub name: String,
    /// Bind pose in row-vector convention (translation in the bottom row)
    pub bind_transform: Mat4,
    /// Name of the parent node, if any
    pub parent: Option<String>,
}

/// Joints a mesh is bound to (first skin only)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinBinding {
    pub joints: Vec<JointInfo>,
}

impl SkinBinding {
    pub fn find(&self, name: &str) -> Option<&JointInfo> {
        self.joints.iter().find(|j| j.name == name)
    }
}

/// Faces of one material group / primitive and the attributes they index
#[derive(Debug, Clone)]
pub struct SourceGroup {
    pub name: String,
    pub attributes: Rc<RawAttributes>,
    pub faces: Vec<Face>,
    /// Indexed by position index
    pub influences: Option<Vec<VertexInfluences>>,
}

#[derive(Debug, Clone)]
pub struct SourceGeometry {
    pub name: String,
    pub groups: Vec<SourceGroup>,
    pub skin: Option<SkinBinding>,
}

#[derive(Debug, Clone)]
pub struct SourceNode {
    pub name: String,
    /// Tagged as a skeleton joint by the source
    pub is_joint: bool,
    pub geometry: Option<SourceGeometry>,
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_joint: false,
            geometry: None,
            children: Vec::new(),
        }
    }
}

/// Node hierarchy handed to the pipeline. The implicit scene root is not a node.
#[derive(Debug, Clone, Default)]
pub struct SourceScene {
    pub roots: Vec<SourceNode>,
}

/// A reader for one source format
pub trait SceneSource {
    fn read_scene(&self) -> Result<SourceScene, ConvertError>;
}

/// Lowercase extension of a path
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Pick a reader by file extension
pub fn open_source(path: &Path) -> Result<Box<dyn SceneSource>> {
    match extension_of(path).as_str() {
        "obj" => Ok(Box::new(ObjSource::new(path))),
        "gltf" | "glb" => Ok(Box::new(GltfSource::new(path))),
        _ => bail!(
            "Unsupported mesh format: {:?} (use .obj, .gltf, or .glb)",
            path
        ),
    }
}
