//! Conversion errors
//!
//! Every variant is fatal: a conversion either completes or aborts.

/// Broad failure category, used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Topology,
    Reference,
    SkinCardinality,
    Numeric,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Face with a corner count other than 3 or 4
    #[error("face {face} has {corners} corners (only triangles and quads are supported)")]
    Topology { face: usize, corners: usize },

    /// Source primitive is not a triangle list
    #[error("primitive {primitive} of mesh '{mesh}' uses {mode} topology (triangles required)")]
    UnsupportedPrimitive {
        mesh: String,
        primitive: usize,
        mode: String,
    },

    /// Attribute index out of range during welding or tangent generation
    #[error("{attribute} index {index} out of range ({len} available)")]
    Reference {
        attribute: &'static str,
        index: usize,
        len: usize,
    },

    #[error("mesh '{mesh}' has no {attribute} attribute")]
    MissingAttribute {
        mesh: String,
        attribute: &'static str,
    },

    /// Vertex influenced by a joint the skeleton does not contain
    #[error("vertex {vertex} references unknown joint '{joint}'")]
    UnknownJoint { vertex: usize, joint: String },

    #[error("vertex {vertex} has {count} joint influences (at most 4 allowed)")]
    TooManyInfluences { vertex: usize, count: usize },

    #[error("vertex {vertex} has {joints} joint indices but {weights} weights")]
    InfluenceMismatch {
        vertex: usize,
        joints: usize,
        weights: usize,
    },

    /// Accumulated tangent has zero length and cannot be normalized
    #[error("vertex {vertex} has a zero-length tangent (degenerate UVs?)")]
    DegenerateTangent { vertex: usize },

    /// A count does not fit its fixed-width field
    #[error("{what} count {count} exceeds format limit {max}")]
    Limit {
        what: &'static str,
        count: usize,
        max: usize,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("glTF import failed: {0}")]
    Gltf(#[from] gltf::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::Topology { .. } | ConvertError::UnsupportedPrimitive { .. } => {
                ErrorKind::Topology
            }
            ConvertError::Reference { .. }
            | ConvertError::MissingAttribute { .. }
            | ConvertError::UnknownJoint { .. }
            | ConvertError::Parse { .. }
            | ConvertError::Gltf(_) => ErrorKind::Reference,
            ConvertError::TooManyInfluences { .. } | ConvertError::InfluenceMismatch { .. } => {
                ErrorKind::SkinCardinality
            }
            ConvertError::DegenerateTangent { .. } | ConvertError::Limit { .. } => {
                ErrorKind::Numeric
            }
            ConvertError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn reference(attribute: &'static str, index: usize, len: usize) -> Self {
        ConvertError::Reference {
            attribute,
            index,
            len,
        }
    }
}

/// Check that a count fits in a 16-bit field
pub(crate) fn check_u16(what: &'static str, count: usize) -> Result<u16, ConvertError> {
    u16::try_from(count).map_err(|_| ConvertError::Limit {
        what,
        count,
        max: u16::MAX as usize,
    })
}
