//! Skeleton document format (.skeleton)
//!
//! Structured (JSON) description of a joint hierarchy:
//!
//! ```text
//! {
//!   "meta": { "resource_type": "skeleton", "version_tag": 1 },
//!   "joints": [
//!     { "id": 0, "parent_id": -1, "name": "Root",
//!       "bind_transform": [ { "_11": .., "_12": .., "_13": .., "_14": .. }, .. ] }
//!   ]
//! }
//! ```
//!
//! `bind_transform` holds four rows; keys are `_<row><col>`, 1-indexed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of `meta.resource_type`
pub const SKELETON_RESOURCE_TYPE: &str = "skeleton";

/// Value of `meta.version_tag`
pub const SKELETON_VERSION_TAG: u32 = 1;

/// `parent_id` of a root joint
pub const NO_PARENT_JOINT: i32 = -1;

/// One matrix row keyed `_<row><col>`
pub type MatrixRow = BTreeMap<String, f32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonMeta {
    pub resource_type: String,
    pub version_tag: u32,
}

impl Default for SkeletonMeta {
    fn default() -> Self {
        Self {
            resource_type: SKELETON_RESOURCE_TYPE.to_string(),
            version_tag: SKELETON_VERSION_TAG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonJointEntry {
    pub id: u32,
    pub parent_id: i32,
    pub name: String,
    pub bind_transform: [MatrixRow; 4],
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SkeletonDocument {
    pub meta: SkeletonMeta,
    pub joints: Vec<SkeletonJointEntry>,
}

impl SkeletonDocument {
    pub fn new(joints: Vec<SkeletonJointEntry>) -> Self {
        Self {
            meta: SkeletonMeta::default(),
            joints,
        }
    }

    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn write_to<W: std::io::Write>(&self, w: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(w, self)
    }
}

/// Build the keyed table from row-major values (`rows[r][c]`)
pub fn matrix_table(rows: [[f32; 4]; 4]) -> [MatrixRow; 4] {
    std::array::from_fn(|r| {
        (0..4)
            .map(|c| (format!("_{}{}", r + 1, c + 1), rows[r][c]))
            .collect()
    })
}

/// Inverse of [`matrix_table`]; `None` if a key is missing
pub fn table_rows(table: &[MatrixRow; 4]) -> Option<[[f32; 4]; 4]> {
    let mut rows = [[0.0f32; 4]; 4];
    for (r, row) in table.iter().enumerate() {
        for (c, value) in rows[r].iter_mut().enumerate() {
            *value = *row.get(&format!("_{}{}", r + 1, c + 1))?;
        }
    }
    Some(rows)
}
