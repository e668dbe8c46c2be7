//! Skeleton extraction
//!
//! Collects joint-tagged nodes breadth-first into an ordered joint list. A
//! joint's position in that list is its stable index, used both for parent
//! links in the skeleton document and for per-vertex joint indices in the
//! mesh container.

use glam::Mat4;
use hashbrown::HashMap;
use std::collections::VecDeque;

use crate::error::{check_u16, ConvertError};
use crate::mesh::{JointIndices, JointWeights, MAX_INFLUENCES};
use crate::source::{SkinBinding, SourceScene, VertexInfluences};

/// A joint ready for serialization
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonJoint {
    pub id: u16,
    /// Index of the parent joint, `None` for roots
    pub parent: Option<u16>,
    pub name: String,
    /// Bind pose in row-vector convention
    pub bind_transform: Mat4,
}

/// Ordered joint names plus the name lookup built from them.
///
/// Immutable once constructed.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    names: Vec<String>,
    lookup: HashMap<String, u16>,
}

impl Skeleton {
    /// Breadth-first walk from the scene roots, keeping joint-tagged nodes.
    ///
    /// Non-joint nodes are traversed but not included, so joints parented under
    /// a plain transform node are still found.
    pub fn from_hierarchy(scene: &SourceScene) -> Result<Self, ConvertError> {
        let mut names = Vec::new();
        let mut queue: VecDeque<_> = scene.roots.iter().collect();

        while let Some(node) = queue.pop_front() {
            if node.is_joint {
                names.push(node.name.clone());
            }
            queue.extend(node.children.iter());
        }

        Self::from_names(names)
    }

    pub fn from_names(names: Vec<String>) -> Result<Self, ConvertError> {
        check_u16("joint", names.len())?;

        let mut lookup = HashMap::with_capacity(names.len());
        let mut unique = Vec::with_capacity(names.len());
        for name in names {
            if lookup.contains_key(&name) {
                tracing::warn!("Duplicate joint name '{}', keeping the first", name);
                continue;
            }
            lookup.insert(name.clone(), unique.len() as u16);
            unique.push(name);
        }

        Ok(Self {
            names: unique,
            lookup,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup.get(name).copied()
    }

    /// Attach bind data to every joint, searching the bindings in order.
    ///
    /// Joints no binding mentions are dropped from the result; the remaining
    /// ids still equal list positions.
    pub fn resolve_joints(&self, bindings: &[&SkinBinding]) -> Vec<SkeletonJoint> {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(id, name)| {
                let Some(info) = bindings.iter().find_map(|binding| binding.find(name)) else {
                    tracing::warn!("Joint '{}' is not bound by any skin, skipping", name);
                    return None;
                };
                Some(SkeletonJoint {
                    id: id as u16,
                    parent: info.parent.as_deref().and_then(|p| self.index_of(p)),
                    name: name.clone(),
                    bind_transform: info.bind_transform,
                })
            })
            .collect()
    }

    /// Replace influence joint names by stable indices
    pub fn remap_influences(
        &self,
        vertex: usize,
        influences: &VertexInfluences,
    ) -> Result<(JointIndices, JointWeights), ConvertError> {
        if influences.joints.len() > MAX_INFLUENCES {
            return Err(ConvertError::TooManyInfluences {
                vertex,
                count: influences.joints.len(),
            });
        }
        if influences.joints.len() != influences.weights.len() {
            return Err(ConvertError::InfluenceMismatch {
                vertex,
                joints: influences.joints.len(),
                weights: influences.weights.len(),
            });
        }

        let indices = influences
            .joints
            .iter()
            .map(|name| {
                self.index_of(name).ok_or_else(|| ConvertError::UnknownJoint {
                    vertex,
                    joint: name.clone(),
                })
            })
            .collect::<Result<JointIndices, _>>()?;

        Ok((indices, influences.weights.iter().copied().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::source::{JointInfo, SourceNode};
    use glam::Vec3;

    fn joint(name: &str) -> SourceNode {
        let mut node = SourceNode::new(name);
        node.is_joint = true;
        node
    }

    fn info(name: &str, parent: Option<&str>) -> JointInfo {
        JointInfo {
            name: name.to_string(),
            bind_transform: Mat4::IDENTITY,
            parent: parent.map(str::to_string),
        }
    }

    fn influences(joints: &[&str], weights: &[f32]) -> VertexInfluences {
        VertexInfluences {
            joints: joints.iter().map(|j| j.to_string()).collect(),
            weights: weights.to_vec(),
        }
    }

    /// Armature (plain) -> Hips -> [Spine -> Head, LegL]; Body mesh node at root
    fn rig() -> SourceScene {
        let mut spine = joint("Spine");
        spine.children.push(joint("Head"));
        let mut hips = joint("Hips");
        hips.children.push(spine);
        hips.children.push(joint("LegL"));
        let mut armature = SourceNode::new("Armature");
        armature.children.push(hips);

        SourceScene {
            roots: vec![SourceNode::new("Body"), armature],
        }
    }

    #[test]
    fn test_breadth_first_joint_order() {
        let skeleton = Skeleton::from_hierarchy(&rig()).unwrap();

        assert_eq!(skeleton.names(), ["Hips", "Spine", "LegL", "Head"]);
        assert_eq!(skeleton.index_of("LegL"), Some(2));
        assert_eq!(skeleton.index_of("Armature"), None);
    }

    #[test]
    fn test_parent_resolved_by_name() {
        let skeleton = Skeleton::from_hierarchy(&rig()).unwrap();
        let binding = SkinBinding {
            joints: vec![
                info("Hips", Some("Armature")),
                info("Spine", Some("Hips")),
                info("LegL", Some("Hips")),
                info("Head", Some("Spine")),
            ],
        };

        let joints = skeleton.resolve_joints(&[&binding]);

        let parents: Vec<Option<u16>> = joints.iter().map(|j| j.parent).collect();
        // Armature is not a joint, so Hips is a root
        assert_eq!(parents, vec![None, Some(0), Some(0), Some(1)]);
        assert_eq!(joints[3].id, 3);
    }

    #[test]
    fn test_first_binding_wins_and_unbound_joints_are_dropped() {
        let skeleton = Skeleton::from_names(vec!["A".into(), "B".into(), "C".into()]).unwrap();
        let mut moved = info("A", None);
        moved.bind_transform = Mat4::from_translation(Vec3::X);
        let first = SkinBinding {
            joints: vec![info("A", None)],
        };
        let second = SkinBinding {
            joints: vec![moved, info("C", Some("A"))],
        };

        let joints = skeleton.resolve_joints(&[&first, &second]);

        assert_eq!(joints.len(), 2);
        assert_eq!(joints[0].bind_transform, Mat4::IDENTITY);
        assert_eq!(joints[1].name, "C");
        assert_eq!(joints[1].id, 2);
        assert_eq!(joints[1].parent, Some(0));
    }

    #[test]
    fn test_remap_influences() {
        let skeleton = Skeleton::from_hierarchy(&rig()).unwrap();

        let (indices, weights) = skeleton
            .remap_influences(0, &influences(&["Head", "Hips"], &[0.5, 0.5]))
            .unwrap();

        assert_eq!(indices.as_slice(), &[3, 0]);
        assert_eq!(weights.as_slice(), &[0.5, 0.5]);
    }

    #[test]
    fn test_remap_rejects_five_influences() {
        let skeleton = Skeleton::from_hierarchy(&rig()).unwrap();
        let five = influences(
            &["Hips", "Spine", "LegL", "Head", "Hips"],
            &[0.2, 0.2, 0.2, 0.2, 0.2],
        );

        let err = skeleton.remap_influences(7, &five).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SkinCardinality);
        assert!(matches!(err, ConvertError::TooManyInfluences { vertex: 7, count: 5 }));
    }

    #[test]
    fn test_remap_rejects_mismatch_and_unknown_joint() {
        let skeleton = Skeleton::from_hierarchy(&rig()).unwrap();

        let err = skeleton
            .remap_influences(0, &influences(&["Hips", "Spine"], &[1.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SkinCardinality);

        let err = skeleton
            .remap_influences(0, &influences(&["Tail"], &[1.0]))
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnknownJoint { ref joint, .. } if joint == "Tail"));
    }

    #[test]
    fn test_empty_scene_has_empty_skeleton() {
        let skeleton = Skeleton::from_hierarchy(&SourceScene::default()).unwrap();
        assert!(skeleton.is_empty());
        assert!(skeleton.resolve_joints(&[]).is_empty());
    }
}
