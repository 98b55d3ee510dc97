use {
    crate::RetargetError,
    nalgebra as na,
    serde::{Deserialize, Serialize},
    std::collections::HashMap,
};

/// Node of a loaded model hierarchy.
///
/// Only nodes flagged as bones become part of the skeleton graph.
/// Transforms of other nodes are folded into their bone descendants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkeletonNode {
    pub name: String,

    #[serde(default = "yes")]
    pub is_bone: bool,

    #[serde(default = "y_axis")]
    pub up: na::Vector3<f32>,

    #[serde(default = "zero")]
    pub translation: na::Vector3<f32>,

    #[serde(default = "identity")]
    pub rotation: na::UnitQuaternion<f32>,

    #[serde(default)]
    pub children: Vec<SkeletonNode>,
}

fn yes() -> bool {
    true
}

fn y_axis() -> na::Vector3<f32> {
    na::Vector3::y()
}

fn zero() -> na::Vector3<f32> {
    na::Vector3::zeros()
}

fn identity() -> na::UnitQuaternion<f32> {
    na::UnitQuaternion::identity()
}

impl SkeletonNode {
    pub fn bone(name: impl Into<String>) -> Self {
        SkeletonNode {
            name: name.into(),
            is_bone: true,
            up: y_axis(),
            translation: zero(),
            rotation: identity(),
            children: Vec::new(),
        }
    }

    /// Non-bone node, e.g. armature or mesh.
    pub fn group(name: impl Into<String>) -> Self {
        SkeletonNode {
            is_bone: false,
            ..SkeletonNode::bone(name)
        }
    }

    pub fn with_translation(mut self, translation: na::Vector3<f32>) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: na::UnitQuaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_up(mut self, up: na::Vector3<f32>) -> Self {
        self.up = up;
        self
    }

    pub fn with_child(mut self, child: SkeletonNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn local_isometry(&self) -> na::Isometry3<f32> {
        na::Isometry3::from_parts(self.translation.into(), self.rotation)
    }
}

/// Index of a bone in `SkeletonGraph`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoneId(usize);

impl BoneId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct BoneNode {
    pub name: String,

    /// Closest bone ancestor.
    pub parent: Option<BoneId>,

    /// Canonical bone axis in bone space, as authored.
    pub up: na::Vector3<f32>,

    /// Transform of non-bone nodes between parent bone and this bone.
    pub offset: na::Isometry3<f32>,

    pub rest_translation: na::Vector3<f32>,
    pub rest_rotation: na::UnitQuaternion<f32>,

    /// Bone ancestors, nearest first.
    pub ancestors: Vec<BoneId>,

    /// Names of bone ancestors, nearest first, without duplicates.
    pub parent_chain: Vec<String>,

    pub children: Vec<BoneId>,
}

impl BoneNode {
    /// Rest transform relative to parent bone.
    pub fn rest_isometry(&self) -> na::Isometry3<f32> {
        self.offset
            * na::Isometry3::from_parts(
                self.rest_translation.into(),
                self.rest_rotation,
            )
    }
}

/// Bone hierarchy derived from a model.
///
/// Bones are stored in depth-first pre-order,
/// so every parent precedes its children.
#[derive(Clone, Debug, Default)]
pub struct SkeletonGraph {
    bones: Vec<BoneNode>,
    by_name: HashMap<String, BoneId>,
}

impl SkeletonGraph {
    pub fn build(root: &SkeletonNode) -> Self {
        let mut graph = SkeletonGraph::default();
        graph.visit(root, None, na::Isometry3::identity());

        tracing::debug!("Skeleton graph with {} bones built", graph.len());
        graph
    }

    fn visit(
        &mut self,
        node: &SkeletonNode,
        parent: Option<BoneId>,
        offset: na::Isometry3<f32>,
    ) {
        if !node.is_bone {
            let offset = offset * node.local_isometry();
            for child in &node.children {
                self.visit(child, parent, offset);
            }
            return;
        }

        let id = BoneId(self.bones.len());

        let ancestors: Vec<BoneId> = match parent {
            Some(parent) => std::iter::once(parent)
                .chain(self.bones[parent.0].ancestors.iter().copied())
                .collect(),
            None => Vec::new(),
        };

        let mut parent_chain: Vec<String> = Vec::new();
        for ancestor in &ancestors {
            let name = &self.bones[ancestor.0].name;
            if *name != node.name && !parent_chain.contains(name) {
                parent_chain.push(name.clone());
            }
        }

        self.bones.push(BoneNode {
            name: node.name.clone(),
            parent,
            up: node.up,
            offset,
            rest_translation: node.translation,
            rest_rotation: node.rotation,
            ancestors,
            parent_chain,
            children: Vec::new(),
        });

        if let Some(parent) = parent {
            self.bones[parent.0].children.push(id);
        }

        if let Some(previous) = self.by_name.insert(node.name.clone(), id) {
            tracing::warn!(
                "Duplicate bone name '{}', lookup now resolves to {:?} instead of {:?}",
                node.name,
                id,
                previous,
            );
        }

        for child in &node.children {
            self.visit(child, Some(id), na::Isometry3::identity());
        }
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[BoneNode] {
        &self.bones
    }

    pub fn ids(&self) -> impl Iterator<Item = BoneId> {
        (0..self.bones.len()).map(BoneId)
    }

    /// Panics if `id` belongs to another graph.
    pub fn bone(&self, id: BoneId) -> &BoneNode {
        &self.bones[id.0]
    }

    /// Looks up bone by name.
    /// With duplicate names the bone visited last wins.
    pub fn get(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).copied()
    }

    pub fn lookup(&self, name: &str) -> Result<BoneId, RetargetError> {
        self.get(name).ok_or_else(|| RetargetError::BoneNotFound {
            name: name.to_owned(),
        })
    }

    pub fn up_vector(
        &self,
        name: &str,
    ) -> Result<na::Vector3<f32>, RetargetError> {
        Ok(self.bone(self.lookup(name)?).up)
    }

    pub fn parent_chain(&self, name: &str) -> Result<&[String], RetargetError> {
        Ok(&self.bone(self.lookup(name)?).parent_chain)
    }
}

/// Humanoid skeleton in T-pose matching `humanoid_limbs`.
///
/// Every bone's canonical axis is +Y in its own space.
pub fn humanoid() -> SkeletonNode {
    use std::f32::consts::{FRAC_PI_2, PI};

    let z = |angle: f32| {
        na::UnitQuaternion::from_axis_angle(&na::Vector3::z_axis(), angle)
    };
    let y = |y: f32| na::Vector3::new(0.0, y, 0.0);

    let arm = |side: &str, sign: f32| {
        SkeletonNode::bone(format!("{}Shoulder", side))
            .with_translation(na::Vector3::new(sign * 0.05, 0.2, 0.0))
            .with_rotation(z(-sign * FRAC_PI_2))
            .with_child(
                SkeletonNode::bone(format!("{}Arm", side))
                    .with_translation(y(0.12))
                    .with_child(
                        SkeletonNode::bone(format!("{}ForeArm", side))
                            .with_translation(y(0.28))
                            .with_child(
                                SkeletonNode::bone(format!("{}Hand", side))
                                    .with_translation(y(0.25)),
                            ),
                    ),
            )
    };

    let leg = |side: &str, sign: f32| {
        SkeletonNode::bone(format!("{}UpLeg", side))
            .with_translation(na::Vector3::new(sign * 0.1, -0.05, 0.0))
            .with_rotation(z(PI))
            .with_child(
                SkeletonNode::bone(format!("{}Leg", side))
                    .with_translation(y(0.45))
                    .with_child(
                        SkeletonNode::bone(format!("{}Foot", side))
                            .with_translation(y(0.42)),
                    ),
            )
    };

    SkeletonNode::group("Armature").with_child(
        SkeletonNode::bone("Hips")
            .with_translation(y(1.0))
            .with_child(
                SkeletonNode::bone("Spine")
                    .with_translation(y(0.1))
                    .with_child(
                        SkeletonNode::bone("Chest")
                            .with_translation(y(0.25))
                            .with_child(
                                SkeletonNode::bone("Neck")
                                    .with_translation(y(0.2))
                                    .with_child(
                                        SkeletonNode::bone("Head")
                                            .with_translation(y(0.1)),
                                    ),
                            )
                            .with_child(arm("Left", 1.0))
                            .with_child(arm("Right", -1.0)),
                    ),
            )
            .with_child(leg("Left", 1.0))
            .with_child(leg("Right", -1.0)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> SkeletonNode {
        SkeletonNode::bone("root").with_child(
            SkeletonNode::bone("A")
                .with_up(na::Vector3::x())
                .with_child(SkeletonNode::bone("B")),
        )
    }

    #[test]
    fn parent_chains_nearest_first() {
        let graph = SkeletonGraph::build(&chain());
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.parent_chain("B").unwrap(), ["A", "root"]);
        assert_eq!(graph.parent_chain("A").unwrap(), ["root"]);
        assert!(graph.parent_chain("root").unwrap().is_empty());

        let b = graph.lookup("B").unwrap();
        let a = graph.lookup("A").unwrap();
        assert_eq!(graph.bone(b).parent, Some(a));
        assert_eq!(graph.bone(a).children, [b]);
    }

    #[test]
    fn up_vectors_as_authored() {
        let graph = SkeletonGraph::build(&chain());
        assert_eq!(graph.up_vector("A").unwrap(), na::Vector3::x());
        assert_eq!(graph.up_vector("B").unwrap(), na::Vector3::y());
    }

    #[test]
    fn unknown_bone_fails() {
        let graph = SkeletonGraph::build(&chain());
        match graph.lookup("C") {
            Err(RetargetError::BoneNotFound { name }) => assert_eq!(name, "C"),
            other => panic!("Unexpected {:?}", other),
        }
        assert!(graph.parent_chain("C").is_err());
    }

    #[test]
    fn non_bone_nodes_are_folded() {
        let rotation =
            na::UnitQuaternion::from_axis_angle(&na::Vector3::x_axis(), 1.0);
        let root = SkeletonNode::group("Armature")
            .with_rotation(rotation)
            .with_child(
                SkeletonNode::bone("Hips").with_child(
                    SkeletonNode::group("Socket")
                        .with_translation(na::Vector3::y())
                        .with_child(SkeletonNode::bone("Spine")),
                ),
            );

        let graph = SkeletonGraph::build(&root);
        assert_eq!(graph.len(), 2);
        assert!(graph.get("Armature").is_none());
        assert!(graph.get("Socket").is_none());

        let hips = graph.bone(graph.lookup("Hips").unwrap());
        assert_eq!(hips.parent, None);
        assert_eq!(hips.offset.rotation, rotation);

        let spine = graph.bone(graph.lookup("Spine").unwrap());
        assert_eq!(spine.parent_chain, ["Hips"]);
        assert_eq!(spine.offset.translation.vector, na::Vector3::y());
    }

    #[test]
    fn duplicate_names_last_wins() {
        let root = SkeletonNode::bone("root")
            .with_child(
                SkeletonNode::bone("twin").with_child(SkeletonNode::bone("x")),
            )
            .with_child(SkeletonNode::bone("twin"));

        let graph = SkeletonGraph::build(&root);
        assert_eq!(graph.len(), 4);

        let twin = graph.lookup("twin").unwrap();
        assert_eq!(twin.index(), 3);
        assert_eq!(graph.parent_chain("x").unwrap(), ["twin", "root"]);
    }

    #[test]
    fn parents_precede_children() {
        let graph = SkeletonGraph::build(&humanoid());
        for id in graph.ids() {
            if let Some(parent) = graph.bone(id).parent {
                assert!(parent < id);
            }
        }
        assert_eq!(
            graph.parent_chain("LeftHand").unwrap(),
            ["LeftForeArm", "LeftArm", "LeftShoulder", "Chest", "Spine", "Hips"]
        );
    }

    #[test]
    fn deserializes_from_ron() {
        let node: SkeletonNode = ron::de::from_str(
            r#"(
                name: "root",
                children: [
                    (name: "child", up: [1.0, 0.0, 0.0]),
                    (name: "prop", is_bone: false),
                ],
            )"#,
        )
        .unwrap();

        let graph = SkeletonGraph::build(&node);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.up_vector("child").unwrap(), na::Vector3::x());
    }
}
