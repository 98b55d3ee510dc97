use {
    crate::skeleton::{BoneId, SkeletonGraph},
    nalgebra as na,
};

/// Local rotation of every bone of a skeleton.
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    rotations: Box<[na::UnitQuaternion<f32>]>,
}

impl Pose {
    pub fn identity(size: usize) -> Pose {
        Pose {
            rotations: (0..size)
                .map(|_| na::UnitQuaternion::identity())
                .collect(),
        }
    }

    /// Pose with every bone in its rest orientation.
    pub fn rest(graph: &SkeletonGraph) -> Pose {
        Pose {
            rotations: graph
                .bones()
                .iter()
                .map(|bone| bone.rest_rotation)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }

    pub fn rotations(&self) -> &[na::UnitQuaternion<f32>] {
        &self.rotations
    }

    pub fn local_rotation(&self, bone: BoneId) -> na::UnitQuaternion<f32> {
        self.rotations[bone.index()]
    }

    pub fn set_local_rotation(
        &mut self,
        bone: BoneId,
        rotation: na::UnitQuaternion<f32>,
    ) {
        self.rotations[bone.index()] = rotation;
    }

    /// Rotation of the bone relative to the skeleton root frame.
    ///
    /// Composes local rotations and folded node offsets root first.
    /// Pose must be built for `graph`.
    pub fn world_rotation(
        &self,
        graph: &SkeletonGraph,
        bone: BoneId,
    ) -> na::UnitQuaternion<f32> {
        let node = graph.bone(bone);
        let mut rotation = node.offset.rotation * self.local_rotation(bone);

        for &ancestor in &node.ancestors {
            let offset = graph.bone(ancestor).offset.rotation;
            rotation = offset * self.local_rotation(ancestor) * rotation;
        }

        rotation
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::skeleton::SkeletonNode,
        std::f32::consts::FRAC_PI_2,
    };

    #[test]
    fn world_rotation_composes_chain() {
        let quarter = |axis: na::Unit<na::Vector3<f32>>| {
            na::UnitQuaternion::from_axis_angle(&axis, FRAC_PI_2)
        };

        let root = SkeletonNode::group("Armature")
            .with_rotation(quarter(na::Vector3::x_axis()))
            .with_child(
                SkeletonNode::bone("a")
                    .with_rotation(quarter(na::Vector3::z_axis()))
                    .with_child(
                        SkeletonNode::bone("b")
                            .with_rotation(quarter(na::Vector3::y_axis())),
                    ),
            );

        let graph = SkeletonGraph::build(&root);
        let pose = Pose::rest(&graph);
        let b = graph.lookup("b").unwrap();

        let expected = quarter(na::Vector3::x_axis())
            * quarter(na::Vector3::z_axis())
            * quarter(na::Vector3::y_axis());
        assert!(pose.world_rotation(&graph, b).angle_to(&expected) < 1e-5);

        let mut pose = pose;
        let a = graph.lookup("a").unwrap();
        pose.set_local_rotation(a, na::UnitQuaternion::identity());
        let expected =
            quarter(na::Vector3::x_axis()) * quarter(na::Vector3::y_axis());
        assert!(pose.world_rotation(&graph, b).angle_to(&expected) < 1e-5);
    }

    #[test]
    fn identity_pose() {
        let pose = Pose::identity(3);
        assert_eq!(pose.len(), 3);
        assert!(pose
            .rotations()
            .iter()
            .all(|r| *r == na::UnitQuaternion::identity()));
    }
}
