use {
    crate::{
        geometry::{clamp, quaternion_from_unit_vectors, EulerXyz},
        keypoint::{JointName, JointRef, PoseFrame, VISIBILITY_THRESHOLD},
        pose::Pose,
        skeleton::{BoneId, SkeletonGraph},
    },
    nalgebra as na,
    serde::{Deserialize, Serialize},
    smallvec::SmallVec,
};

#[derive(Debug, thiserror::Error)]
pub enum RetargetError {
    #[error("Bone '{name}' not found in skeleton")]
    BoneNotFound { name: String },

    #[error("Pose has {actual} bones while skeleton has {expected}")]
    PoseMismatch { expected: usize, actual: usize },
}

/// Per-axis `[min, max]` ranges in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleClamp {
    pub x: [f32; 2],
    pub y: [f32; 2],
    pub z: [f32; 2],
}

impl AngleClamp {
    pub const FREE: [f32; 2] =
        [-std::f32::consts::PI, std::f32::consts::PI];

    pub fn apply(&self, euler: EulerXyz) -> EulerXyz {
        EulerXyz {
            x: clamp(euler.x, self.x[0], self.x[1]),
            y: clamp(euler.y, self.y[0], self.y[1]),
            z: clamp(euler.z, self.z[0], self.z[1]),
        }
    }
}

/// Computes local rotation of a bone so that its canonical axis points
/// from `start` to `end`.
///
/// Rest rotation is applied first and the observed limb rotation second.
/// Returns `None` when the joints coincide or are not finite.
///
/// Clamping decomposes rotation into Euler angles, so results may jump
/// when an angle wraps around ±π.
pub fn compute_bone_rotation(
    start: &na::Point3<f32>,
    end: &na::Point3<f32>,
    parent_world_rotation: &na::UnitQuaternion<f32>,
    rest: &EulerXyz,
    up: &na::Vector3<f32>,
    angle_clamp: Option<&AngleClamp>,
) -> Option<na::UnitQuaternion<f32>> {
    let direction = end - start;
    if !direction.iter().all(|c| c.is_finite()) {
        return None;
    }

    let target_world = direction.try_normalize(f32::EPSILON)?;
    let up = up.try_normalize(f32::EPSILON)?;

    let target_local = parent_world_rotation.conjugate() * target_world;
    let rest = rest.to_quaternion();

    let mut bio = quaternion_from_unit_vectors(&up, &target_local);

    if let Some(angle_clamp) = angle_clamp {
        let angles = angle_clamp.apply(EulerXyz::from_quaternion(&bio));
        bio = angles.to_quaternion();
    }

    // Rotating by `a` then by `b` is the product `b * a`.
    let rotation = bio * rest;
    Some(na::UnitQuaternion::new_normalize(rotation.into_inner()))
}

/// Binds a skeleton bone to the pair of tracked points it follows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Limb {
    pub bone: String,

    /// Bone whose world rotation defines the limb's local frame.
    pub parent: String,

    pub start: JointRef,
    pub end: JointRef,

    #[serde(default)]
    pub rest: EulerXyz,

    /// Overrides the bone's authored up vector.
    #[serde(default)]
    pub up: Option<na::Vector3<f32>>,

    #[serde(default)]
    pub clamp: Option<AngleClamp>,
}

impl Limb {
    pub fn new(
        bone: impl Into<String>,
        parent: impl Into<String>,
        start: impl Into<JointRef>,
        end: impl Into<JointRef>,
    ) -> Self {
        Limb {
            bone: bone.into(),
            parent: parent.into(),
            start: start.into(),
            end: end.into(),
            rest: EulerXyz::default(),
            up: None,
            clamp: None,
        }
    }

    pub fn with_rest(mut self, rest: EulerXyz) -> Self {
        self.rest = rest;
        self
    }

    pub fn with_up(mut self, up: na::Vector3<f32>) -> Self {
        self.up = Some(up);
        self
    }

    pub fn with_clamp(mut self, clamp: AngleClamp) -> Self {
        self.clamp = Some(clamp);
        self
    }
}

/// Limb table for `skeleton::humanoid` and rigs using the same names.
///
/// Parents precede children.
pub fn humanoid_limbs() -> Vec<Limb> {
    use JointName::*;

    let hips = JointRef::Mid(LeftHip, RightHip);
    let shoulders = JointRef::Mid(LeftShoulder, RightShoulder);

    let head = AngleClamp {
        x: [-0.8, 0.8],
        y: AngleClamp::FREE,
        z: [-0.6, 0.6],
    };

    vec![
        Limb::new("Spine", "Hips", hips, shoulders),
        Limb::new("Neck", "Chest", shoulders, Nose).with_clamp(head),
        Limb::new("LeftArm", "LeftShoulder", LeftShoulder, LeftElbow),
        Limb::new("LeftForeArm", "LeftArm", LeftElbow, LeftWrist),
        Limb::new("RightArm", "RightShoulder", RightShoulder, RightElbow),
        Limb::new("RightForeArm", "RightArm", RightElbow, RightWrist),
        Limb::new("LeftUpLeg", "Hips", LeftHip, LeftKnee),
        Limb::new("LeftLeg", "LeftUpLeg", LeftKnee, LeftAnkle),
        Limb::new("RightUpLeg", "Hips", RightHip, RightKnee),
        Limb::new("RightLeg", "RightUpLeg", RightKnee, RightAnkle),
    ]
}

#[derive(Clone, Debug)]
struct BoundLimb {
    bone: BoneId,
    parent: BoneId,
    start: JointRef,
    end: JointRef,
    rest: EulerXyz,
    up: na::Vector3<f32>,
    clamp: Option<AngleClamp>,
}

/// Outcome of a retargeting pass.
#[derive(Clone, Debug, Default)]
pub struct RetargetReport {
    pub updated: SmallVec<[BoneId; 16]>,

    /// Bones left with their previous rotation.
    pub skipped: SmallVec<[BoneId; 16]>,
}

/// Limb table resolved against a skeleton graph.
#[derive(Clone, Debug)]
pub struct Retargeter {
    limbs: Vec<BoundLimb>,
    threshold: f32,
    bones: usize,
}

impl Retargeter {
    /// Resolves every bone referenced by `limbs`.
    /// Fails on the first unknown bone name.
    pub fn bind(
        graph: &SkeletonGraph,
        limbs: &[Limb],
    ) -> Result<Self, RetargetError> {
        let limbs = limbs
            .iter()
            .map(|limb| {
                let bone = graph.lookup(&limb.bone)?;
                let parent = graph.lookup(&limb.parent)?;
                Ok(BoundLimb {
                    bone,
                    parent,
                    start: limb.start,
                    end: limb.end,
                    rest: limb.rest,
                    up: limb.up.unwrap_or(graph.bone(bone).up),
                    clamp: limb.clamp,
                })
            })
            .collect::<Result<_, RetargetError>>()?;

        Ok(Retargeter {
            limbs,
            threshold: VISIBILITY_THRESHOLD,
            bones: graph.len(),
        })
    }

    /// Joints with visibility below `threshold` are not followed.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Updates local rotations of bound bones from one frame.
    ///
    /// A bone whose joints are missing, below visibility threshold or
    /// coincide keeps its current rotation.
    /// Limbs are processed in table order, so children observe rotations
    /// written for their parents in the same pass.
    pub fn apply(
        &self,
        graph: &SkeletonGraph,
        pose: &mut Pose,
        frame: &PoseFrame,
    ) -> Result<RetargetReport, RetargetError> {
        if pose.len() != self.bones || graph.len() != self.bones {
            return Err(RetargetError::PoseMismatch {
                expected: self.bones,
                actual: pose.len().min(graph.len()),
            });
        }

        let mut report = RetargetReport::default();

        for limb in &self.limbs {
            let joints = frame
                .resolve(limb.start)
                .zip(frame.resolve(limb.end))
                .filter(|(start, end)| {
                    start.visibility >= self.threshold
                        && end.visibility >= self.threshold
                });

            let (start, end) = match joints {
                Some(joints) => joints,
                None => {
                    tracing::trace!(
                        "Skipping bone '{}': joints missing or not visible",
                        graph.bone(limb.bone).name,
                    );
                    report.skipped.push(limb.bone);
                    continue;
                }
            };

            let parent_world = pose.world_rotation(graph, limb.parent);

            match compute_bone_rotation(
                &start.position(),
                &end.position(),
                &parent_world,
                &limb.rest,
                &limb.up,
                limb.clamp.as_ref(),
            ) {
                Some(rotation) => {
                    pose.set_local_rotation(limb.bone, rotation);
                    report.updated.push(limb.bone);
                }
                None => {
                    tracing::debug!(
                        "Skipping bone '{}': degenerate limb direction",
                        graph.bone(limb.bone).name,
                    );
                    report.skipped.push(limb.bone);
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            keypoint::Keypoint,
            skeleton::{humanoid, SkeletonNode},
        },
        std::f32::consts::FRAC_PI_2,
    };

    const EPS: f32 = 1e-5;

    fn point(x: f32, y: f32, z: f32) -> na::Point3<f32> {
        na::Point3::new(x, y, z)
    }

    #[test]
    fn aligned_limb_yields_identity() {
        let rotation = compute_bone_rotation(
            &point(0.0, 0.0, 0.0),
            &point(0.0, 1.0, 0.0),
            &na::UnitQuaternion::identity(),
            &EulerXyz::default(),
            &na::Vector3::y(),
            None,
        )
        .unwrap();

        assert!(rotation.angle() < EPS);
        assert!((rotation.norm() - 1.0).abs() < EPS);
    }

    #[test]
    fn limb_follows_direction() {
        let rotation = compute_bone_rotation(
            &point(1.0, 1.0, 1.0),
            &point(1.0, 1.0, 3.0),
            &na::UnitQuaternion::identity(),
            &EulerXyz::default(),
            &na::Vector3::y(),
            None,
        )
        .unwrap();

        let axis = rotation * na::Vector3::y();
        assert!((axis - na::Vector3::z()).norm() < EPS);
    }

    #[test]
    fn parent_rotation_is_undone() {
        let parent =
            na::UnitQuaternion::from_axis_angle(&na::Vector3::z_axis(), 0.7);
        let start = point(0.0, 0.0, 0.0);
        let end = point(-0.3, 0.2, 0.9);

        let local = compute_bone_rotation(
            &start,
            &end,
            &parent,
            &EulerXyz::default(),
            &na::Vector3::y(),
            None,
        )
        .unwrap();

        let world_axis = parent * local * na::Vector3::y();
        let expected = (end - start).normalize();
        assert!((world_axis - expected).norm() < EPS);
    }

    #[test]
    fn rest_rotation_applies_first() {
        // Twist around the bone's own axis keeps it pointing at the target.
        let rest = EulerXyz::new(0.0, FRAC_PI_2, 0.0);
        let rotation = compute_bone_rotation(
            &point(0.0, 0.0, 0.0),
            &point(1.0, 0.0, 0.0),
            &na::UnitQuaternion::identity(),
            &rest,
            &na::Vector3::y(),
            None,
        )
        .unwrap();

        let bio = quaternion_from_unit_vectors(
            &na::Vector3::y(),
            &na::Vector3::x(),
        );
        let expected = bio * rest.to_quaternion();
        assert!(rotation.angle_to(&expected) < 1e-4);
        assert!((rotation * na::Vector3::y() - na::Vector3::x()).norm() < EPS);

        // Reversed order would not.
        let reversed = rest.to_quaternion() * bio;
        assert!(rotation.angle_to(&reversed) > 0.1);
    }

    #[test]
    fn clamp_pins_axis() {
        let pinned = AngleClamp {
            x: [0.0, 0.0],
            y: AngleClamp::FREE,
            z: AngleClamp::FREE,
        };

        let targets = [
            point(0.0, 0.3, 1.0),
            point(0.5, -0.4, -0.3),
            point(-1.0, 1.0, 0.2),
            point(0.1, -1.0, 0.6),
        ];

        for target in targets.iter() {
            let rotation = compute_bone_rotation(
                &point(0.0, 0.0, 0.0),
                target,
                &na::UnitQuaternion::identity(),
                &EulerXyz::default(),
                &na::Vector3::y(),
                Some(&pinned),
            )
            .unwrap();

            let euler = EulerXyz::from_quaternion(&rotation);
            assert!(euler.x.abs() < 1e-4, "{:?} -> {:?}", target, euler);
        }
    }

    #[test]
    fn coincident_joints_are_rejected() {
        assert!(compute_bone_rotation(
            &point(1.0, 2.0, 3.0),
            &point(1.0, 2.0, 3.0),
            &na::UnitQuaternion::identity(),
            &EulerXyz::default(),
            &na::Vector3::y(),
            None,
        )
        .is_none());
    }

    fn arm_frame(visibility: f32) -> PoseFrame {
        let mut keypoints = vec![Keypoint::new(0.0, 0.0, 0.0, 0.9); 33];
        let mut set = |joint: JointName, x, y, z, v| {
            keypoints[joint.index()] = Keypoint::new(x, y, z, v);
        };
        set(JointName::LeftShoulder, 0.2, 1.4, 0.0, 0.9);
        set(JointName::LeftElbow, 0.2, 1.1, 0.0, visibility);
        set(JointName::LeftWrist, 0.2, 0.8, 0.1, 0.9);
        PoseFrame::blaze_pose(keypoints)
    }

    #[test]
    fn non_finite_joints_are_rejected() {
        assert!(compute_bone_rotation(
            &point(0.0, 0.0, 0.0),
            &point(f32::NAN, 1.0, 0.0),
            &na::UnitQuaternion::identity(),
            &EulerXyz::default(),
            &na::Vector3::y(),
            None,
        )
        .is_none());

        let graph = SkeletonGraph::build(&humanoid());
        let limbs = [
            Limb::new(
                "LeftArm",
                "LeftShoulder",
                JointName::LeftShoulder,
                JointName::LeftElbow,
            ),
            Limb::new(
                "LeftForeArm",
                "LeftArm",
                JointName::LeftElbow,
                JointName::LeftWrist,
            ),
        ];
        let retargeter = Retargeter::bind(&graph, &limbs).unwrap();
        let arm = graph.lookup("LeftArm").unwrap();
        let fore_arm = graph.lookup("LeftForeArm").unwrap();

        let mut frame = arm_frame(0.9);
        frame.keypoints[JointName::LeftElbow.index()].x = f32::NAN;

        let mut pose = Pose::rest(&graph);
        let report = retargeter.apply(&graph, &mut pose, &frame).unwrap();
        assert!(report.skipped.contains(&arm));
        assert!(report.skipped.contains(&fore_arm));
        assert_eq!(pose, Pose::rest(&graph));
    }

    #[test]
    fn bind_fails_on_unknown_bone() {
        let graph = SkeletonGraph::build(&humanoid());
        let limbs = [Limb::new(
            "Tail",
            "Hips",
            JointName::LeftHip,
            JointName::RightHip,
        )];

        match Retargeter::bind(&graph, &limbs) {
            Err(RetargetError::BoneNotFound { name }) => {
                assert_eq!(name, "Tail")
            }
            other => panic!("Unexpected {:?}", other.map(|_| ())),
        }

        assert!(Retargeter::bind(&graph, &humanoid_limbs()).is_ok());
    }

    #[test]
    fn low_visibility_keeps_previous_rotation() {
        let graph = SkeletonGraph::build(&humanoid());
        let limbs = [
            Limb::new(
                "LeftArm",
                "LeftShoulder",
                JointName::LeftShoulder,
                JointName::LeftElbow,
            ),
            Limb::new(
                "LeftForeArm",
                "LeftArm",
                JointName::LeftElbow,
                JointName::LeftWrist,
            ),
        ];
        let retargeter = Retargeter::bind(&graph, &limbs).unwrap();
        let arm = graph.lookup("LeftArm").unwrap();
        let fore_arm = graph.lookup("LeftForeArm").unwrap();

        let mut pose = Pose::rest(&graph);
        let rest = pose.clone();

        let report = retargeter
            .apply(&graph, &mut pose, &arm_frame(0.2))
            .unwrap();
        assert!(report.updated.is_empty());
        assert_eq!(report.skipped.as_slice(), [arm, fore_arm]);
        assert_eq!(pose, rest);

        let report = retargeter
            .apply(&graph, &mut pose, &arm_frame(0.9))
            .unwrap();
        assert_eq!(report.updated.as_slice(), [arm, fore_arm]);

        // Upper arm hangs down in world space.
        let world = pose.world_rotation(&graph, arm) * na::Vector3::y();
        assert!((world - na::Vector3::new(0.0, -1.0, 0.0)).norm() < 1e-4);

        // Forearm follows the wrist.
        let world = pose.world_rotation(&graph, fore_arm) * na::Vector3::y();
        let expected = na::Vector3::new(0.0, -0.3, 0.1).normalize();
        assert!((world - expected).norm() < 1e-4);
    }

    #[test]
    fn threshold_visibility_is_followed() {
        let graph = SkeletonGraph::build(&humanoid());
        let limbs = [Limb::new(
            "LeftArm",
            "LeftShoulder",
            JointName::LeftShoulder,
            JointName::LeftElbow,
        )];
        let retargeter = Retargeter::bind(&graph, &limbs).unwrap();
        let arm = graph.lookup("LeftArm").unwrap();

        let mut pose = Pose::rest(&graph);
        let report = retargeter
            .apply(&graph, &mut pose, &arm_frame(VISIBILITY_THRESHOLD))
            .unwrap();
        assert_eq!(report.updated.as_slice(), [arm]);
        assert!(report.skipped.is_empty());

        let report = retargeter
            .apply(&graph, &mut pose, &arm_frame(0.499))
            .unwrap();
        assert_eq!(report.skipped.as_slice(), [arm]);
    }

    #[test]
    fn mismatched_pose_is_rejected() {
        let graph = SkeletonGraph::build(&humanoid());
        let retargeter = Retargeter::bind(&graph, &humanoid_limbs()).unwrap();
        let mut pose = Pose::identity(2);

        assert!(matches!(
            retargeter.apply(&graph, &mut pose, &arm_frame(0.9)),
            Err(RetargetError::PoseMismatch { .. })
        ));
    }

    #[test]
    fn limb_table_from_ron() {
        let limbs: Vec<Limb> = ron::de::from_str(
            r#"[
                (
                    bone: "b",
                    parent: "a",
                    start: Joint(LEFT_HIP),
                    end: Mid(LEFT_KNEE, RIGHT_KNEE),
                    clamp: Some((x: (0.0, 0.0), y: (-1.0, 1.0), z: (-1.0, 1.0))),
                ),
            ]"#,
        )
        .unwrap();

        assert_eq!(limbs.len(), 1);
        assert_eq!(limbs[0].start, JointRef::Joint(JointName::LeftHip));
        assert_eq!(limbs[0].clamp.unwrap().x, [0.0, 0.0]);

        let root = SkeletonNode::bone("a").with_child(SkeletonNode::bone("b"));
        let graph = SkeletonGraph::build(&root);
        assert!(Retargeter::bind(&graph, &limbs).is_ok());
    }
}
