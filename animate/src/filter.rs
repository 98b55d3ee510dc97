//! Visibility predicates over a full keypoint set.

use crate::keypoint::{JointName, Keypoint, PoseFrame};

/// Joints required for upper body tracking.
pub const UPPER_BODY: [JointName; 8] = [
    JointName::LeftShoulder,
    JointName::RightShoulder,
    JointName::LeftElbow,
    JointName::RightElbow,
    JointName::LeftWrist,
    JointName::RightWrist,
    JointName::LeftHip,
    JointName::RightHip,
];

/// Joints required for lower body tracking.
pub const LOWER_BODY: [JointName; 4] = [
    JointName::LeftKnee,
    JointName::RightKnee,
    JointName::LeftAnkle,
    JointName::RightAnkle,
];

/// Checks that every joint is present and visible.
/// Joints absent from the frame's layout count as invisible.
pub fn all_visible(frame: &PoseFrame, joints: &[JointName]) -> bool {
    joints
        .iter()
        .all(|&joint| frame.get(joint).map_or(false, Keypoint::is_visible))
}

pub fn is_upper_body_visible(frame: &PoseFrame) -> bool {
    all_visible(frame, &UPPER_BODY)
}

pub fn is_lower_body_visible(frame: &PoseFrame) -> bool {
    all_visible(frame, &LOWER_BODY)
}

/// Joints the estimator is confident about, in table order.
pub fn visible_joints(frame: &PoseFrame) -> Vec<JointName> {
    JointName::ALL
        .iter()
        .copied()
        .filter(|&joint| frame.get(joint).map_or(false, Keypoint::is_visible))
        .collect()
}
