//! Transfers estimated human poses onto skeletal rigs.

pub mod deque;
pub mod filter;
pub mod geometry;
pub mod keypoint;
pub mod motion;
pub mod pose;
pub mod retarget;
pub mod skeleton;
pub mod smooth;

pub use self::{
    deque::SequenceBuffer,
    filter::{is_lower_body_visible, is_upper_body_visible},
    geometry::EulerXyz,
    keypoint::{
        JointLayout, JointName, JointRef, Keypoint, PoseFrame,
        VISIBILITY_THRESHOLD,
    },
    motion::{decode_frames, MotionError, MotionPlayer},
    pose::Pose,
    retarget::{
        compute_bone_rotation, humanoid_limbs, AngleClamp, Limb,
        RetargetError, RetargetReport, Retargeter,
    },
    skeleton::{humanoid, BoneId, BoneNode, SkeletonGraph, SkeletonNode},
    smooth::PoseSmoother,
};
