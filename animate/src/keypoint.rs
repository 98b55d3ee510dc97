use {
    crate::geometry::midpoint,
    nalgebra as na,
    serde::{Deserialize, Serialize},
};

/// Keypoints with visibility above this value are considered confident.
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

/// Estimated 3D position of a body joint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,

    #[serde(default = "full_visibility", alias = "score")]
    pub visibility: f32,
}

fn full_visibility() -> f32 {
    1.0
}

impl Keypoint {
    pub const fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Keypoint { x, y, z, visibility }
    }

    pub fn from_position(position: na::Point3<f32>, visibility: f32) -> Self {
        Keypoint {
            x: position.x,
            y: position.y,
            z: position.z,
            visibility,
        }
    }

    pub fn position(&self) -> na::Point3<f32> {
        na::Point3::new(self.x, self.y, self.z)
    }

    /// Strictly above `VISIBILITY_THRESHOLD`.
    pub fn is_visible(&self) -> bool {
        self.visibility > VISIBILITY_THRESHOLD
    }
}

macro_rules! joints {
    ($($variant:ident = $index:literal => $name:literal,)*) => {
        /// BlazePose landmark table.
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        #[repr(u8)]
        pub enum JointName {
            $($variant = $index,)*
        }

        impl JointName {
            pub const ALL: [JointName; 33] = [$(JointName::$variant,)*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(JointName::$variant => $name,)*
                }
            }
        }
    };
}

joints! {
    Nose = 0 => "NOSE",
    LeftEyeInner = 1 => "LEFT_EYE_INNER",
    LeftEye = 2 => "LEFT_EYE",
    LeftEyeOuter = 3 => "LEFT_EYE_OUTER",
    RightEyeInner = 4 => "RIGHT_EYE_INNER",
    RightEye = 5 => "RIGHT_EYE",
    RightEyeOuter = 6 => "RIGHT_EYE_OUTER",
    LeftEar = 7 => "LEFT_EAR",
    RightEar = 8 => "RIGHT_EAR",
    MouthLeft = 9 => "MOUTH_LEFT",
    MouthRight = 10 => "MOUTH_RIGHT",
    LeftShoulder = 11 => "LEFT_SHOULDER",
    RightShoulder = 12 => "RIGHT_SHOULDER",
    LeftElbow = 13 => "LEFT_ELBOW",
    RightElbow = 14 => "RIGHT_ELBOW",
    LeftWrist = 15 => "LEFT_WRIST",
    RightWrist = 16 => "RIGHT_WRIST",
    LeftPinky = 17 => "LEFT_PINKY",
    RightPinky = 18 => "RIGHT_PINKY",
    LeftIndex = 19 => "LEFT_INDEX",
    RightIndex = 20 => "RIGHT_INDEX",
    LeftThumb = 21 => "LEFT_THUMB",
    RightThumb = 22 => "RIGHT_THUMB",
    LeftHip = 23 => "LEFT_HIP",
    RightHip = 24 => "RIGHT_HIP",
    LeftKnee = 25 => "LEFT_KNEE",
    RightKnee = 26 => "RIGHT_KNEE",
    LeftAnkle = 27 => "LEFT_ANKLE",
    RightAnkle = 28 => "RIGHT_ANKLE",
    LeftHeel = 29 => "LEFT_HEEL",
    RightHeel = 30 => "RIGHT_HEEL",
    LeftFootIndex = 31 => "LEFT_FOOT_INDEX",
    RightFootIndex = 32 => "RIGHT_FOOT_INDEX",
}

impl JointName {
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        JointName::ALL.get(index).copied()
    }
}

/// Arrangement of keypoints inside a frame.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum JointLayout {
    /// 33 landmarks in `JointName` order.
    BlazePose,

    /// 22 joints produced by motion diffusion models.
    /// Only joints shared with BlazePose are addressable by name.
    Mdm,
}

impl Default for JointLayout {
    fn default() -> Self {
        JointLayout::BlazePose
    }
}

impl JointLayout {
    /// Number of keypoints in a frame with this layout.
    pub fn len(&self) -> usize {
        match self {
            JointLayout::BlazePose => JointName::ALL.len(),
            JointLayout::Mdm => 22,
        }
    }

    pub fn index_of(&self, joint: JointName) -> Option<usize> {
        match self {
            JointLayout::BlazePose => Some(joint.index()),
            JointLayout::Mdm => {
                use JointName::*;
                let index = match joint {
                    LeftHip => 1,
                    RightHip => 2,
                    LeftKnee => 4,
                    RightKnee => 5,
                    LeftAnkle => 7,
                    RightAnkle => 8,
                    LeftFootIndex => 10,
                    RightFootIndex => 11,
                    LeftShoulder => 16,
                    RightShoulder => 17,
                    LeftElbow => 18,
                    RightElbow => 19,
                    LeftWrist => 20,
                    RightWrist => 21,
                    _ => return None,
                };
                Some(index)
            }
        }
    }
}

/// Reference to a tracked point used as a limb end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointRef {
    Joint(JointName),

    /// Midpoint of two joints. Visibility is the lower of the two.
    Mid(JointName, JointName),
}

impl From<JointName> for JointRef {
    fn from(joint: JointName) -> Self {
        JointRef::Joint(joint)
    }
}

/// All keypoints estimated for a single capture frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    #[serde(default)]
    pub layout: JointLayout,
    pub keypoints: Vec<Keypoint>,
}

impl PoseFrame {
    pub fn new(layout: JointLayout, keypoints: Vec<Keypoint>) -> Self {
        PoseFrame { layout, keypoints }
    }

    pub fn blaze_pose(keypoints: Vec<Keypoint>) -> Self {
        PoseFrame::new(JointLayout::BlazePose, keypoints)
    }

    pub fn get(&self, joint: JointName) -> Option<&Keypoint> {
        self.keypoints.get(self.layout.index_of(joint)?)
    }

    pub fn resolve(&self, joint: JointRef) -> Option<Keypoint> {
        match joint {
            JointRef::Joint(joint) => self.get(joint).copied(),
            JointRef::Mid(a, b) => {
                let a = self.get(a)?;
                let b = self.get(b)?;
                let mid = midpoint(&a.position(), &b.position(), false);
                Some(Keypoint::from_position(
                    mid.into(),
                    a.visibility.min(b.visibility),
                ))
            }
        }
    }
}
