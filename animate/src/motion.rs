use {
    crate::{
        geometry::distance,
        keypoint::{JointLayout, JointName, Keypoint, PoseFrame},
    },
    byteorder::{ByteOrder as _, LittleEndian},
    std::time::Duration,
};

/// Floats per recorded frame: 22 joints, 3 coordinates each.
pub const FLOATS_PER_FRAME: usize = 66;

pub const BYTES_PER_FRAME: usize = FLOATS_PER_FRAME * 4;

#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    #[error("Motion data has {trailing} trailing bytes after {frames} frames")]
    Truncated { frames: usize, trailing: usize },

    #[error("Motion contains no frames")]
    Empty,

    #[error("Invalid playback rate {fps}")]
    InvalidRate { fps: f32 },
}

/// Decodes recorded motion.
///
/// Data is a sequence of little-endian `f32` triplets,
/// one frame per 22 joints in `JointLayout::Mdm` order.
pub fn decode_frames(bytes: &[u8]) -> Result<Vec<PoseFrame>, MotionError> {
    let trailing = bytes.len() % BYTES_PER_FRAME;
    let frames = bytes.len() / BYTES_PER_FRAME;

    if trailing != 0 {
        return Err(MotionError::Truncated { frames, trailing });
    }

    let mut floats = [0.0f32; FLOATS_PER_FRAME];

    Ok(bytes
        .chunks_exact(BYTES_PER_FRAME)
        .map(|chunk| {
            LittleEndian::read_f32_into(chunk, &mut floats);
            let keypoints = floats
                .chunks_exact(3)
                .map(|xyz| Keypoint::new(xyz[0], xyz[1], xyz[2], 1.0))
                .collect();
            PoseFrame::new(JointLayout::Mdm, keypoints)
        })
        .collect())
}

/// Plays decoded frames back at a fixed rate.
#[derive(Clone, Debug)]
pub struct MotionPlayer {
    frames: Vec<PoseFrame>,
    fps: f32,
    looping: bool,
}

impl MotionPlayer {
    pub fn new(frames: Vec<PoseFrame>, fps: f32) -> Result<Self, MotionError> {
        if frames.is_empty() {
            return Err(MotionError::Empty);
        }

        if !(fps > 0.0 && fps.is_finite()) {
            return Err(MotionError::InvalidRate { fps });
        }

        Ok(MotionPlayer {
            frames,
            fps,
            looping: true,
        })
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.frames.len() as f32 / self.fps)
    }

    pub fn frame_index(&self, elapsed: Duration) -> usize {
        let index = (elapsed.as_secs_f32() * self.fps) as usize;
        if self.looping {
            index % self.frames.len()
        } else {
            index.min(self.frames.len() - 1)
        }
    }

    pub fn frame_at(&self, elapsed: Duration) -> &PoseFrame {
        &self.frames[self.frame_index(elapsed)]
    }

    pub fn frames(&self) -> &[PoseFrame] {
        &self.frames
    }
}

/// Sum of distances between matching joints of two frames.
///
/// Joints missing from either frame are ignored.
pub fn frame_distance(
    a: &PoseFrame,
    b: &PoseFrame,
    joints: &[JointName],
) -> f32 {
    joints
        .iter()
        .filter_map(|&joint| Some((a.get(joint)?, b.get(joint)?)))
        .map(|(a, b)| distance(&a.position(), &b.position()))
        .sum()
}
