use {
    animate::{JointName, Keypoint, MotionPlayer, PoseFrame},
    flume::Sender,
    nalgebra as na,
    rand::{rngs::StdRng, Rng, SeedableRng as _},
    std::{
        f32::consts::PI,
        thread::JoinHandle,
        time::{Duration, Instant},
    },
};

/// Where estimated frames come from.
pub enum Source {
    /// Replays recorded motion.
    Motion(MotionPlayer),

    /// Waving figure with occasional occlusions and dropped frames.
    Synthetic { seed: u64 },
}

/// Runs estimator on its own thread until the receiving side is dropped.
pub fn spawn(
    source: Source,
    rate: f32,
    sender: Sender<PoseFrame>,
) -> std::io::Result<JoinHandle<()>> {
    let period = Duration::from_secs_f32(1.0 / rate);

    std::thread::Builder::new()
        .name("pose-estimator".to_owned())
        .spawn(move || {
            let start = Instant::now();
            let mut synthetic = match &source {
                Source::Synthetic { seed } => {
                    Some(Synthetic::new(StdRng::seed_from_u64(*seed)))
                }
                Source::Motion(_) => None,
            };

            loop {
                let elapsed = start.elapsed();

                let frame = match (&source, &mut synthetic) {
                    (Source::Motion(player), _) => {
                        Some(player.frame_at(elapsed).clone())
                    }
                    (_, Some(synthetic)) => synthetic.frame(elapsed),
                    (_, None) => None,
                };

                if let Some(frame) = frame {
                    if sender.send(frame).is_err() {
                        tracing::debug!("Frame receiver is gone");
                        break;
                    }
                } else if sender.is_disconnected() {
                    break;
                }

                std::thread::sleep(period);
            }
        })
}

struct Synthetic {
    rng: StdRng,
}

impl Synthetic {
    fn new(rng: StdRng) -> Self {
        Synthetic { rng }
    }

    /// Returns `None` for a dropped frame.
    fn frame(&mut self, elapsed: Duration) -> Option<PoseFrame> {
        if self.rng.gen_bool(0.05) {
            tracing::trace!("Estimator dropped a frame");
            return None;
        }

        let t = elapsed.as_secs_f32();
        let wave = PI / 4.0 + (t * 2.0).sin() * PI / 4.0;

        let mut keypoints = vec![Keypoint::new(0.0, 1.6, 0.0, 0.9); 33];
        let mut set = |joint: JointName, position: na::Point3<f32>| {
            keypoints[joint.index()] = Keypoint::from_position(position, 0.9);
        };

        for &(joint, sign) in [
            (JointName::LeftShoulder, 1.0),
            (JointName::RightShoulder, -1.0),
        ]
        .iter()
        {
            set(joint, na::Point3::new(sign * 0.2, 1.45, 0.0));
        }

        let left_elbow = na::Point3::new(
            0.2 + 0.28 * wave.cos(),
            1.45 + 0.28 * wave.sin(),
            0.0,
        );
        set(JointName::LeftElbow, left_elbow);
        set(
            JointName::LeftWrist,
            left_elbow + na::Vector3::new(0.0, 0.25, 0.05),
        );
        set(JointName::RightElbow, na::Point3::new(-0.2, 1.17, 0.0));
        set(JointName::RightWrist, na::Point3::new(-0.2, 0.92, 0.05));

        for &(hip, knee, ankle, sign) in [
            (
                JointName::LeftHip,
                JointName::LeftKnee,
                JointName::LeftAnkle,
                1.0,
            ),
            (
                JointName::RightHip,
                JointName::RightKnee,
                JointName::RightAnkle,
                -1.0,
            ),
        ]
        .iter()
        {
            set(hip, na::Point3::new(sign * 0.1, 0.95, 0.0));
            set(knee, na::Point3::new(sign * 0.1, 0.5, 0.02));
            set(ankle, na::Point3::new(sign * 0.1, 0.08, 0.0));
        }

        for keypoint in &mut keypoints {
            keypoint.x += self.rng.gen_range(-0.005..0.005);
            keypoint.y += self.rng.gen_range(-0.005..0.005);
            keypoint.z += self.rng.gen_range(-0.005..0.005);
        }

        if self.rng.gen_bool(0.1) {
            // Forearm occluded.
            keypoints[JointName::LeftWrist.index()].visibility = 0.2;
        }

        Some(PoseFrame::blaze_pose(keypoints))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, animate::filter::is_upper_body_visible};

    #[test]
    fn synthetic_frames_are_mostly_usable() {
        let mut synthetic = Synthetic::new(StdRng::seed_from_u64(5));

        let frames: Vec<_> = (0..200)
            .filter_map(|i| synthetic.frame(Duration::from_millis(i * 33)))
            .collect();

        assert!(frames.len() > 150);
        assert!(frames.iter().all(|f| f.keypoints.len() == 33));

        let visible =
            frames.iter().filter(|f| is_upper_body_visible(f)).count();
        assert!(visible > 100 && visible < frames.len());
    }
}
