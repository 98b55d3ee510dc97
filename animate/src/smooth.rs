use {
    crate::{
        deque::SequenceBuffer,
        keypoint::{Keypoint, PoseFrame, VISIBILITY_THRESHOLD},
    },
    nalgebra as na,
};

/// Moving average over the most recent frames.
///
/// Frames with a different layout or keypoint count than the newest one
/// restart the window.
#[derive(Clone, Debug)]
pub struct PoseSmoother {
    window: SequenceBuffer<PoseFrame>,
    threshold: f32,
}

impl PoseSmoother {
    /// Window of zero is treated as one, i.e. no smoothing.
    pub fn new(window: usize) -> Self {
        PoseSmoother {
            window: SequenceBuffer::with_max_size(window.max(1)),
            threshold: VISIBILITY_THRESHOLD,
        }
    }

    /// Samples with visibility below `threshold` are left out of the mean.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn window(&self) -> usize {
        self.window.max_size()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn push(&mut self, frame: PoseFrame) {
        let compatible = self.window.peek_back().map_or(true, |last| {
            last.layout == frame.layout
                && last.keypoints.len() == frame.keypoints.len()
        });

        if !compatible {
            tracing::debug!("Frame layout changed, smoothing window reset");
            self.window.clear();
        }

        self.window.push_back(frame);
    }

    pub fn latest(&self) -> Option<&PoseFrame> {
        self.window.peek_back()
    }

    /// Per-keypoint mean of confident positions in the window.
    ///
    /// Visibility is taken from the newest frame. A keypoint occluded in the
    /// newest frame is returned as is, so it stays below the threshold.
    pub fn smoothed(&self) -> Option<PoseFrame> {
        let latest = self.window.peek_back()?;

        let keypoints = latest
            .keypoints
            .iter()
            .enumerate()
            .map(|(index, newest)| {
                if newest.visibility < self.threshold {
                    return *newest;
                }

                let mut sum = na::Vector3::<f32>::zeros();
                let mut count = 0;
                for frame in self.window.iter() {
                    let keypoint = &frame.keypoints[index];
                    if keypoint.visibility >= self.threshold {
                        sum += keypoint.position().coords;
                        count += 1;
                    }
                }

                let mean = sum / count as f32;
                Keypoint::new(mean.x, mean.y, mean.z, newest.visibility)
            })
            .collect();

        Some(PoseFrame::new(latest.layout, keypoints))
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}
