use {
    animate::{
        Pose, PoseFrame, PoseSmoother, RetargetError, RetargetReport,
        Retargeter, SkeletonGraph,
    },
    flume::{Receiver, TryRecvError},
};

/// Outcome of a single `FrameDriver::tick`.
#[derive(Debug, Default)]
pub struct Tick {
    /// Frames drained from the estimator since previous tick.
    pub received: usize,

    /// Present when pose was recomputed.
    pub report: Option<RetargetReport>,

    /// Estimator side of the channel is gone.
    pub disconnected: bool,
}

impl Tick {
    pub fn is_fresh(&self) -> bool {
        self.report.is_some()
    }
}

/// Feeds asynchronously estimated frames into the retargeter
/// once per tick.
///
/// Ticks never block on the estimator. When no frame arrived
/// the previous pose is kept as is.
pub struct FrameDriver {
    frames: Receiver<PoseFrame>,
    smoother: PoseSmoother,
    retargeter: Retargeter,
    pose: Pose,
}

impl FrameDriver {
    pub fn new(
        graph: &SkeletonGraph,
        retargeter: Retargeter,
        smoothing_window: usize,
        frames: Receiver<PoseFrame>,
    ) -> Self {
        FrameDriver {
            frames,
            smoother: PoseSmoother::new(smoothing_window)
                .with_threshold(retargeter.threshold()),
            retargeter,
            pose: Pose::rest(graph),
        }
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Most recent frame received from the estimator.
    pub fn latest_frame(&self) -> Option<&PoseFrame> {
        self.smoother.latest()
    }

    pub fn tick(
        &mut self,
        graph: &SkeletonGraph,
    ) -> Result<Tick, RetargetError> {
        let mut tick = Tick::default();

        loop {
            match self.frames.try_recv() {
                Ok(frame) => {
                    self.smoother.push(frame);
                    tick.received += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tick.disconnected = true;
                    break;
                }
            }
        }

        if tick.received == 0 {
            tracing::trace!("No new pose frame, reusing previous pose");
            return Ok(tick);
        }

        if let Some(frame) = self.smoother.smoothed() {
            let report = self.retargeter.apply(graph, &mut self.pose, &frame)?;
            tracing::trace!(
                "Retargeted {} bones, skipped {}",
                report.updated.len(),
                report.skipped.len(),
            );
            tick.report = Some(report);
        }

        Ok(tick)
    }
}
