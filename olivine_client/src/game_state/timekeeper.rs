use std::time::{Duration, Instant};

use tracy_client::plot;

/// Paces the frame loop to a target rate. Frames that finish early sleep off the rest of
/// their budget; frames that run long are not made up for.
pub struct FrameGovernor {
    target_frame_time: Duration,
    frame_start: Instant,
    last_frame_work: Duration,
    last_frame_total: Duration,
    frames: u64,
}
impl FrameGovernor {
    pub fn new(target_fps: u32) -> FrameGovernor {
        let target_frame_time = Self::budget_for(target_fps);
        FrameGovernor {
            target_frame_time,
            frame_start: Instant::now(),
            last_frame_work: Duration::ZERO,
            // Stands in for the delta of the frame before the first one
            last_frame_total: target_frame_time,
            frames: 0,
        }
    }

    fn budget_for(target_fps: u32) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(target_fps.max(1)))
    }

    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.target_frame_time = Self::budget_for(target_fps);
    }

    pub fn target_frame_time(&self) -> Duration {
        self.target_frame_time
    }

    /// How long a frame that took `work` should still sleep, if at all.
    pub fn remaining_budget(&self, work: Duration) -> Option<Duration> {
        self.target_frame_time
            .checked_sub(work)
            .filter(|remaining| !remaining.is_zero())
    }

    /// Ends the current frame: measures it, sleeps off any remaining budget, and starts
    /// the clock for the next one.
    pub fn finish_frame(&mut self) -> FrameTiming {
        let work = self.frame_start.elapsed();
        if let Some(remaining) = self.remaining_budget(work) {
            std::thread::sleep(remaining);
        }
        let now = Instant::now();
        let total = now - self.frame_start;
        self.frame_start = now;
        self.last_frame_work = work;
        self.last_frame_total = total;
        self.frames += 1;
        plot!("frame_work_ms", work.as_secs_f64() * 1000.0);
        plot!("frame_total_ms", total.as_secs_f64() * 1000.0);
        FrameTiming { work, total }
    }

    pub fn last_frame_work(&self) -> Duration {
        self.last_frame_work
    }

    /// Wall time of the previous frame including sleep. This is the physics delta for the
    /// frame being built.
    pub fn last_frame_total(&self) -> Duration {
        self.last_frame_total
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTiming {
    pub work: Duration,
    pub total: Duration,
}
