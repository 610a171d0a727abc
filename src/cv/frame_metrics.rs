use log::{debug, info};
use std::time::{Duration, Instant};

/// Rolling frame-rate statistics for the compositor loop.
pub struct FrameMetrics {
    last_frame_time: Instant,
    fps: f32,
    frame_count: usize,
    min_fps: f32,
    max_fps: f32,
    start_time: Instant,
    report_every: usize,
}

impl FrameMetrics {
    pub fn new(report_every: usize) -> Self {
        debug!("Initializing frame metrics tracker");
        let now = Instant::now();
        FrameMetrics {
            last_frame_time: now,
            fps: 0.0,
            frame_count: 0,
            min_fps: f32::MAX,
            max_fps: 0.0,
            start_time: now,
            report_every: report_every.max(1),
        }
    }

    /// Records one presented frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.record(now.duration_since(self.last_frame_time));
        self.last_frame_time = now;
    }

    fn record(&mut self, elapsed: Duration) {
        let secs = elapsed.as_secs_f32();
        // Two frames inside the timer resolution; keep the last rate.
        if secs > 0.0 {
            self.fps = 1.0 / secs;
            self.min_fps = self.min_fps.min(self.fps);
            self.max_fps = self.max_fps.max(self.fps);
        }
        self.frame_count += 1;

        if self.frame_count % self.report_every == 0 {
            info!(
                "Performance stats after {} frames: Current: {:.1} FPS, Avg: {:.1} FPS, Min: {:.1} FPS, Max: {:.1} FPS",
                self.frame_count,
                self.fps,
                self.avg_fps(),
                self.min_fps,
                self.max_fps
            );
        } else {
            debug!(
                "Frame #{}: {:.1} FPS (frame time: {:.1}ms)",
                self.frame_count,
                self.fps,
                elapsed.as_millis()
            );
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn avg_fps(&self) -> f32 {
        let runtime = self.start_time.elapsed().as_secs_f32();
        if runtime > 0.0 {
            self.frame_count as f32 / runtime
        } else {
            0.0
        }
    }

    pub fn total_runtime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
