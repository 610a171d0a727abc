use anyhow::{Result, ensure};
use log::{debug, error, info, warning};
use opencv::core::{self, Mat, MatTraitConst, Point, Size};
use opencv::imgproc;

use crate::conf::{AssetsConf, Conf};
use crate::cv::blend::{Anchor, blend_region};
use crate::cv::dial::Dial;
use crate::cv::frame_metrics::FrameMetrics;
use crate::cv::histogram::{HistogramPanel, timestamp};
use crate::cv::layout::{Layout, OverlayKind, Placement};
use crate::cv::load_image;

pub const ESCAPE: i32 = 27;

/// Pull-based provider of video frames.
pub trait FrameSource {
    /// Reads the next frame into `frame`, blocking until one is available.
    /// `Ok(false)` means no frame was delivered.
    fn acquire(&mut self, frame: &mut Mat) -> Result<bool>;
    fn release(&mut self) -> Result<()>;
}

/// Where composited frames are shown and keys are read.
pub trait Surface {
    fn present(&mut self, frame: &Mat) -> Result<()>;
    /// Waits up to `timeout_ms` for a key press.
    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<i32>>;
    fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated,
}

/// Static overlay images, loaded once.
pub struct Assets {
    pub flight_director: Mat,
    pub mission_plan: Mat,
}

impl Assets {
    pub fn load(conf: &AssetsConf) -> Result<Self> {
        Ok(Self {
            flight_director: load_image(&conf.flight_director)?,
            mission_plan: load_image(&conf.mission_plan)?,
        })
    }
}

pub struct Compositor {
    frame_size: Size,
    layout: Vec<Placement>,
    assets: Assets,
    histogram: HistogramPanel,
    dial: Dial,
    dial_origin_x: i32,
    dial_bottom_offset: i32,
    key_poll_ms: i32,
    max_consecutive_failures: u32,
    metrics: FrameMetrics,
}

impl Compositor {
    pub fn new(cfg: &Conf, assets: Assets) -> Self {
        let frame_size = Size::new(cfg.camera.frame_width, cfg.camera.frame_height);

        for (name, image) in [
            ("flight director", &assets.flight_director),
            ("mission plan", &assets.mission_plan),
        ] {
            if image.cols() > frame_size.width || image.rows() > frame_size.height {
                warning!(
                    "The {} image ({}x{}) is larger than the {}x{} frame and will be clipped",
                    name,
                    image.cols(),
                    image.rows(),
                    frame_size.width,
                    frame_size.height
                );
            }
        }

        Self {
            frame_size,
            layout: cfg.layout.clone(),
            assets,
            histogram: HistogramPanel::new(cfg.histogram.width, cfg.histogram.height),
            dial: Dial::new(&cfg.dial),
            dial_origin_x: cfg.dial.origin_x,
            dial_bottom_offset: cfg.dial.bottom_offset,
            key_poll_ms: cfg.window.key_poll_ms,
            max_consecutive_failures: cfg.camera.max_consecutive_failures,
            metrics: FrameMetrics::new(100),
        }
    }

    /// Mirrors a captured frame and scales it to the output size.
    pub fn prepare(&self, raw: &Mat) -> Result<Mat> {
        let mut mirrored = Mat::default();
        core::flip(raw, &mut mirrored, 1)?;

        let mut resized = Mat::default();
        imgproc::resize(
            &mirrored,
            &mut resized,
            self.frame_size,
            0.,
            0.,
            imgproc::INTER_LINEAR,
        )?;
        Ok(resized)
    }

    /// Draws every overlay onto `frame` in layout order, then the dial.
    pub fn compose(&self, frame: &mut Mat, caption: &str) -> Result<()> {
        let panel = self.histogram.render(frame, caption)?;
        let mut layout = Layout::new(frame.size()?);

        for placement in &self.layout {
            let image = match placement.overlay {
                OverlayKind::MissionPlan => &self.assets.mission_plan,
                OverlayKind::FlightDirector => &self.assets.flight_director,
                OverlayKind::Histogram => &panel,
            };
            let region = layout.place(placement.overlay, image.size()?, &placement.slot)?;
            blend_region(frame, image, &Anchor::Explicit(region), placement.opacity)?;
        }

        let origin = Point::new(self.dial_origin_x, frame.rows() - self.dial_bottom_offset);
        self.dial.draw(frame, origin)?;
        Ok(())
    }

    /// Runs until Escape is pressed, then releases the source and closes the surface.
    pub fn run(
        &mut self,
        source: &mut impl FrameSource,
        surface: &mut impl Surface,
    ) -> Result<()> {
        info!(
            "Compositing at {}x{}, histogram panel {}x{}",
            self.frame_size.width,
            self.frame_size.height,
            self.histogram.width(),
            self.histogram.height()
        );

        let outcome = self.drive(source, surface);
        if let Err(e) = &outcome {
            error!("Compositor loop stopped: {:#}", e);
        }

        if let Err(e) = source.release() {
            error!("Failed to release capture source: {:#}", e);
        }
        if let Err(e) = surface.close() {
            error!("Failed to close display: {:#}", e);
        }

        info!(
            "Presented {} frames in {:.1?} ({:.1} FPS average)",
            self.metrics.frame_count(),
            self.metrics.total_runtime(),
            self.metrics.avg_fps()
        );
        outcome
    }

    fn drive(&mut self, source: &mut impl FrameSource, surface: &mut impl Surface) -> Result<()> {
        let mut state = LoopState::Running;
        let mut failures = 0u32;

        while state == LoopState::Running {
            state = self.step(source, surface, &mut failures)?;
        }

        debug!("Escape pressed, leaving compositor loop");
        Ok(())
    }

    fn step(
        &mut self,
        source: &mut impl FrameSource,
        surface: &mut impl Surface,
        failures: &mut u32,
    ) -> Result<LoopState> {
        let mut raw = Mat::default();
        let delivered = match source.acquire(&mut raw) {
            Ok(got) => got && !raw.empty(),
            Err(e) => {
                warning!("Frame acquisition failed: {:#}", e);
                false
            }
        };

        if delivered {
            *failures = 0;
            let mut frame = self.prepare(&raw)?;
            self.compose(&mut frame, &timestamp())?;
            surface.present(&frame)?;
            self.metrics.update();
        } else {
            *failures += 1;
            warning!("No frame from capture source ({} in a row)", failures);
            ensure!(
                *failures < self.max_consecutive_failures,
                "Capture source delivered no frame {} times in a row",
                failures
            );
        }

        let state = match surface.poll_key(self.key_poll_ms)? {
            Some(ESCAPE) => LoopState::Terminated,
            _ => LoopState::Running,
        };
        Ok(state)
    }
}
