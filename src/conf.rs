use anyhow::{Context, Result, bail, ensure};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::cv::layout::{OverlayKind, Placement, Slot};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
    pub version: u8,
    pub camera: CameraConf,
    pub window: WindowConf,
    pub assets: AssetsConf,
    pub histogram: HistogramConf,
    pub dial: DialConf,
    /// Compositing order, first entry is blended first.
    pub layout: Vec<Placement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConf {
    pub index: i32,
    pub frame_width: i32,
    pub frame_height: i32,
    /// Failed reads tolerated in a row before the loop gives up.
    pub max_consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConf {
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub key_poll_ms: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConf {
    pub flight_director: PathBuf,
    pub mission_plan: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConf {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialConf {
    /// Horizontal position of the dial centre.
    pub origin_x: i32,
    /// Distance of the dial centre above the bottom edge of the frame.
    pub bottom_offset: i32,
    pub radius_x: i32,
    pub radius_y: i32,
    pub start_angle: i32,
    pub end_angle: i32,
    pub step: i32,
    pub label_every: i32,
    pub tick_length: i32,
    pub label_margin: i32,
    /// Angle whose tick gets the highlighted line from the centre.
    pub indicator_angle: Option<i32>,
    /// BGR
    pub color: [u8; 3],
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            version: 0,
            camera: CameraConf::default(),
            window: WindowConf::default(),
            assets: AssetsConf::default(),
            histogram: HistogramConf::default(),
            dial: DialConf::default(),
            layout: vec![
                Placement {
                    overlay: OverlayKind::MissionPlan,
                    opacity: 0.6,
                    slot: Slot::Corner,
                },
                Placement {
                    overlay: OverlayKind::FlightDirector,
                    opacity: 0.5,
                    slot: Slot::Above(OverlayKind::MissionPlan),
                },
                Placement {
                    overlay: OverlayKind::Histogram,
                    opacity: 0.6,
                    slot: Slot::LeftOf(OverlayKind::FlightDirector),
                },
            ],
        }
    }
}

impl Default for CameraConf {
    fn default() -> Self {
        Self {
            index: 0,
            frame_width: 800,
            frame_height: 600,
            max_consecutive_failures: 30,
        }
    }
}

impl Default for WindowConf {
    fn default() -> Self {
        Self {
            title: "Blended -P0W!".into(),
            x: -900,
            y: 300,
            key_poll_ms: 1,
        }
    }
}

impl Default for AssetsConf {
    fn default() -> Self {
        Self {
            flight_director: "assets/pfd.bmp".into(),
            mission_plan: "assets/missionplan.png".into(),
        }
    }
}

impl Default for HistogramConf {
    fn default() -> Self {
        Self {
            width: 200,
            height: 50,
        }
    }
}

impl Default for DialConf {
    fn default() -> Self {
        Self {
            origin_x: 100,
            bottom_offset: 90,
            radius_x: 100,
            radius_y: 90,
            start_angle: 0,
            end_angle: 120,
            step: 10,
            label_every: 30,
            tick_length: 15,
            label_margin: 20,
            indicator_angle: Some(60),
            color: [110, 117, 63],
        }
    }
}

impl Conf {
    /// Applies command line flags on top of the loaded file.
    pub fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(index) = args.camera {
            self.camera.index = index;
        }
        if let Some(path) = &args.flight_director {
            self.assets.flight_director = path.clone();
        }
        if let Some(path) = &args.mission_plan {
            self.assets.mission_plan = path.clone();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.camera.frame_width > 0 && self.camera.frame_height > 0,
            "frame size must be positive, got {}x{}",
            self.camera.frame_width,
            self.camera.frame_height
        );
        ensure!(
            self.histogram.width > 0 && self.histogram.height > 0,
            "histogram panel size must be positive, got {}x{}",
            self.histogram.width,
            self.histogram.height
        );
        ensure!(
            self.dial.radius_x > 0 && self.dial.radius_y > 0,
            "dial radii must be positive"
        );
        ensure!(self.dial.step > 0, "dial step must be positive");
        ensure!(
            self.dial.label_every > 0,
            "dial label interval must be positive"
        );

        let mut placed: Vec<OverlayKind> = Vec::with_capacity(self.layout.len());
        for placement in &self.layout {
            ensure!(
                (0.0..=1.0).contains(&placement.opacity),
                "opacity {} of {:?} is outside [0, 1]",
                placement.opacity,
                placement.overlay
            );
            if placed.contains(&placement.overlay) {
                bail!("{:?} appears twice in the layout", placement.overlay);
            }
            if let Some(reference) = placement.slot.reference() {
                ensure!(
                    placed.contains(&reference),
                    "{:?} is placed relative to {:?}, which is not placed before it",
                    placement.overlay,
                    reference
                );
            }
            placed.push(placement.overlay);
        }

        Ok(())
    }
}

/// Loads the configuration from `path`, or from the per-user location when
/// no path is given. A missing file is created with the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Conf> {
    let cfg: Conf = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            confy::load_path(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => {
            let location = confy::get_configuration_file_path("hudcam", None)?;
            info!("Loading configuration from {}", location.display());
            confy::load("hudcam", None).context("Failed to load config")?
        }
    };
    debug!("Configuration: {:?}", cfg);
    Ok(cfg)
}
