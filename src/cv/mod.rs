pub mod blend;
pub mod dial;
pub mod frame_metrics;
pub mod histogram;
pub mod layout;

use anyhow::{Context, Result, bail};
use log::{debug, info};
use opencv::core::{Mat, MatTraitConst};
use opencv::highgui;
use opencv::imgcodecs;
use opencv::videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst};
use std::path::Path;

use crate::compositor::{FrameSource, Surface};
use crate::conf::WindowConf;

pub fn get_stream_camera(index: i32) -> Result<VideoCapture> {
    info!("Opening camera stream {}", index);
    let camera = VideoCapture::new(index, videoio::CAP_ANY)
        .with_context(|| format!("Failed to open camera {index}"))?;

    if !camera.is_opened()? {
        bail!("Camera {index} is not available");
    }
    debug!("Camera {} opened successfully with default settings", index);
    Ok(camera)
}

/// Decodes an image file as 8-bit BGR.
pub fn load_image(path: &Path) -> Result<Mat> {
    let name = path.to_str().context("Invalid image path")?;
    debug!("Loading image '{}'", name);

    let image = imgcodecs::imread(name, imgcodecs::IMREAD_COLOR)
        .with_context(|| format!("Failed to read image {name}"))?;
    if image.empty() {
        bail!("Image {name} is missing or could not be decoded");
    }

    info!("Loaded {} ({}x{})", name, image.cols(), image.rows());
    Ok(image)
}

impl FrameSource for VideoCapture {
    fn acquire(&mut self, frame: &mut Mat) -> Result<bool> {
        Ok(self.read(frame)?)
    }

    fn release(&mut self) -> Result<()> {
        info!("Releasing camera stream");
        Ok(VideoCaptureTrait::release(self)?)
    }
}

/// A named HighGUI window.
pub struct HighGuiWindow {
    name: String,
}

pub fn init_window(conf: &WindowConf) -> Result<HighGuiWindow> {
    debug!("Initializing display window '{}'", conf.title);
    highgui::named_window(&conf.title, highgui::WINDOW_AUTOSIZE)
        .with_context(|| format!("Could not create window '{}'", conf.title))?;
    highgui::move_window(&conf.title, conf.x, conf.y)?;
    debug!("Window '{}' created at ({}, {})", conf.title, conf.x, conf.y);

    Ok(HighGuiWindow {
        name: conf.title.clone(),
    })
}

impl Surface for HighGuiWindow {
    fn present(&mut self, frame: &Mat) -> Result<()> {
        Ok(highgui::imshow(&self.name, frame)?)
    }

    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<i32>> {
        let key = highgui::wait_key(timeout_ms)?;
        Ok((key >= 0).then_some(key & 0xFF))
    }

    fn close(&mut self) -> Result<()> {
        info!("Closing window '{}'", self.name);
        Ok(highgui::destroy_window(&self.name)?)
    }
}
