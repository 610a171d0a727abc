use anyhow::{Result, ensure};
use opencv::core::{self, CV_8UC3, Mat, MatTraitConst, MatTraitConstManual, Point, Scalar, Vector};
use opencv::imgproc;

pub const BINS: usize = 256;

const CHANNEL_COLORS: [(f64, f64, f64); 3] = [(255., 0., 0.), (0., 255., 0.), (0., 0., 255.)];

/// Fixed-size image with the B, G and R intensity histograms of a frame.
#[derive(Debug, Clone, Copy)]
pub struct HistogramPanel {
    width: i32,
    height: i32,
}

impl HistogramPanel {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Per-channel histograms of `frame`, min-max normalized to `[0, height]`.
    pub fn channel_histograms(&self, frame: &Mat) -> Result<[Vec<f32>; 3]> {
        ensure!(
            frame.channels() == 3,
            "histogram needs a 3-channel frame, got {} channels",
            frame.channels()
        );

        let mut planes = Vector::<Mat>::new();
        core::split(frame, &mut planes)?;

        let channels = Vector::<i32>::from_slice(&[0]);
        let hist_size = Vector::<i32>::from_slice(&[BINS as i32]);
        let ranges = Vector::<f32>::from_slice(&[0., BINS as f32]);
        let no_mask = Mat::default();

        let mut out: [Vec<f32>; 3] = Default::default();
        for (plane, bins) in planes.iter().zip(out.iter_mut()) {
            let mut images = Vector::<Mat>::new();
            images.push(plane);

            let mut hist = Mat::default();
            imgproc::calc_hist(&images, &channels, &no_mask, &mut hist, &hist_size, &ranges, false)?;

            let mut normalized = Mat::default();
            core::normalize(
                &hist,
                &mut normalized,
                0.,
                self.height as f64,
                core::NORM_MINMAX,
                -1,
                &no_mask,
            )?;

            *bins = normalized.data_typed::<f32>()?.to_vec();
        }

        Ok(out)
    }

    /// Draws a fresh panel for `frame` with `caption` centred on it.
    pub fn render(&self, frame: &Mat, caption: &str) -> Result<Mat> {
        let histograms = self.channel_histograms(frame)?;

        let mut panel =
            Mat::new_rows_cols_with_default(self.height, self.width, CV_8UC3, Scalar::all(0.))?;

        for (bins, (b, g, r)) in histograms.iter().zip(CHANNEL_COLORS) {
            let color = Scalar::new(b, g, r, 0.);
            for (i, pair) in bins.windows(2).enumerate() {
                imgproc::line(
                    &mut panel,
                    self.bin_point(i, pair[0]),
                    self.bin_point(i + 1, pair[1]),
                    color,
                    2,
                    imgproc::LINE_8,
                    0,
                )?;
            }
        }

        draw_caption(&mut panel, caption)?;
        Ok(panel)
    }

    /// Maps a bucket to panel pixels, spreading all buckets across the width.
    fn bin_point(&self, bin: usize, value: f32) -> Point {
        let x = (bin as f64 * (self.width - 1) as f64 / (BINS - 1) as f64).round() as i32;
        Point::new(x, self.height - value.round() as i32)
    }
}

/// Current local time as shown on the panel.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn draw_caption(img: &mut Mat, text: &str) -> Result<()> {
    let font_face = imgproc::FONT_HERSHEY_PLAIN;
    let font_scale = 1.;
    let thickness = 1;
    let mut baseline = 0;

    let text_size = imgproc::get_text_size(text, font_face, font_scale, thickness, &mut baseline)?;
    baseline += thickness;

    let origin = Point::new(
        (img.cols() - text_size.width) / 2,
        (img.rows() + text_size.height) / 2,
    );
    let frame_color = Scalar::new(0., 0., 255., 0.);

    imgproc::rectangle_points(
        img,
        origin + Point::new(0, baseline),
        origin + Point::new(text_size.width, -text_size.height),
        frame_color,
        1,
        imgproc::LINE_8,
        0,
    )?;

    imgproc::line(
        img,
        origin + Point::new(0, thickness),
        origin + Point::new(text_size.width, thickness),
        frame_color,
        1,
        imgproc::LINE_8,
        0,
    )?;

    imgproc::put_text(
        img,
        text,
        origin,
        font_face,
        font_scale,
        Scalar::new(0., 255., 0., 0.),
        thickness,
        imgproc::LINE_AA,
        false,
    )?;

    Ok(())
}
