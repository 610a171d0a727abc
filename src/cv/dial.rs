use anyhow::Result;
use opencv::core::{Mat, Point, Scalar};
use opencv::imgproc;
use std::f64::consts::PI;

use crate::conf::DialConf;

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub angle: i32,
    pub inner: Point,
    pub outer: Point,
    pub label: Option<Label>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub at: Point,
}

/// Elliptic gauge face with evenly spaced ticks and one highlighted angle.
#[derive(Debug, Clone)]
pub struct Dial {
    radius_x: i32,
    radius_y: i32,
    start_angle: i32,
    end_angle: i32,
    step: i32,
    label_every: i32,
    tick_length: i32,
    label_margin: i32,
    indicator_angle: Option<i32>,
    color: Scalar,
}

/// Point on the ellipse with radii `(a, b)` around `origin`. Angles grow
/// counter-clockwise on screen, so the arc sweeps upward from the x axis.
fn ellipse_point(origin: Point, a: i32, b: i32, degrees: i32) -> Point {
    let theta = -(degrees as f64) * PI / 180.0;
    Point::new(
        (origin.x as f64 + a as f64 * theta.cos()) as i32,
        (origin.y as f64 + b as f64 * theta.sin()) as i32,
    )
}

impl Dial {
    pub fn new(conf: &DialConf) -> Self {
        let [b, g, r] = conf.color;
        Self {
            radius_x: conf.radius_x,
            radius_y: conf.radius_y,
            start_angle: conf.start_angle,
            end_angle: conf.end_angle,
            step: conf.step.max(1),
            label_every: conf.label_every.max(1),
            tick_length: conf.tick_length,
            label_margin: conf.label_margin,
            indicator_angle: conf.indicator_angle,
            color: Scalar::new(b as f64, g as f64, r as f64, 0.),
        }
    }

    pub fn ticks(&self, origin: Point) -> Vec<Tick> {
        let (a, b) = (self.radius_x, self.radius_y);

        (self.start_angle..=self.end_angle)
            .step_by(self.step as usize)
            .map(|angle| Tick {
                angle,
                inner: ellipse_point(origin, a, b, angle),
                outer: ellipse_point(origin, a + self.tick_length, b + self.tick_length, angle),
                label: (angle % self.label_every == 0).then(|| Label {
                    text: angle.to_string(),
                    at: ellipse_point(origin, a + self.label_margin, b + self.label_margin, angle),
                }),
            })
            .collect()
    }

    /// Segment from the centre to the inner end of the indicator tick.
    pub fn indicator(&self, origin: Point) -> Option<(Point, Point)> {
        let angle = self.indicator_angle?;
        Some((origin, ellipse_point(origin, self.radius_x, self.radius_y, angle)))
    }

    pub fn draw(&self, img: &mut Mat, origin: Point) -> Result<()> {
        for tick in self.ticks(origin) {
            imgproc::line(img, tick.inner, tick.outer, self.color, 2, imgproc::LINE_AA, 0)?;

            if let Some(label) = &tick.label {
                imgproc::put_text(
                    img,
                    &label.text,
                    label.at,
                    imgproc::FONT_HERSHEY_PLAIN,
                    1.,
                    self.color,
                    1,
                    imgproc::LINE_4,
                    false,
                )?;
            }
        }

        if let Some((from, to)) = self.indicator(origin) {
            imgproc::line(img, from, to, self.color, 2, imgproc::LINE_8, 0)?;
        }

        Ok(())
    }
}
