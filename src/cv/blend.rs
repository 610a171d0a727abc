use anyhow::{Result, ensure};
use log::{debug, warning};
use opencv::core::{self, Mat, MatTraitConst, Rect, Size};

/// Where an overlay lands on the destination image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Exactly this rectangle; its size must equal the overlay size.
    Explicit(Rect),
    /// Bottom-right corner of the destination, moved left by `cols` and up by `rows`.
    BottomRight { cols: i32, rows: i32 },
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::BottomRight { cols: 0, rows: 0 }
    }
}

pub fn resolve_region(dst: Size, overlay: Size, anchor: &Anchor) -> Rect {
    match *anchor {
        Anchor::Explicit(rect) => rect,
        Anchor::BottomRight { cols, rows } => Rect::new(
            dst.width - overlay.width - cols,
            dst.height - overlay.height - rows,
            overlay.width,
            overlay.height,
        ),
    }
}

/// Clips `region` against an image of size `bounds`.
///
/// Returns the visible destination rectangle together with the matching
/// rectangle in overlay coordinates, or `None` when nothing is visible.
pub fn clip_region(region: Rect, bounds: Size) -> Option<(Rect, Rect)> {
    let left = region.x.max(0);
    let top = region.y.max(0);
    let right = (region.x + region.width).min(bounds.width);
    let bottom = (region.y + region.height).min(bounds.height);

    if right <= left || bottom <= top {
        return None;
    }

    let target = Rect::new(left, top, right - left, bottom - top);
    let source = Rect::new(left - region.x, top - region.y, target.width, target.height);
    Some((target, source))
}

/// Blends `overlay` into `dst` in place: `dst = dst * opacity + overlay * (1 - opacity)`.
///
/// Regions reaching past the destination are clipped to the visible part.
/// Returns the destination rectangle that was written, `None` if the overlay
/// was entirely off-frame.
pub fn blend_region(
    dst: &mut Mat,
    overlay: &Mat,
    anchor: &Anchor,
    opacity: f64,
) -> Result<Option<Rect>> {
    ensure!(
        (0.0..=1.0).contains(&opacity),
        "opacity {opacity} is outside [0, 1]"
    );
    ensure!(
        dst.typ() == overlay.typ(),
        "overlay type {} does not match destination type {}",
        overlay.typ(),
        dst.typ()
    );

    let bounds = dst.size()?;
    let overlay_size = overlay.size()?;
    let region = resolve_region(bounds, overlay_size, anchor);
    ensure!(
        region.width == overlay_size.width && region.height == overlay_size.height,
        "region {:?} does not match overlay size {:?}",
        region,
        overlay_size
    );

    let Some((target, source)) = clip_region(region, bounds) else {
        warning!("Overlay region {:?} lies outside the {:?} frame, skipped", region, bounds);
        return Ok(None);
    };
    if target != region {
        debug!("Overlay region {:?} clipped to {:?}", region, target);
    }

    let base = Mat::roi(dst, target)?.try_clone()?;
    let top = Mat::roi(overlay, source)?.try_clone()?;

    let mut blended = Mat::default();
    core::add_weighted(&base, opacity, &top, 1.0 - opacity, 0.0, &mut blended, -1)?;

    let mut view = Mat::roi_mut(dst, target)?;
    blended.copy_to(&mut view)?;

    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{CV_8UC1, CV_8UC3, Scalar, Vec3b};

    fn solid(width: i32, height: i32, bgr: (f64, f64, f64)) -> Mat {
        Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::new(bgr.0, bgr.1, bgr.2, 0.))
            .unwrap()
    }

    fn pixel(img: &Mat, x: i32, y: i32) -> [u8; 3] {
        let px = img.at_2d::<Vec3b>(y, x).unwrap();
        [px[0], px[1], px[2]]
    }

    #[test]
    fn test_bottom_right_without_offsets_touches_corner() {
        let region = resolve_region(Size::new(800, 600), Size::new(200, 150), &Anchor::default());
        assert_eq!(region, Rect::new(600, 450, 200, 150));
        assert_eq!(region.x + region.width, 800);
        assert_eq!(region.y + region.height, 600);
    }

    #[test]
    fn test_offsets_shift_left_and_up() {
        let dst = Size::new(800, 600);
        let overlay = Size::new(120, 80);
        let base = resolve_region(dst, overlay, &Anchor::default());
        let shifted = resolve_region(dst, overlay, &Anchor::BottomRight { cols: 30, rows: 45 });
        assert_eq!(shifted.x, base.x - 30);
        assert_eq!(shifted.y, base.y - 45);
        assert_eq!(shifted.size(), base.size());
    }

    #[test]
    fn test_explicit_anchor_is_returned_as_is() {
        let rect = Rect::new(10, 20, 30, 40);
        assert_eq!(
            resolve_region(Size::new(800, 600), Size::new(30, 40), &Anchor::Explicit(rect)),
            rect
        );
    }

    #[test]
    fn test_clip_inside_is_identity() {
        let region = Rect::new(5, 5, 10, 10);
        let (target, source) = clip_region(region, Size::new(100, 100)).unwrap();
        assert_eq!(target, region);
        assert_eq!(source, Rect::new(0, 0, 10, 10));
    }

    #[test]
    fn test_clip_partially_outside() {
        let (target, source) = clip_region(Rect::new(-4, 90, 20, 20), Size::new(100, 100)).unwrap();
        assert_eq!(target, Rect::new(0, 90, 16, 10));
        assert_eq!(source, Rect::new(4, 0, 16, 10));
    }

    #[test]
    fn test_clip_fully_outside() {
        assert!(clip_region(Rect::new(100, 0, 10, 10), Size::new(100, 100)).is_none());
        assert!(clip_region(Rect::new(-10, -10, 10, 10), Size::new(100, 100)).is_none());
    }

    #[test]
    fn test_blend_touches_only_the_anchored_region() {
        let mut dst = solid(800, 600, (10., 20., 30.));
        let overlay = solid(200, 150, (200., 100., 50.));

        let written = blend_region(&mut dst, &overlay, &Anchor::default(), 0.6).unwrap();
        assert_eq!(written, Some(Rect::new(600, 450, 200, 150)));

        // 10*0.6 + 200*0.4, 20*0.6 + 100*0.4, 30*0.6 + 50*0.4
        let expected = [86, 52, 38];
        for y in 0..600 {
            for x in 0..800 {
                let inside = (450..600).contains(&y) && (600..800).contains(&x);
                let want = if inside { expected } else { [10, 20, 30] };
                assert_eq!(pixel(&dst, x, y), want, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_full_opacity_keeps_destination() {
        let mut dst = solid(64, 48, (1., 2., 3.));
        let overlay = solid(16, 16, (250., 250., 250.));
        blend_region(&mut dst, &overlay, &Anchor::default(), 1.0).unwrap();
        assert_eq!(pixel(&dst, 63, 47), [1, 2, 3]);
    }

    #[test]
    fn test_zero_opacity_replaces_destination() {
        let mut dst = solid(64, 48, (1., 2., 3.));
        let overlay = solid(16, 16, (250., 128., 7.));
        blend_region(&mut dst, &overlay, &Anchor::default(), 0.0).unwrap();
        assert_eq!(pixel(&dst, 63, 47), [250, 128, 7]);
        assert_eq!(pixel(&dst, 48, 32), [250, 128, 7]);
        assert_eq!(pixel(&dst, 47, 31), [1, 2, 3]);
    }

    #[test]
    fn test_overhanging_overlay_is_clipped() {
        let mut dst = solid(50, 50, (0., 0., 0.));
        let overlay = solid(20, 20, (100., 100., 100.));
        let anchor = Anchor::Explicit(Rect::new(40, -5, 20, 20));

        let written = blend_region(&mut dst, &overlay, &anchor, 0.5).unwrap();
        assert_eq!(written, Some(Rect::new(40, 0, 10, 15)));
        assert_eq!(pixel(&dst, 45, 10), [50, 50, 50]);
        assert_eq!(pixel(&dst, 39, 10), [0, 0, 0]);
        assert_eq!(pixel(&dst, 45, 15), [0, 0, 0]);
    }

    #[test]
    fn test_offframe_overlay_is_skipped() {
        let mut dst = solid(50, 50, (0., 0., 0.));
        let overlay = solid(20, 20, (100., 100., 100.));
        let anchor = Anchor::BottomRight { cols: 100, rows: 0 };
        assert_eq!(blend_region(&mut dst, &overlay, &anchor, 0.5).unwrap(), None);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let mut dst = solid(50, 50, (0., 0., 0.));
        let overlay = solid(20, 20, (100., 100., 100.));
        assert!(blend_region(&mut dst, &overlay, &Anchor::default(), 1.2).is_err());

        let gray = Mat::new_rows_cols_with_default(20, 20, CV_8UC1, Scalar::all(0.)).unwrap();
        assert!(blend_region(&mut dst, &gray, &Anchor::default(), 0.5).is_err());

        let wrong_size = Anchor::Explicit(Rect::new(0, 0, 10, 10));
        assert!(blend_region(&mut dst, &overlay, &wrong_size, 0.5).is_err());
    }
}
