use anyhow::{Context, Result};
use opencv::core::{Rect, Size};
use serde::{Deserialize, Serialize};

use super::blend::{Anchor, resolve_region};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    MissionPlan,
    FlightDirector,
    Histogram,
}

/// Position of an overlay, either absolute or relative to one placed earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Bottom-right corner of the frame.
    Corner,
    /// Directly above the referenced overlay, right edges aligned.
    Above(OverlayKind),
    /// Directly left of the referenced overlay, bottom edges aligned.
    LeftOf(OverlayKind),
    At {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
}

impl Slot {
    pub fn reference(&self) -> Option<OverlayKind> {
        match self {
            Slot::Above(kind) | Slot::LeftOf(kind) => Some(*kind),
            Slot::Corner | Slot::At { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub overlay: OverlayKind,
    pub opacity: f64,
    pub slot: Slot,
}

/// Resolves slots to frame regions for one frame, remembering what has been
/// placed so later slots can refer to it.
#[derive(Debug)]
pub struct Layout {
    frame: Size,
    placed: Vec<(OverlayKind, Rect)>,
}

impl Layout {
    pub fn new(frame: Size) -> Self {
        Self {
            frame,
            placed: Vec::with_capacity(3),
        }
    }

    pub fn region(&self, kind: OverlayKind) -> Option<Rect> {
        self.placed
            .iter()
            .find(|(placed, _)| *placed == kind)
            .map(|(_, rect)| *rect)
    }

    /// Anchor for an overlay of any size in `slot`.
    pub fn anchor(&self, slot: &Slot) -> Result<Anchor> {
        let frame = self.frame;
        let anchor = match *slot {
            Slot::Corner => Anchor::BottomRight { cols: 0, rows: 0 },
            Slot::Above(kind) => {
                let below = self.placed_region(kind)?;
                Anchor::BottomRight {
                    cols: frame.width - (below.x + below.width),
                    rows: frame.height - below.y,
                }
            }
            Slot::LeftOf(kind) => {
                let right = self.placed_region(kind)?;
                Anchor::BottomRight {
                    cols: frame.width - right.x,
                    rows: frame.height - (right.y + right.height),
                }
            }
            Slot::At {
                x,
                y,
                width,
                height,
            } => Anchor::Explicit(Rect::new(x, y, width, height)),
        };
        Ok(anchor)
    }

    /// Places `kind` with the given size and returns its region.
    pub fn place(&mut self, kind: OverlayKind, size: Size, slot: &Slot) -> Result<Rect> {
        let anchor = self.anchor(slot)?;
        let rect = resolve_region(self.frame, size, &anchor);
        self.placed.retain(|(placed, _)| *placed != kind);
        self.placed.push((kind, rect));
        Ok(rect)
    }

    fn placed_region(&self, kind: OverlayKind) -> Result<Rect> {
        self.region(kind)
            .with_context(|| format!("{kind:?} must be placed before overlays that refer to it"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stack_matches_hand_offsets() {
        let frame = Size::new(800, 600);
        let mission = Size::new(200, 150);
        let pfd = Size::new(180, 120);
        let hist = Size::new(200, 50);

        let mut layout = Layout::new(frame);
        let m = layout.place(OverlayKind::MissionPlan, mission, &Slot::Corner).unwrap();
        let p = layout
            .place(OverlayKind::FlightDirector, pfd, &Slot::Above(OverlayKind::MissionPlan))
            .unwrap();
        let h = layout
            .place(OverlayKind::Histogram, hist, &Slot::LeftOf(OverlayKind::FlightDirector))
            .unwrap();

        let offsets = |size: Size, cols: i32, rows: i32| {
            resolve_region(frame, size, &Anchor::BottomRight { cols, rows })
        };
        assert_eq!(m, offsets(mission, 0, 0));
        assert_eq!(p, offsets(pfd, 0, mission.height));
        assert_eq!(h, offsets(hist, pfd.width, mission.height));
    }

    #[test]
    fn test_above_sits_on_top_edge() {
        let mut layout = Layout::new(Size::new(640, 480));
        let below = layout
            .place(OverlayKind::MissionPlan, Size::new(100, 60), &Slot::At { x: 50, y: 300, width: 100, height: 60 })
            .unwrap();
        let above = layout
            .place(OverlayKind::FlightDirector, Size::new(40, 30), &Slot::Above(OverlayKind::MissionPlan))
            .unwrap();
        assert_eq!(above.y + above.height, below.y);
        assert_eq!(above.x + above.width, below.x + below.width);
    }

    #[test]
    fn test_left_of_shares_bottom_edge() {
        let mut layout = Layout::new(Size::new(640, 480));
        let right = layout.place(OverlayKind::FlightDirector, Size::new(100, 60), &Slot::Corner).unwrap();
        let left = layout
            .place(OverlayKind::Histogram, Size::new(30, 20), &Slot::LeftOf(OverlayKind::FlightDirector))
            .unwrap();
        assert_eq!(left.x + left.width, right.x);
        assert_eq!(left.y + left.height, right.y + right.height);
    }

    #[test]
    fn test_unplaced_reference_is_an_error() {
        let mut layout = Layout::new(Size::new(640, 480));
        let err = layout
            .place(OverlayKind::Histogram, Size::new(30, 20), &Slot::Above(OverlayKind::MissionPlan))
            .unwrap_err();
        assert!(err.to_string().contains("MissionPlan"));
    }

    #[test]
    fn test_slot_reference() {
        assert_eq!(Slot::Corner.reference(), None);
        assert_eq!(
            Slot::LeftOf(OverlayKind::Histogram).reference(),
            Some(OverlayKind::Histogram)
        );
    }
}
