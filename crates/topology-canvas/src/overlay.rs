/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Placement of overlays anchored to diagram nodes.
//!
//! The diagram is drawn into a surface rectangle in viewport coordinates and
//! scaled to fit it. Overlays are positioned in viewport coordinates so they
//! can spill outside the surface but never outside the viewport.

use euclid::default::{Point2D, Rect, Size2D};
use serde::{Deserialize, Serialize};

/// Space between a node box and an overlay anchored to it.
pub const OVERLAY_GAP: f32 = 12.0;
/// Minimum distance kept between an overlay and the viewport edge.
pub const VIEWPORT_MARGIN: f32 = 12.0;
/// Info popups hug the surface's right edge at this inset.
pub const INFO_RIGHT_INSET: f32 = 18.0;
pub const INFO_MIN_TOP: f32 = 12.0;

const EDITOR_MIN_WIDTH: f32 = 280.0;
const EDITOR_MAX_WIDTH: f32 = 320.0;
const EDITOR_MIN_HEIGHT: f32 = 180.0;
const EDITOR_MAX_HEIGHT: f32 = 300.0;
/// Horizontal room kept free around the editor on narrow viewports.
const EDITOR_VIEWPORT_SLACK: f32 = 48.0;
/// Extra clearance when the editor flips above its node.
const EDITOR_FLIP_CLEARANCE: f32 = 24.0;

/// Maps diagram space onto the surface rectangle it is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTransform {
    /// Where the diagram is drawn, in viewport coordinates.
    pub surface: Rect<f32>,
    /// Diagram extent (the SVG viewBox size).
    pub diagram: Size2D<f32>,
}

impl SurfaceTransform {
    pub fn new(surface: Rect<f32>, diagram: Size2D<f32>) -> Self {
        Self { surface, diagram }
    }

    fn scale(&self) -> (f32, f32) {
        let sx = if self.diagram.width > 0.0 {
            self.surface.size.width / self.diagram.width
        } else {
            1.0
        };
        let sy = if self.diagram.height > 0.0 {
            self.surface.size.height / self.diagram.height
        } else {
            1.0
        };
        (sx, sy)
    }

    pub fn to_viewport_rect(&self, rect: Rect<f32>) -> Rect<f32> {
        let (sx, sy) = self.scale();
        Rect::new(
            Point2D::new(
                (self.surface.origin.x + rect.origin.x * sx).round(),
                (self.surface.origin.y + rect.origin.y * sy).round(),
            ),
            Size2D::new((rect.size.width * sx).round(), (rect.size.height * sy).round()),
        )
    }

    pub fn to_diagram_point(&self, point: Point2D<f32>) -> Point2D<f32> {
        let (sx, sy) = self.scale();
        Point2D::new(
            (point.x - self.surface.origin.x) / sx,
            (point.y - self.surface.origin.y) / sy,
        )
    }
}

/// Which side of its node the editor ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorSide {
    Right,
    Left,
    Below,
    /// Flipped above the node because there was no room underneath.
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditorPlacement {
    pub rect: Rect<f32>,
    pub side: EditorSide,
}

/// Editor size for a surface of `surface` pixels in a viewport `viewport_width`
/// wide.
pub fn editor_size(surface: Size2D<f32>, viewport_width: f32) -> Size2D<f32> {
    let width = (viewport_width - EDITOR_VIEWPORT_SLACK)
        .min(surface.width * 0.5)
        .round()
        .max(EDITOR_MIN_WIDTH)
        .min(EDITOR_MAX_WIDTH);
    let height = (surface.height * 0.5)
        .min(EDITOR_MAX_HEIGHT)
        .round()
        .max(EDITOR_MIN_HEIGHT);
    Size2D::new(width, height)
}

/// Place an editor of `size` next to `node` (viewport coordinates).
///
/// Right of the node first, then left, then centred below; the result is
/// clamped into `viewport` minus [`VIEWPORT_MARGIN`], flipping above the
/// node when it would run off the bottom.
pub fn place_editor(node: Rect<f32>, size: Size2D<f32>, viewport: Rect<f32>) -> EditorPlacement {
    let min_x = viewport.min_x() + VIEWPORT_MARGIN;
    let max_x = viewport.max_x() - VIEWPORT_MARGIN - size.width;
    let min_y = viewport.min_y() + VIEWPORT_MARGIN;
    let max_y = viewport.max_y() - VIEWPORT_MARGIN - size.height;

    let mut side = EditorSide::Right;
    let mut x = node.max_x() + OVERLAY_GAP;
    let mut y = node.min_y();

    if x > max_x {
        let left = node.min_x() - size.width - OVERLAY_GAP;
        if left >= min_x {
            side = EditorSide::Left;
            x = left;
        } else {
            side = EditorSide::Below;
            x = (node.min_x() + node.size.width / 2.0 - size.width / 2.0).round();
            y = node.max_y() + OVERLAY_GAP;
        }
    }

    if y > max_y {
        y = y - size.height - node.size.height - EDITOR_FLIP_CLEARANCE;
        if side == EditorSide::Below {
            side = EditorSide::Above;
        }
    }

    EditorPlacement {
        rect: Rect::new(
            Point2D::new(clamp_axis(x, min_x, max_x), clamp_axis(y, min_y, max_y)),
            size,
        ),
        side,
    }
}

/// Clamp that prefers the low bound when the range is empty, so an overlay
/// larger than the viewport still starts at the margin.
fn clamp_axis(value: f32, low: f32, high: f32) -> f32 {
    if high < low { low } else { value.clamp(low, high) }
}

/// Info popup position relative to the diagram surface: pinned to the right
/// edge, vertically level with the node it describes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InfoPlacement {
    pub right_inset: f32,
    pub top: f32,
}

pub fn place_info(node_top: f32) -> InfoPlacement {
    InfoPlacement {
        right_inset: INFO_RIGHT_INSET,
        top: node_top.max(INFO_MIN_TOP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect<f32> {
        Rect::new(Point2D::new(x, y), Size2D::new(w, h))
    }

    fn viewport() -> Rect<f32> {
        rect(0.0, 0.0, 1280.0, 800.0)
    }

    const EDITOR: Size2D<f32> = Size2D::new(300.0, 200.0);

    #[test]
    fn prefers_right_side() {
        let placement = place_editor(rect(100.0, 100.0, 220.0, 58.0), EDITOR, viewport());
        assert_eq!(placement.side, EditorSide::Right);
        assert_eq!(placement.rect.origin, Point2D::new(332.0, 100.0));
    }

    #[test]
    fn falls_back_to_left_side() {
        let placement = place_editor(rect(900.0, 100.0, 220.0, 58.0), EDITOR, viewport());
        assert_eq!(placement.side, EditorSide::Left);
        assert_eq!(placement.rect.origin, Point2D::new(588.0, 100.0));
    }

    #[test]
    fn falls_back_to_centred_below_when_neither_side_fits() {
        let narrow = rect(0.0, 0.0, 500.0, 800.0);
        let placement = place_editor(rect(140.0, 100.0, 220.0, 58.0), EDITOR, narrow);
        assert_eq!(placement.side, EditorSide::Below);
        assert_eq!(placement.rect.origin, Point2D::new(100.0, 170.0));
    }

    #[test]
    fn below_placement_is_clamped_horizontally() {
        let narrow = rect(0.0, 0.0, 400.0, 800.0);
        let placement = place_editor(rect(0.0, 100.0, 390.0, 58.0), EDITOR, narrow);
        assert_eq!(placement.side, EditorSide::Below);
        assert_eq!(placement.rect.origin.x, 45.0);
        assert!(placement.rect.max_x() <= 400.0 - VIEWPORT_MARGIN);
    }

    #[test]
    fn flips_above_when_bottom_overflows() {
        let narrow = rect(0.0, 0.0, 500.0, 600.0);
        let placement = place_editor(rect(140.0, 450.0, 220.0, 58.0), EDITOR, narrow);
        assert_eq!(placement.side, EditorSide::Above);
        assert_eq!(placement.rect.origin.y, 450.0 - EDITOR.height - OVERLAY_GAP);
    }

    #[test]
    fn always_inside_viewport_margin() {
        let small = rect(0.0, 0.0, 320.0, 220.0);
        let placement = place_editor(rect(10.0, 10.0, 200.0, 46.0), EDITOR, small);
        assert_eq!(placement.rect.origin, Point2D::new(12.0, 12.0));
    }

    #[rstest]
    #[case(Size2D::new(800.0, 240.0), 1280.0, Size2D::new(320.0, 180.0))]
    #[case(Size2D::new(400.0, 800.0), 1280.0, Size2D::new(280.0, 300.0))]
    #[case(Size2D::new(620.0, 440.0), 1280.0, Size2D::new(310.0, 220.0))]
    #[case(Size2D::new(1600.0, 440.0), 300.0, Size2D::new(280.0, 220.0))]
    fn editor_size_is_bounded(
        #[case] surface: Size2D<f32>,
        #[case] viewport_width: f32,
        #[case] expected: Size2D<f32>,
    ) {
        assert_eq!(editor_size(surface, viewport_width), expected);
    }

    #[test]
    fn transform_round_trips_points_and_scales_rects() {
        let transform = SurfaceTransform::new(rect(20.0, 40.0, 400.0, 120.0), Size2D::new(800.0, 240.0));
        let mapped = transform.to_viewport_rect(rect(290.0, 31.0, 220.0, 58.0));
        assert_eq!(mapped, rect(165.0, 56.0, 110.0, 29.0));
        assert_eq!(
            transform.to_diagram_point(Point2D::new(220.0, 70.0)),
            Point2D::new(400.0, 60.0)
        );
    }

    #[test]
    fn info_popup_never_hugs_the_top() {
        assert_eq!(place_info(2.0).top, INFO_MIN_TOP);
        assert_eq!(place_info(151.0).top, 151.0);
        assert_eq!(place_info(151.0).right_inset, INFO_RIGHT_INSET);
    }
}
