//! Geometry engine: pure rotate/resize/crop math for item gestures.
//!
//! Every function here takes a snapshot of the geometry captured when the
//! gesture started plus the pointer delta accumulated since then, and returns
//! the new geometry. Nothing in this module reads or writes the document, so
//! a gesture replayed from the same snapshot and pointer path always lands on
//! the same result.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_SIZE;

/// A point in page-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite. Anything else would serialize as `null`.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Component-wise `self - other`.
    #[must_use]
    pub fn delta_from(self, other: Point) -> Point {
        Point { x: self.x - other.x, y: self.y - other.y }
    }
}

/// Axis-aligned bounding box of an item before rotation is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Center of the box; the rotation pivot.
    #[must_use]
    pub fn center(&self) -> Point {
        Point { x: self.x + self.width / 2.0, y: self.y + self.height / 2.0 }
    }
}

/// Internally positioned image layer clipped by its item container.
///
/// Offsets and size are absolute pixels relative to the container's top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRect {
    pub img_x: f64,
    pub img_y: f64,
    pub img_w: f64,
    pub img_h: f64,
}

impl CropRect {
    /// A crop layer that exactly fills a `width` x `height` container.
    #[must_use]
    pub fn filling(width: f64, height: f64) -> Self {
        Self { img_x: 0.0, img_y: 0.0, img_w: width, img_h: height }
    }
}

/// Compass tag naming which edges of the box a resize drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

/// Which side of an axis a handle moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisEdge {
    /// The axis is not affected.
    Fixed,
    /// Left or top edge: the position moves with the pointer.
    Start,
    /// Right or bottom edge: only the size changes.
    End,
}

impl ResizeAnchor {
    fn horizontal(self) -> AxisEdge {
        match self {
            Self::E | Self::Ne | Self::Se => AxisEdge::End,
            Self::W | Self::Nw | Self::Sw => AxisEdge::Start,
            Self::N | Self::S => AxisEdge::Fixed,
        }
    }

    fn vertical(self) -> AxisEdge {
        match self {
            Self::S | Self::Se | Self::Sw => AxisEdge::End,
            Self::N | Self::Ne | Self::Nw => AxisEdge::Start,
            Self::E | Self::W => AxisEdge::Fixed,
        }
    }
}

/// One of the four corner resize handles shown on a selected item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    #[must_use]
    pub fn anchor(self) -> ResizeAnchor {
        match self {
            Self::TopLeft => ResizeAnchor::Nw,
            Self::TopRight => ResizeAnchor::Ne,
            Self::BottomLeft => ResizeAnchor::Sw,
            Self::BottomRight => ResizeAnchor::Se,
        }
    }
}

/// One of the four edge handles shown while cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    #[must_use]
    pub fn anchor(self) -> ResizeAnchor {
        match self {
            Self::Top => ResizeAnchor::N,
            Self::Right => ResizeAnchor::E,
            Self::Bottom => ResizeAnchor::S,
            Self::Left => ResizeAnchor::W,
        }
    }
}

/// New rotation in degrees after dragging the rotate handle from `start` to `current`.
///
/// `center` must come from the rectangle captured at gesture start. The result
/// is `initial_rotation` plus the swept angle and is never normalized.
#[must_use]
pub fn compute_rotation(center: Point, start: Point, current: Point, initial_rotation: f64) -> f64 {
    let start_angle = (start.y - center.y).atan2(start.x - center.x);
    let current_angle = (current.y - center.y).atan2(current.x - center.x);
    initial_rotation + (current_angle - start_angle).to_degrees()
}

/// New box after dragging the `anchor` handle by `delta` from the `initial` box.
///
/// Each axis is resolved independently:
/// - a right/bottom edge grows or shrinks the size, clamped at [`MIN_SIZE`];
/// - a left/top edge moves the position with the pointer while the size
///   absorbs the difference. When that would leave less than [`MIN_SIZE`] the
///   size is pinned at [`MIN_SIZE`] against the opposite edge, and when the
///   edge would cross the opposite edge the axis keeps its initial values.
#[must_use]
pub fn compute_resize(anchor: ResizeAnchor, initial: Rect, delta: Point) -> Rect {
    let (x, width) = resize_axis(initial.x, initial.width, delta.x, anchor.horizontal());
    let (y, height) = resize_axis(initial.y, initial.height, delta.y, anchor.vertical());
    Rect { x, y, width, height }
}

fn resize_axis(pos: f64, size: f64, delta: f64, edge: AxisEdge) -> (f64, f64) {
    if !delta.is_finite() {
        return (pos, size);
    }
    match edge {
        AxisEdge::Fixed => (pos, size),
        AxisEdge::End => (pos, (size + delta).max(MIN_SIZE)),
        AxisEdge::Start => {
            let proposed = size - delta;
            if proposed >= MIN_SIZE {
                (pos + delta, proposed)
            } else if delta < size {
                (pos + size - MIN_SIZE, MIN_SIZE)
            } else {
                // EDGE: the dragged edge would pass through the opposite one.
                (pos, size)
            }
        }
    }
}

/// Scale a crop layer so its framing follows a container resize from `old` to `new`.
#[must_use]
pub fn compute_crop_scale(old: Rect, new: Rect, crop: CropRect) -> CropRect {
    let scale_x = if old.width > 0.0 { new.width / old.width } else { 1.0 };
    let scale_y = if old.height > 0.0 { new.height / old.height } else { 1.0 };
    CropRect {
        img_x: crop.img_x * scale_x,
        img_y: crop.img_y * scale_y,
        img_w: crop.img_w * scale_x,
        img_h: crop.img_h * scale_y,
    }
}

/// New crop layer offset after panning by `delta` from `initial`.
///
/// The layer moves against the pointer, as if the viewport were being
/// dragged over a fixed image. Offsets are not clamped.
#[must_use]
pub fn compute_crop_pan(initial: Point, delta: Point, sensitivity: f64) -> Point {
    Point { x: initial.x - delta.x * sensitivity, y: initial.y - delta.y * sensitivity }
}

/// Container and crop layer after dragging a crop `edge` by `delta`.
///
/// The container is resized with the same rules as [`compute_resize`]; the
/// image layer is shifted by the opposite of the container's movement so the
/// image stays still on the page and the edge reveals or hides part of it.
#[must_use]
pub fn compute_crop_edge_resize(edge: Edge, initial: Rect, crop: CropRect, delta: Point) -> (Rect, CropRect) {
    let rect = compute_resize(edge.anchor(), initial, delta);
    let shifted = CropRect {
        img_x: crop.img_x - (rect.x - initial.x),
        img_y: crop.img_y - (rect.y - initial.y),
        ..crop
    };
    (rect, shifted)
}
