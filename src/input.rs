//! Gesture model: control kinds, the active gesture, and scoped pointer capture.
//!
//! A gesture runs from pointer-down on a handle to pointer-up. While it runs
//! the engine holds exactly one `ActiveGesture`, which carries the immutable
//! geometry captured at pointer-down plus everything needed to compute the
//! next frame from the current pointer position. The gesture also owns the
//! host's pointer capture through a `GestureScope`, so capture is released
//! exactly once however the gesture ends.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::fmt;
use std::rc::Rc;

use crate::doc::{Geometry, ItemId, PageKey};
use crate::geom::{Corner, CropRect, Edge, Point};

/// Which handle started a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// Drag the whole item. Tracked as a transient offset until release.
    Move,
    /// Rotate handle above the item.
    Rotate,
    /// One of the four corner resize handles.
    Resize(Corner),
    /// One of the four edge handles shown in crop mode.
    CropResize(Edge),
    /// Pointer-down inside an image in crop mode.
    CropPan,
}

impl ControlKind {
    /// Whether this kind belongs to crop mode.
    #[must_use]
    pub fn is_crop(self) -> bool {
        matches!(self, Self::CropResize(_) | Self::CropPan)
    }
}

/// Host hook for window-level pointer tracking during a gesture.
///
/// `acquire` is called when a gesture starts; `release` is called exactly once
/// when it ends, is cancelled, or the engine is dropped mid-gesture.
pub trait PointerCapture {
    fn acquire(&self);
    fn release(&self);
}

/// Capture hook for hosts that route pointer events themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCapture;

impl PointerCapture for NoopCapture {
    fn acquire(&self) {}
    fn release(&self) {}
}

/// Guard holding pointer capture for the lifetime of one gesture.
pub struct GestureScope {
    capture: Rc<dyn PointerCapture>,
}

impl GestureScope {
    /// Acquire capture and return the guard that releases it.
    #[must_use]
    pub fn open(capture: Rc<dyn PointerCapture>) -> Self {
        capture.acquire();
        Self { capture }
    }
}

impl Drop for GestureScope {
    fn drop(&mut self) {
        self.capture.release();
    }
}

impl fmt::Debug for GestureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GestureScope")
    }
}

/// Immutable record of the item's geometry at pointer-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySnapshot {
    pub geometry: Geometry,
}

impl GeometrySnapshot {
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    /// Crop layer to start a crop gesture from. Images without a crop start
    /// from a layer that exactly fills the container.
    #[must_use]
    pub fn crop_base(&self) -> CropRect {
        let rect = self.geometry.rect;
        self.geometry
            .crop
            .unwrap_or_else(|| CropRect::filling(rect.width, rect.height))
    }
}

/// The single in-progress gesture.
#[derive(Debug)]
pub struct ActiveGesture {
    /// Item under control.
    pub item: ItemId,
    /// Page holding the item when the gesture started.
    pub page: PageKey,
    pub kind: ControlKind,
    /// Pointer position at pointer-down.
    pub start: Point,
    pub initial: GeometrySnapshot,
    /// Move only: pointer travel since pointer-down, not yet committed.
    pub offset: Point,
    _scope: GestureScope,
}

impl ActiveGesture {
    /// Start a gesture, acquiring pointer capture.
    #[must_use]
    pub fn begin(
        item: ItemId,
        page: PageKey,
        kind: ControlKind,
        start: Point,
        initial: GeometrySnapshot,
        capture: Rc<dyn PointerCapture>,
    ) -> Self {
        Self {
            item,
            page,
            kind,
            start,
            initial,
            offset: Point::default(),
            _scope: GestureScope::open(capture),
        }
    }

    /// Where a moved item currently displays, including the uncommitted offset.
    #[must_use]
    pub fn moved_position(&self) -> Point {
        let rect = self.initial.geometry.rect;
        Point::new(rect.x + self.offset.x, rect.y + self.offset.y)
    }
}
