#![allow(clippy::float_cmp)]

use std::cell::Cell;

use super::*;
use crate::geom::Rect;

#[derive(Default)]
struct CountingCapture {
    acquired: Cell<u32>,
    released: Cell<u32>,
}

impl PointerCapture for CountingCapture {
    fn acquire(&self) {
        self.acquired.set(self.acquired.get() + 1);
    }

    fn release(&self) {
        self.released.set(self.released.get() + 1);
    }
}

fn snapshot(crop: Option<CropRect>) -> GeometrySnapshot {
    GeometrySnapshot::new(Geometry { rect: Rect::new(10.0, 20.0, 100.0, 50.0), rotation: 0.0, crop })
}

#[test]
fn scope_acquires_on_open_and_releases_once_on_drop() {
    let capture = Rc::new(CountingCapture::default());
    let scope = GestureScope::open(capture.clone());
    assert_eq!(capture.acquired.get(), 1);
    assert_eq!(capture.released.get(), 0);
    drop(scope);
    assert_eq!(capture.released.get(), 1);
}

#[test]
fn dropping_gesture_releases_capture() {
    let capture = Rc::new(CountingCapture::default());
    let gesture = ActiveGesture::begin(
        ItemId::from("a"),
        PageKey::new(),
        ControlKind::Move,
        Point::new(0.0, 0.0),
        snapshot(None),
        capture.clone(),
    );
    assert_eq!(capture.acquired.get(), 1);
    drop(gesture);
    assert_eq!(capture.released.get(), 1);
}

#[test]
fn moved_position_adds_offset_to_initial_box() {
    let mut gesture = ActiveGesture::begin(
        ItemId::from("a"),
        PageKey::new(),
        ControlKind::Move,
        Point::new(0.0, 0.0),
        snapshot(None),
        Rc::new(NoopCapture),
    );
    gesture.offset = Point::new(5.0, -5.0);
    assert_eq!(gesture.moved_position(), Point::new(15.0, 15.0));
}

#[test]
fn crop_base_fills_container_when_image_has_no_crop() {
    assert_eq!(snapshot(None).crop_base(), CropRect::filling(100.0, 50.0));
    let crop = CropRect { img_x: -4.0, img_y: -2.0, img_w: 300.0, img_h: 150.0 };
    assert_eq!(snapshot(Some(crop)).crop_base(), crop);
}

#[test]
fn crop_kinds_are_flagged() {
    assert!(ControlKind::CropPan.is_crop());
    assert!(ControlKind::CropResize(Edge::Left).is_crop());
    assert!(!ControlKind::Move.is_crop());
    assert!(!ControlKind::Resize(Corner::TopLeft).is_crop());
    assert!(!ControlKind::Rotate.is_crop());
}
