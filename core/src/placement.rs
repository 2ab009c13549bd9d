use serde::{Deserialize, Serialize};

/// Viewport-relative pointer position in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Vertical distance between the raw input point and the rendered pin tip of
/// the drag overlay. Larger on touch-primary devices, where the overlay sits
/// further above the finger.
pub const DRAG_OFFSET_Y_TOUCH: f64 = 60.0;
pub const DRAG_OFFSET_Y_POINTER: f64 = 24.0;

pub fn drag_offset_y(touch_primary: bool) -> f64 {
    if touch_primary {
        DRAG_OFFSET_Y_TOUCH
    } else {
        DRAG_OFFSET_Y_POINTER
    }
}

/// The screen point whose unprojection becomes the pin's geocoordinate: the
/// pin tip, not the raw pointer position.
pub fn corrected_drop_point(point: ScreenPoint, touch_primary: bool) -> ScreenPoint {
    ScreenPoint {
        x: point.x,
        y: point.y - drag_offset_y(touch_primary),
    }
}
