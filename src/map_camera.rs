use std::rc::Rc;

use machipin_core::{BoundingBox, CameraPose, GeoLocation, ScreenPoint};
use serde::Serialize;

/// Duration used for both the ease toward a selected pin and the restore on
/// deselect.
pub(crate) const CAMERA_EASE_MS: u32 = 550;

/// One camera transition request. `None` fields keep the current value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EaseRequest {
    pub(crate) center: GeoLocation,
    pub(crate) zoom: Option<f64>,
    pub(crate) bearing: Option<f64>,
    pub(crate) pitch: Option<f64>,
    /// Screen-space offset of the target from the viewport center, in pixels.
    pub(crate) offset: Option<(f64, f64)>,
    pub(crate) duration_ms: u32,
}

impl EaseRequest {
    /// Ease the camera to center on `center`, leaving zoom/bearing/pitch
    /// untouched.
    pub(crate) fn center_on(center: GeoLocation) -> Self {
        Self {
            center,
            zoom: None,
            bearing: None,
            pitch: None,
            offset: None,
            duration_ms: CAMERA_EASE_MS,
        }
    }

    /// Ease back to a previously captured pose.
    pub(crate) fn restore(pose: CameraPose) -> Self {
        Self {
            center: pose.center,
            zoom: Some(pose.zoom),
            bearing: Some(pose.bearing),
            pitch: Some(pose.pitch),
            offset: None,
            duration_ms: CAMERA_EASE_MS,
        }
    }

    pub(crate) fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = Some((x, y));
        self
    }
}

/// Scoped handle for a map click listener; dropping it detaches the listener.
pub(crate) struct ClickSubscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl ClickSubscription {
    pub(crate) fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for ClickSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Inert camera used when no map bridge is present.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) struct NullCamera;

#[cfg(not(target_arch = "wasm32"))]
impl MapCamera for NullCamera {
    fn unproject(&self, _point: ScreenPoint) -> GeoLocation {
        GeoLocation::new(0.0, 0.0)
    }

    fn pan_by(&self, _dx: f64, _dy: f64) {}

    fn ease_to(&self, _request: EaseRequest) {}

    fn pose(&self) -> CameraPose {
        CameraPose {
            center: GeoLocation::new(0.0, 0.0),
            zoom: 0.0,
            bearing: 0.0,
            pitch: 0.0,
        }
    }

    fn bounds(&self) -> BoundingBox {
        BoundingBox {
            north: 0.0,
            south: 0.0,
            east: 0.0,
            west: 0.0,
        }
    }

    fn viewport_size(&self) -> (f64, f64) {
        (0.0, 0.0)
    }

    fn on_click(&self, _handler: Rc<dyn Fn()>) -> ClickSubscription {
        ClickSubscription::new(|| {})
    }
}

/// Capability surface over the map renderer, passed explicitly into the
/// placement controller and the orchestrator at construction time.
pub(crate) trait MapCamera {
    /// Screen point (CSS pixels, viewport-relative) to geographic coordinate.
    fn unproject(&self, point: ScreenPoint) -> GeoLocation;

    /// Immediate pan by a screen-space vector, used by the edge scroller.
    fn pan_by(&self, dx: f64, dy: f64);

    fn ease_to(&self, request: EaseRequest);

    fn pose(&self) -> CameraPose;

    /// The geographic box currently visible, captured by the cut flow.
    fn bounds(&self) -> BoundingBox;

    /// Current viewport size in CSS pixels.
    fn viewport_size(&self) -> (f64, f64);

    /// Fires for clicks on empty map area (markers swallow their own clicks).
    fn on_click(&self, handler: Rc<dyn Fn()>) -> ClickSubscription;
}
