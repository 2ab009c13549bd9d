use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::render::AnimationFrame;
use machipin_core::{pan_vector, EdgePanConfig};

use crate::map_camera::MapCamera;

/// Drives edge-triggered map panning with a per-frame callback loop.
///
/// The loop re-arms itself only while the tracked pointer still produces a
/// pan vector, so it self-terminates once the pointer leaves the edge margin.
/// `stop` cancels any scheduled frame deterministically by dropping the
/// handle.
pub(crate) struct EdgeScroller {
    camera: Rc<dyn MapCamera>,
    config: EdgePanConfig,
    pointer: Rc<Cell<Option<(f64, f64)>>>,
    frame: Rc<RefCell<Option<AnimationFrame>>>,
}

impl EdgeScroller {
    pub(crate) fn new(camera: Rc<dyn MapCamera>, config: EdgePanConfig) -> Self {
        Self {
            camera,
            config,
            pointer: Rc::new(Cell::new(None)),
            frame: Rc::new(RefCell::new(None)),
        }
    }

    /// Feeds the latest pointer position. Starts the frame loop when the
    /// pointer enters an edge margin and no frame is already scheduled.
    pub(crate) fn update_position(&self, x: f64, y: f64) {
        self.pointer.set(Some((x, y)));
        if self.frame.borrow().is_some() {
            return;
        }
        let (width, height) = self.camera.viewport_size();
        if pan_vector(x, y, width, height, &self.config).is_none() {
            return;
        }
        schedule(
            Rc::clone(&self.camera),
            self.config,
            Rc::clone(&self.pointer),
            Rc::clone(&self.frame),
        );
    }

    /// Clears the tracked pointer and cancels any scheduled frame.
    pub(crate) fn stop(&self) {
        self.pointer.set(None);
        self.frame.borrow_mut().take();
    }

    #[allow(dead_code)]
    pub(crate) fn is_active(&self) -> bool {
        self.frame.borrow().is_some()
    }
}

impl Drop for EdgeScroller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(target_arch = "wasm32")]
fn schedule(
    camera: Rc<dyn MapCamera>,
    config: EdgePanConfig,
    pointer: Rc<Cell<Option<(f64, f64)>>>,
    frame: Rc<RefCell<Option<AnimationFrame>>>,
) {
    let frame_slot = Rc::clone(&frame);
    let handle = gloo::render::request_animation_frame(move |_timestamp| {
        frame.borrow_mut().take();
        let Some((x, y)) = pointer.get() else {
            return;
        };
        let (width, height) = camera.viewport_size();
        let Some(vector) = pan_vector(x, y, width, height, &config) else {
            return;
        };
        camera.pan_by(vector.x, vector.y);
        schedule(camera, config, pointer, Rc::clone(&frame));
    });
    *frame_slot.borrow_mut() = Some(handle);
}

#[cfg(not(target_arch = "wasm32"))]
fn schedule(
    _camera: Rc<dyn MapCamera>,
    _config: EdgePanConfig,
    _pointer: Rc<Cell<Option<(f64, f64)>>>,
    _frame: Rc<RefCell<Option<AnimationFrame>>>,
) {
}
