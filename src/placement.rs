use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::EventListener;
use machipin_core::{corrected_drop_point, CreatePinInput, EdgePanConfig, MapId, PinColor, PinStyle, ScreenPoint};

use crate::edge_scroll::EdgeScroller;
use crate::map_camera::MapCamera;
use crate::notify::{Subscriber, SubscriberHandle, Subscribers};
use crate::store::ScrapbookStore;

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct DragSnapshot {
    pub(crate) dragging: bool,
    pub(crate) color: Option<PinColor>,
    pub(crate) pointer: ScreenPoint,
}

/// Pointer-gesture state machine that turns a toolbar color press into a
/// committed pin document at a map coordinate.
///
/// Window listeners are installed when a drag begins and released when it
/// ends or is cancelled. On non-touch-primary devices pointer moves feed the
/// edge scroller so the map keeps panning while the drag hugs a viewport
/// edge.
pub(crate) struct PlacementController<S> {
    store: Rc<S>,
    camera: Rc<dyn MapCamera>,
    map_id: MapId,
    owner_uid: String,
    touch_primary: bool,
    state: RefCell<DragSnapshot>,
    listeners: RefCell<Vec<EventListener>>,
    edge: EdgeScroller,
    subscribers: Subscribers,
    on_committed: RefCell<Option<Rc<dyn Fn()>>>,
}

impl<S: ScrapbookStore + 'static> PlacementController<S> {
    pub(crate) fn new(
        store: Rc<S>,
        camera: Rc<dyn MapCamera>,
        map_id: MapId,
        owner_uid: String,
        touch_primary: bool,
    ) -> Rc<Self> {
        let edge = EdgeScroller::new(Rc::clone(&camera), EdgePanConfig::default());
        Rc::new(Self {
            store,
            camera,
            map_id,
            owner_uid,
            touch_primary,
            state: RefCell::new(DragSnapshot::default()),
            listeners: RefCell::new(Vec::new()),
            edge,
            subscribers: Subscribers::new(),
            on_committed: RefCell::new(None),
        })
    }

    pub(crate) fn subscribe(&self, subscriber: Subscriber) -> SubscriberHandle {
        self.subscribers.subscribe(subscriber)
    }

    pub(crate) fn snapshot(&self) -> DragSnapshot {
        self.state.borrow().clone()
    }

    /// Called after a successful drop so the owner can optimistically bump
    /// the locally held pin count.
    pub(crate) fn set_on_committed(&self, callback: Rc<dyn Fn()>) {
        *self.on_committed.borrow_mut() = Some(callback);
    }

    /// Pointer-down on a toolbar color swatch.
    pub(crate) fn begin_drag(self: &Rc<Self>, color: PinColor, x: f64, y: f64) {
        {
            let mut state = self.state.borrow_mut();
            if state.dragging {
                return;
            }
            state.dragging = true;
            state.color = Some(color);
            state.pointer = ScreenPoint::new(x, y);
        }
        self.install_listeners();
        self.subscribers.notify();
    }

    pub(crate) fn pointer_moved(&self, x: f64, y: f64) {
        {
            let mut state = self.state.borrow_mut();
            if !state.dragging {
                return;
            }
            state.pointer = ScreenPoint::new(x, y);
        }
        if !self.touch_primary {
            self.edge.update_position(x, y);
        }
        self.subscribers.notify();
    }

    /// Pointer-up: commits the drop. Drop errors are logged and swallowed and
    /// the drag state resets regardless of the outcome.
    pub(crate) fn pointer_released(self: &Rc<Self>, x: f64, y: f64) {
        if !self.state.borrow().dragging {
            return;
        }
        self.edge.stop();
        let input = self.prepare_drop(x, y);
        self.reset();
        self.subscribers.notify();

        let Some(input) = input else {
            return;
        };
        #[cfg(target_arch = "wasm32")]
        {
            let controller = Rc::clone(self);
            wasm_bindgen_futures::spawn_local(async move {
                controller.commit(input).await;
            });
        }
        #[cfg(not(target_arch = "wasm32"))]
        let _ = input;
    }

    /// Escape key or pointer-cancel. Discards the drag and stops any running
    /// edge-scroll animation immediately.
    pub(crate) fn cancel_drag(&self) {
        if !self.state.borrow().dragging {
            return;
        }
        self.edge.stop();
        self.reset();
        self.subscribers.notify();
    }

    /// The pin input for a pointer-up at `(x, y)`: the rendered pin tip, not
    /// the raw input point, determines the geocoordinate.
    pub(crate) fn prepare_drop(&self, x: f64, y: f64) -> Option<CreatePinInput> {
        let color = self.state.borrow().color?;
        let drop_point = corrected_drop_point(ScreenPoint::new(x, y), self.touch_primary);
        let location = self.camera.unproject(drop_point);
        Some(CreatePinInput {
            map_id: self.map_id.clone(),
            owner_uid: self.owner_uid.clone(),
            location,
            style: PinStyle::colored(color),
        })
    }

    pub(crate) async fn commit(self: Rc<Self>, input: CreatePinInput) {
        match self.store.drop_pin_on_map(&input).await {
            Ok(pin_id) => {
                #[cfg(target_arch = "wasm32")]
                gloo::console::log!(format!("pin {pin_id} dropped on {}", input.map_id));
                #[cfg(not(target_arch = "wasm32"))]
                let _ = &pin_id;
                let callback = self.on_committed.borrow().clone();
                if let Some(callback) = callback {
                    callback();
                }
            }
            Err(error) => {
                #[cfg(target_arch = "wasm32")]
                gloo::console::error!(format!("failed to drop pin: {error}"));
                #[cfg(not(target_arch = "wasm32"))]
                let _ = &error;
            }
        }
    }

    fn reset(&self) {
        *self.state.borrow_mut() = DragSnapshot::default();
        self.listeners.borrow_mut().clear();
    }

    #[cfg(target_arch = "wasm32")]
    fn install_listeners(self: &Rc<Self>) {
        use gloo::events::EventListenerOptions;
        use wasm_bindgen::JsCast;

        let Some(window) = web_sys::window() else {
            return;
        };
        let mut listeners = Vec::new();

        let controller = Rc::clone(self);
        listeners.push(EventListener::new_with_options(
            &window,
            "pointermove",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                if let Some(event) = event.dyn_ref::<web_sys::PointerEvent>() {
                    event.prevent_default();
                    controller.pointer_moved(event.client_x() as f64, event.client_y() as f64);
                }
            },
        ));

        let controller = Rc::clone(self);
        listeners.push(EventListener::new(&window, "pointerup", move |event| {
            if let Some(event) = event.dyn_ref::<web_sys::PointerEvent>() {
                controller.pointer_released(event.client_x() as f64, event.client_y() as f64);
            }
        }));

        let controller = Rc::clone(self);
        listeners.push(EventListener::new(&window, "pointercancel", move |_event| {
            controller.cancel_drag();
        }));

        let controller = Rc::clone(self);
        listeners.push(EventListener::new(&window, "keydown", move |event| {
            if let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() {
                if event.key() == "Escape" {
                    controller.cancel_drag();
                }
            }
        }));

        // Block touch scrolling for the duration of the drag.
        listeners.push(EventListener::new_with_options(
            &window,
            "touchmove",
            EventListenerOptions::enable_prevent_default(),
            |event| event.prevent_default(),
        ));

        *self.listeners.borrow_mut() = listeners;
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn install_listeners(self: &Rc<Self>) {}
}
