use std::cell::RefCell;
use std::rc::Rc;

use machipin_core::{CameraPose, MapId, MapRecord, PinRecord};

use crate::inspector::InspectorMachine;
use crate::map_camera::{ClickSubscription, EaseRequest, MapCamera};
use crate::notify::{Subscriber, SubscriberHandle, Subscribers};
use crate::placement::PlacementController;
use crate::store::{PinSubscription, ScrapbookStore, StoreError};

#[derive(Clone, Debug, Default)]
pub(crate) struct ViewSnapshot {
    pub(crate) map: Option<MapRecord>,
    pub(crate) pins: Vec<PinRecord>,
    pub(crate) selected_pin: Option<PinRecord>,
    pub(crate) is_loading: bool,
    pub(crate) load_error: Option<String>,
}

enum SelectionAfterUpdate {
    Unchanged,
    Refresh(PinRecord),
    Vanished,
}

/// Owns the screen-level composition: the map document, the live pin list,
/// pin selection with camera save/ease/restore, and the wiring between the
/// placement controller and the inspector machine.
pub(crate) struct MapViewOrchestrator<S> {
    store: Rc<S>,
    camera: Rc<dyn MapCamera>,
    map_id: MapId,
    user_uid: String,
    inspector: Rc<InspectorMachine<S>>,
    placement: Rc<PlacementController<S>>,
    state: RefCell<ViewSnapshot>,
    saved_pose: RefCell<Option<CameraPose>>,
    pins_subscription: RefCell<Option<PinSubscription>>,
    click_subscription: RefCell<Option<ClickSubscription>>,
    subscribers: Subscribers,
}

impl<S: ScrapbookStore + 'static> MapViewOrchestrator<S> {
    pub(crate) fn new(
        store: Rc<S>,
        camera: Rc<dyn MapCamera>,
        map_id: MapId,
        user_uid: String,
        touch_primary: bool,
    ) -> Rc<Self> {
        let inspector =
            InspectorMachine::new(Rc::clone(&store), map_id.clone(), user_uid.clone());
        let placement = PlacementController::new(
            Rc::clone(&store),
            Rc::clone(&camera),
            map_id.clone(),
            user_uid.clone(),
            touch_primary,
        );
        let orchestrator = Rc::new(Self {
            store,
            camera,
            map_id,
            user_uid,
            inspector,
            placement,
            state: RefCell::new(ViewSnapshot {
                is_loading: true,
                ..ViewSnapshot::default()
            }),
            saved_pose: RefCell::new(None),
            pins_subscription: RefCell::new(None),
            click_subscription: RefCell::new(None),
            subscribers: Subscribers::new(),
        });

        let weak = Rc::downgrade(&orchestrator);
        orchestrator.placement.set_on_committed(Rc::new(move || {
            if let Some(orchestrator) = weak.upgrade() {
                orchestrator.bump_pin_count();
            }
        }));
        orchestrator
    }

    pub(crate) fn inspector(&self) -> Rc<InspectorMachine<S>> {
        Rc::clone(&self.inspector)
    }

    pub(crate) fn placement(&self) -> Rc<PlacementController<S>> {
        Rc::clone(&self.placement)
    }

    pub(crate) fn subscribe(&self, subscriber: Subscriber) -> SubscriberHandle {
        self.subscribers.subscribe(subscriber)
    }

    pub(crate) fn snapshot(&self) -> ViewSnapshot {
        self.state.borrow().clone()
    }

    /// Binds the map click handler, opens the pins subscription for this
    /// map/user pairing, and starts loading the map document. Listener
    /// handles are owned here and released by `detach` (or drop).
    pub(crate) fn attach(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let click = self.camera.on_click(Rc::new(move || {
            if let Some(orchestrator) = weak.upgrade() {
                orchestrator.deselect();
            }
        }));
        *self.click_subscription.borrow_mut() = Some(click);

        let weak = Rc::downgrade(self);
        let on_data: Rc<dyn Fn(Vec<PinRecord>)> = Rc::new(move |pins| {
            if let Some(orchestrator) = weak.upgrade() {
                orchestrator.handle_pins_update(pins);
            }
        });
        let on_error: Rc<dyn Fn(StoreError)> = Rc::new(|error| {
            #[cfg(target_arch = "wasm32")]
            gloo::console::error!(format!("pin subscription error: {error}"));
            #[cfg(not(target_arch = "wasm32"))]
            let _ = &error;
        });
        let subscription = self.store.subscribe_pins(&self.map_id, on_data, on_error);
        *self.pins_subscription.borrow_mut() = Some(subscription);

        #[cfg(target_arch = "wasm32")]
        {
            let orchestrator = Rc::clone(self);
            wasm_bindgen_futures::spawn_local(async move {
                orchestrator.load_map().await;
            });
        }
    }

    /// Tears down the subscription and click handler. Safe to call more than
    /// once.
    pub(crate) fn detach(&self) {
        self.pins_subscription.borrow_mut().take();
        self.click_subscription.borrow_mut().take();
    }

    pub(crate) async fn load_map(self: &Rc<Self>) {
        self.state.borrow_mut().is_loading = true;
        self.subscribers.notify();

        let result = self.store.get_map(&self.map_id).await;
        {
            let mut state = self.state.borrow_mut();
            state.is_loading = false;
            match result {
                Ok(Some(map)) if map.owner_uid == self.user_uid => {
                    state.map = Some(map);
                    state.load_error = None;
                }
                Ok(Some(_)) => {
                    state.load_error =
                        Some("You do not have permission to view this map".to_string());
                }
                Ok(None) => {
                    state.load_error = Some("Map not found".to_string());
                }
                Err(error) => {
                    #[cfg(target_arch = "wasm32")]
                    gloo::console::error!(format!("failed to fetch map: {error}"));
                    #[cfg(not(target_arch = "wasm32"))]
                    let _ = &error;
                    state.load_error = Some("Failed to load the map".to_string());
                }
            }
        }
        self.subscribers.notify();
    }

    /// Marker click. The first selection of a session captures the current
    /// camera pose so deselecting can restore it.
    pub(crate) fn select_pin(self: &Rc<Self>, pin: PinRecord) {
        if self.saved_pose.borrow().is_none() {
            *self.saved_pose.borrow_mut() = Some(self.camera.pose());
        }
        let (width, _height) = self.camera.viewport_size();
        self.camera.ease_to(
            EaseRequest::center_on(pin.location).with_offset(-width / 4.0, 0.0),
        );
        self.state.borrow_mut().selected_pin = Some(pin.clone());
        self.inspector.select_pin(Some(pin));
        self.subscribers.notify();
    }

    /// Clears the selection, easing back to the pose captured on first
    /// selection.
    pub(crate) fn deselect(self: &Rc<Self>) {
        if self.state.borrow().selected_pin.is_none() {
            return;
        }
        self.state.borrow_mut().selected_pin = None;
        if let Some(pose) = self.saved_pose.borrow_mut().take() {
            self.camera.ease_to(EaseRequest::restore(pose));
        }
        self.inspector.select_pin(None);
        self.subscribers.notify();
    }

    /// One push from the pins subscription: the full current pin list.
    pub(crate) fn handle_pins_update(self: &Rc<Self>, pins: Vec<PinRecord>) {
        let selection = {
            let mut state = self.state.borrow_mut();
            state.pins = pins;
            match state.selected_pin.clone() {
                None => SelectionAfterUpdate::Unchanged,
                Some(selected) => {
                    match state.pins.iter().find(|pin| pin.id == selected.id).cloned() {
                        Some(updated) => {
                            state.selected_pin = Some(updated.clone());
                            SelectionAfterUpdate::Refresh(updated)
                        }
                        None => SelectionAfterUpdate::Vanished,
                    }
                }
            }
        };
        match selection {
            SelectionAfterUpdate::Unchanged => {}
            // Same pin, possibly new attachments: let the inspector reconcile.
            SelectionAfterUpdate::Refresh(pin) => self.inspector.select_pin(Some(pin)),
            SelectionAfterUpdate::Vanished => self.deselect(),
        }
        self.subscribers.notify();
    }

    /// Optimistic pin-count bump after a successful drop, ahead of the
    /// subscription round trip.
    fn bump_pin_count(&self) {
        if let Some(map) = self.state.borrow_mut().map.as_mut() {
            map.pin_count += 1;
        }
        self.subscribers.notify();
    }
}

impl<S> Drop for MapViewOrchestrator<S> {
    fn drop(&mut self) {
        self.pins_subscription.borrow_mut().take();
        self.click_subscription.borrow_mut().take();
    }
}
