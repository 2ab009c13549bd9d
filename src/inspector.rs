use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::timers::callback::Timeout;
use machipin_core::{
    draft_has_content, AttachmentStack, MapId, PinId, PinRecord, PolaroidId, PolaroidRecord,
};

use crate::notify::{Subscriber, SubscriberHandle, Subscribers};
use crate::store::{PhotoFile, ScrapbookStore, StoreResult};

pub(crate) const TOAST_DISMISS_MS: u32 = 3_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ToastKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Toast {
    pub(crate) message: String,
    pub(crate) kind: ToastKind,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct InspectorSnapshot {
    pub(crate) pin: Option<PinRecord>,
    pub(crate) active_polaroid: Option<PolaroidRecord>,
    pub(crate) attached_ids: AttachmentStack,
    pub(crate) is_loading: bool,
    pub(crate) toast: Option<Toast>,
    pub(crate) creator_peeking: bool,
    pub(crate) creator_open: bool,
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) struct PendingHydration {
    pub(crate) epoch: u64,
    pub(crate) polaroid_id: PolaroidId,
}

/// State machine behind the pin inspector panel.
///
/// Keyed by the selected pin's identity and its attachment-id signature: every
/// time either changes the machine re-evaluates, hydrating the last-attached
/// polaroid when there is one. Hydration responses carry the epoch that
/// issued them; a response from a superseded epoch is discarded so a slow
/// fetch can never overwrite newer state.
pub(crate) struct InspectorMachine<S> {
    store: Rc<S>,
    map_id: MapId,
    user_uid: String,
    state: RefCell<InspectorSnapshot>,
    reconcile_key: RefCell<Option<(PinId, String)>>,
    hydration_epoch: Cell<u64>,
    toast_timer: RefCell<Option<Timeout>>,
    subscribers: Subscribers,
    #[cfg(not(target_arch = "wasm32"))]
    pending_hydrations: RefCell<Vec<PendingHydration>>,
}

impl<S: ScrapbookStore + 'static> InspectorMachine<S> {
    pub(crate) fn new(store: Rc<S>, map_id: MapId, user_uid: String) -> Rc<Self> {
        Rc::new(Self {
            store,
            map_id,
            user_uid,
            state: RefCell::new(InspectorSnapshot::default()),
            reconcile_key: RefCell::new(None),
            hydration_epoch: Cell::new(0),
            toast_timer: RefCell::new(None),
            subscribers: Subscribers::new(),
            #[cfg(not(target_arch = "wasm32"))]
            pending_hydrations: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn subscribe(&self, subscriber: Subscriber) -> SubscriberHandle {
        self.subscribers.subscribe(subscriber)
    }

    pub(crate) fn snapshot(&self) -> InspectorSnapshot {
        self.state.borrow().clone()
    }

    /// Feeds the current selection. Passing the same pin with an unchanged
    /// attachment signature is a no-op; anything else re-evaluates the
    /// machine and invalidates any in-flight hydration.
    pub(crate) fn select_pin(self: &Rc<Self>, pin: Option<PinRecord>) {
        let key = pin
            .as_ref()
            .map(|pin| (pin.id.clone(), pin.attached_polaroid_ids.signature()));
        if *self.reconcile_key.borrow() == key && key.is_some() {
            return;
        }
        *self.reconcile_key.borrow_mut() = key;

        let epoch = self.hydration_epoch.get().wrapping_add(1);
        self.hydration_epoch.set(epoch);

        let active_id = pin
            .as_ref()
            .and_then(|pin| pin.attached_polaroid_ids.active().cloned());
        let hydrate = {
            let mut state = self.state.borrow_mut();
            match (pin, active_id) {
                (None, _) => {
                    state.pin = None;
                    state.attached_ids = AttachmentStack::new();
                    state.active_polaroid = None;
                    state.is_loading = false;
                    state.creator_peeking = false;
                    state.creator_open = false;
                    None
                }
                (Some(pin), None) => {
                    state.attached_ids = AttachmentStack::new();
                    state.pin = Some(pin);
                    state.active_polaroid = None;
                    state.is_loading = false;
                    state.creator_peeking = true;
                    state.creator_open = false;
                    None
                }
                (Some(pin), Some(target)) => {
                    state.attached_ids = pin.attached_polaroid_ids.clone();
                    state.pin = Some(pin);
                    state.creator_peeking = false;
                    state.creator_open = false;
                    state.is_loading = true;
                    Some(target)
                }
            }
        };
        if let Some(polaroid_id) = hydrate {
            self.spawn_hydration(polaroid_id, epoch);
        }
        self.subscribers.notify();
    }

    /// Applies a hydration response. Responses from superseded epochs are
    /// dropped on the floor.
    pub(crate) fn finish_hydration(
        self: &Rc<Self>,
        epoch: u64,
        result: StoreResult<Option<PolaroidRecord>>,
    ) {
        if epoch != self.hydration_epoch.get() {
            return;
        }
        let failed = {
            let mut state = self.state.borrow_mut();
            state.is_loading = false;
            match result {
                Ok(polaroid) => {
                    state.active_polaroid = polaroid;
                    false
                }
                Err(error) => {
                    #[cfg(target_arch = "wasm32")]
                    gloo::console::error!(format!("failed to fetch polaroid: {error}"));
                    #[cfg(not(target_arch = "wasm32"))]
                    let _ = &error;
                    state.active_polaroid = None;
                    true
                }
            }
        };
        if failed {
            self.show_toast("Failed to load polaroid", ToastKind::Error);
        }
        self.subscribers.notify();
    }

    pub(crate) fn open_creator(&self) {
        self.state.borrow_mut().creator_open = true;
        self.subscribers.notify();
    }

    pub(crate) fn close_creator(&self) {
        self.state.borrow_mut().creator_open = false;
        self.subscribers.notify();
    }

    /// Saves a new card for the selected pin: upload → create → attach →
    /// confirming re-fetch. Rejects locally when both photo and memo are
    /// absent; on any failure the local state stays untouched.
    pub(crate) async fn save_polaroid(self: Rc<Self>, photo: Option<PhotoFile>, memo: String) {
        let Some(pin_id) = self.state.borrow().pin.as_ref().map(|pin| pin.id.clone()) else {
            return;
        };
        if self.user_uid.is_empty() {
            return;
        }
        if !draft_has_content(photo.is_some(), &memo) {
            self.show_toast("Add a photo or memo first", ToastKind::Error);
            self.subscribers.notify();
            return;
        }

        let memo = memo.trim().to_string();
        let memo_field = (!memo.is_empty()).then_some(memo.as_str());
        let created = self
            .store
            .create_polaroid_for_pin(
                &self.map_id,
                &pin_id,
                &self.user_uid,
                photo.as_ref(),
                memo_field,
                None,
            )
            .await;
        let polaroid_id = match created {
            Ok(polaroid_id) => polaroid_id,
            Err(error) => {
                #[cfg(target_arch = "wasm32")]
                gloo::console::error!(format!("failed to save polaroid: {error}"));
                #[cfg(not(target_arch = "wasm32"))]
                let _ = &error;
                self.show_toast("Failed to save polaroid", ToastKind::Error);
                self.subscribers.notify();
                return;
            }
        };

        match self.store.get_polaroid(&self.map_id, &polaroid_id).await {
            Ok(Some(latest)) => {
                {
                    let mut state = self.state.borrow_mut();
                    state.attached_ids.push_unique(polaroid_id);
                    state.active_polaroid = Some(latest);
                    state.creator_open = false;
                    state.creator_peeking = false;
                }
                self.show_toast("Polaroid pinned!", ToastKind::Success);
            }
            Ok(None) => {
                self.show_toast("Saved, but failed to hydrate card", ToastKind::Error);
            }
            Err(error) => {
                #[cfg(target_arch = "wasm32")]
                gloo::console::error!(format!("failed to hydrate saved polaroid: {error}"));
                #[cfg(not(target_arch = "wasm32"))]
                let _ = &error;
                self.show_toast("Failed to save polaroid", ToastKind::Error);
            }
        }
        self.subscribers.notify();
    }

    /// Deletes the active card: blob (missing blob tolerated), unlink from
    /// the pin, then the document. Reverts to the peeking creator when the
    /// stack empties, otherwise re-hydrates the new topmost card.
    pub(crate) async fn delete_polaroid(self: Rc<Self>) {
        let (pin_id, active) = {
            let state = self.state.borrow();
            let Some(pin) = state.pin.as_ref() else {
                return;
            };
            let Some(active) = state.active_polaroid.clone() else {
                return;
            };
            (pin.id.clone(), active)
        };

        self.state.borrow_mut().is_loading = true;
        self.subscribers.notify();

        let deleted = self
            .store
            .delete_polaroid(
                &self.map_id,
                &pin_id,
                &active.id,
                active.storage_path.as_deref(),
            )
            .await;
        if let Err(error) = deleted {
            #[cfg(target_arch = "wasm32")]
            gloo::console::error!(format!("failed to delete polaroid: {error}"));
            #[cfg(not(target_arch = "wasm32"))]
            let _ = &error;
            self.state.borrow_mut().is_loading = false;
            self.show_toast("Failed to delete polaroid", ToastKind::Error);
            self.subscribers.notify();
            return;
        }

        let next_id = {
            let mut state = self.state.borrow_mut();
            state.attached_ids.remove(&active.id);
            if state.attached_ids.is_empty() {
                state.active_polaroid = None;
                state.creator_peeking = true;
                state.creator_open = false;
                None
            } else {
                state.attached_ids.active().cloned()
            }
        };

        if let Some(next_id) = next_id {
            match self.store.get_polaroid(&self.map_id, &next_id).await {
                Ok(polaroid) => {
                    self.state.borrow_mut().active_polaroid = polaroid;
                }
                Err(error) => {
                    #[cfg(target_arch = "wasm32")]
                    gloo::console::error!(format!("failed to hydrate next polaroid: {error}"));
                    #[cfg(not(target_arch = "wasm32"))]
                    let _ = &error;
                    self.state.borrow_mut().is_loading = false;
                    self.show_toast("Failed to delete polaroid", ToastKind::Error);
                    self.subscribers.notify();
                    return;
                }
            }
        }

        self.state.borrow_mut().is_loading = false;
        self.show_toast("Polaroid deleted", ToastKind::Success);
        self.subscribers.notify();
    }

    pub(crate) fn dismiss_toast(&self) {
        self.state.borrow_mut().toast = None;
        self.toast_timer.borrow_mut().take();
        self.subscribers.notify();
    }

    /// Replaces any visible toast. The 3 s dismissal runs from the newest
    /// toast; replacing the timer cancels the previous one.
    fn show_toast(self: &Rc<Self>, message: &str, kind: ToastKind) {
        self.state.borrow_mut().toast = Some(Toast {
            message: message.to_string(),
            kind,
        });
        self.arm_toast_timer();
    }

    #[cfg(target_arch = "wasm32")]
    fn arm_toast_timer(self: &Rc<Self>) {
        let machine = Rc::downgrade(self);
        *self.toast_timer.borrow_mut() = Some(Timeout::new(TOAST_DISMISS_MS, move || {
            if let Some(machine) = machine.upgrade() {
                machine.dismiss_toast();
            }
        }));
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn arm_toast_timer(self: &Rc<Self>) {}

    #[cfg(target_arch = "wasm32")]
    fn spawn_hydration(self: &Rc<Self>, polaroid_id: PolaroidId, epoch: u64) {
        let machine = Rc::clone(self);
        wasm_bindgen_futures::spawn_local(async move {
            let result = machine
                .store
                .get_polaroid(&machine.map_id, &polaroid_id)
                .await;
            machine.finish_hydration(epoch, result);
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_hydration(self: &Rc<Self>, polaroid_id: PolaroidId, epoch: u64) {
        self.pending_hydrations
            .borrow_mut()
            .push(PendingHydration { epoch, polaroid_id });
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub(crate) fn take_pending_hydrations(&self) -> Vec<PendingHydration> {
        std::mem::take(&mut *self.pending_hydrations.borrow_mut())
    }
}
