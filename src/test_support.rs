//! In-memory fakes for the store and camera capability surfaces.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use machipin_core::{
    AttachmentStack, BoundingBox, CameraPose, CreateMapInput, CreatePinInput, CreatePolaroidInput,
    GeoLocation, MapId, MapRecord, PinColor, PinId, PinRecord, PinStyle, PolaroidId,
    PolaroidRecord, ScreenPoint,
};

use crate::map_camera::{ClickSubscription, EaseRequest, MapCamera};
use crate::store::{
    PhotoFile, PinSubscription, PinsCallback, PinsErrorCallback, ScrapbookStore, StoreError,
    StoreResult, StoredPhoto,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum StoreCall {
    GetMap,
    ListMaps,
    CreateMap,
    AdjustPinCount(i64),
    CreatePin,
    AttachPolaroid,
    UploadPhoto,
    CreatePolaroid,
    GetPolaroid,
    DeletePolaroid,
}

#[derive(Default)]
struct FakeState {
    maps: Vec<MapRecord>,
    pins: Vec<PinRecord>,
    polaroids: Vec<PolaroidRecord>,
    blobs: Vec<String>,
    calls: Vec<StoreCall>,
    pin_count_deltas: Vec<(MapId, i64)>,
}

pub(crate) struct FakeStore {
    state: RefCell<FakeState>,
    next_id: Cell<u64>,
    clock: Cell<i64>,
    fail_adjust_pin_count: Cell<bool>,
    fail_create_pin: Cell<bool>,
    fail_create_polaroid: Cell<bool>,
    fail_delete_polaroid: Cell<bool>,
    subscriptions: Rc<RefCell<Vec<(u64, PinsCallback)>>>,
    next_subscription_id: Cell<u64>,
}

impl FakeStore {
    pub(crate) fn new() -> Self {
        Self {
            state: RefCell::new(FakeState::default()),
            next_id: Cell::new(0),
            clock: Cell::new(0),
            fail_adjust_pin_count: Cell::new(false),
            fail_create_pin: Cell::new(false),
            fail_create_polaroid: Cell::new(false),
            fail_delete_polaroid: Cell::new(false),
            subscriptions: Rc::new(RefCell::new(Vec::new())),
            next_subscription_id: Cell::new(0),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        format!("{prefix}-{id}")
    }

    fn tick(&self) -> i64 {
        let now = self.clock.get() + 1;
        self.clock.set(now);
        now
    }

    fn record(&self, call: StoreCall) {
        self.state.borrow_mut().calls.push(call);
    }

    pub(crate) fn calls(&self) -> Vec<StoreCall> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn insert_map(&self, map: MapRecord) {
        self.state.borrow_mut().maps.push(map);
    }

    pub(crate) fn insert_pin(&self, pin: PinRecord) {
        self.state.borrow_mut().pins.push(pin);
    }

    pub(crate) fn insert_polaroid(&self, polaroid: PolaroidRecord) {
        self.state.borrow_mut().polaroids.push(polaroid);
    }

    pub(crate) fn map(&self, map_id: &MapId) -> Option<MapRecord> {
        self.state
            .borrow()
            .maps
            .iter()
            .find(|map| &map.id == map_id)
            .cloned()
    }

    pub(crate) fn pin(&self, pin_id: &PinId) -> Option<PinRecord> {
        self.state
            .borrow()
            .pins
            .iter()
            .find(|pin| &pin.id == pin_id)
            .cloned()
    }

    pub(crate) fn pins_for(&self, map_id: &MapId) -> Vec<PinRecord> {
        self.state
            .borrow()
            .pins
            .iter()
            .filter(|pin| &pin.map_id == map_id)
            .cloned()
            .collect()
    }

    pub(crate) fn polaroid(&self, polaroid_id: &PolaroidId) -> Option<PolaroidRecord> {
        self.state
            .borrow()
            .polaroids
            .iter()
            .find(|polaroid| &polaroid.id == polaroid_id)
            .cloned()
    }

    pub(crate) fn pin_count_delta(&self, map_id: &MapId) -> i64 {
        self.state
            .borrow()
            .pin_count_deltas
            .iter()
            .filter(|(id, _)| id == map_id)
            .map(|(_, delta)| delta)
            .sum()
    }

    pub(crate) fn fail_adjust_pin_count(&self) {
        self.fail_adjust_pin_count.set(true);
    }

    pub(crate) fn fail_create_pin(&self) {
        self.fail_create_pin.set(true);
    }

    pub(crate) fn fail_create_polaroid(&self) {
        self.fail_create_polaroid.set(true);
    }

    pub(crate) fn fail_delete_polaroid(&self) {
        self.fail_delete_polaroid.set(true);
    }

    pub(crate) fn active_pin_subscriptions(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    /// Simulates one push from the document store: every live subscriber
    /// receives the full list.
    pub(crate) fn push_pins(&self, pins: Vec<PinRecord>) {
        let callbacks: Vec<_> = self
            .subscriptions
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback(pins.clone());
        }
    }

    fn injected(&self) -> StoreError {
        StoreError::Backend("injected failure".to_string())
    }
}

impl ScrapbookStore for FakeStore {
    async fn get_map(&self, map_id: &MapId) -> StoreResult<Option<MapRecord>> {
        self.record(StoreCall::GetMap);
        Ok(self.map(map_id))
    }

    async fn list_maps_by_owner(&self, owner_uid: &str) -> StoreResult<Vec<MapRecord>> {
        self.record(StoreCall::ListMaps);
        let mut maps: Vec<_> = self
            .state
            .borrow()
            .maps
            .iter()
            .filter(|map| map.owner_uid == owner_uid)
            .cloned()
            .collect();
        maps.sort_by_key(|map| std::cmp::Reverse(map.created_at));
        Ok(maps)
    }

    async fn create_map(&self, input: &CreateMapInput) -> StoreResult<MapId> {
        self.record(StoreCall::CreateMap);
        let now = self.tick();
        let map = MapRecord {
            id: MapId::new(self.next_id("map")),
            name: input.name.clone(),
            owner_uid: input.owner_uid.clone(),
            style_key: input.style_key.clone(),
            style_url: input.style_url.clone(),
            bounding_box: input.bounding_box,
            center: input.center,
            zoom: input.zoom,
            pin_count: 0,
            created_at: now,
            updated_at: now,
        };
        let id = map.id.clone();
        self.state.borrow_mut().maps.push(map);
        Ok(id)
    }

    async fn adjust_pin_count(&self, map_id: &MapId, delta: i64) -> StoreResult<()> {
        self.record(StoreCall::AdjustPinCount(delta));
        if self.fail_adjust_pin_count.get() {
            return Err(self.injected());
        }
        let now = self.tick();
        let mut state = self.state.borrow_mut();
        state.pin_count_deltas.push((map_id.clone(), delta));
        if let Some(map) = state.maps.iter_mut().find(|map| &map.id == map_id) {
            map.pin_count = (i64::from(map.pin_count) + delta).max(0) as u32;
            map.updated_at = now;
        }
        Ok(())
    }

    async fn create_pin(&self, input: &CreatePinInput) -> StoreResult<PinId> {
        self.record(StoreCall::CreatePin);
        if self.fail_create_pin.get() {
            return Err(self.injected());
        }
        let now = self.tick();
        let pin = PinRecord {
            id: PinId::new(self.next_id("pin")),
            map_id: input.map_id.clone(),
            owner_uid: input.owner_uid.clone(),
            location: input.location,
            style: input.style,
            attached_polaroid_ids: AttachmentStack::new(),
            created_at: now,
            updated_at: now,
        };
        let id = pin.id.clone();
        self.state.borrow_mut().pins.push(pin);
        Ok(id)
    }

    fn subscribe_pins(
        &self,
        _map_id: &MapId,
        on_data: PinsCallback,
        _on_error: PinsErrorCallback,
    ) -> PinSubscription {
        let id = self.next_subscription_id.get() + 1;
        self.next_subscription_id.set(id);
        self.subscriptions.borrow_mut().push((id, on_data));
        let registry = Rc::clone(&self.subscriptions);
        PinSubscription::new(move || {
            registry.borrow_mut().retain(|(entry, _)| *entry != id);
        })
    }

    async fn attach_polaroid_to_pin(
        &self,
        _map_id: &MapId,
        pin_id: &PinId,
        polaroid_id: &PolaroidId,
    ) -> StoreResult<()> {
        self.record(StoreCall::AttachPolaroid);
        let now = self.tick();
        let mut state = self.state.borrow_mut();
        let Some(pin) = state.pins.iter_mut().find(|pin| &pin.id == pin_id) else {
            return Err(StoreError::Backend(format!("pin {pin_id} not found")));
        };
        pin.attached_polaroid_ids.push_unique(polaroid_id.clone());
        pin.updated_at = now;
        Ok(())
    }

    async fn upload_photo(
        &self,
        owner_uid: &str,
        map_id: &MapId,
        file: &PhotoFile,
    ) -> StoreResult<StoredPhoto> {
        self.record(StoreCall::UploadPhoto);
        let path = format!("users/{owner_uid}/maps/{map_id}/polaroids/{}", file.name());
        self.state.borrow_mut().blobs.push(path.clone());
        Ok(StoredPhoto {
            url: format!("https://blobs.test/{path}"),
            path,
        })
    }

    async fn create_polaroid(&self, input: &CreatePolaroidInput) -> StoreResult<PolaroidId> {
        self.record(StoreCall::CreatePolaroid);
        if self.fail_create_polaroid.get() {
            return Err(self.injected());
        }
        let polaroid = PolaroidRecord {
            id: PolaroidId::new(self.next_id("polaroid")),
            map_id: input.map_id.clone(),
            owner_uid: input.owner_uid.clone(),
            kind: input.kind,
            photo_url: input.photo_url.clone(),
            storage_path: input.storage_path.clone(),
            memo: input.memo.clone(),
            exif_location: input.exif_location,
            created_at: self.tick(),
        };
        let id = polaroid.id.clone();
        self.state.borrow_mut().polaroids.push(polaroid);
        Ok(id)
    }

    async fn get_polaroid(
        &self,
        _map_id: &MapId,
        polaroid_id: &PolaroidId,
    ) -> StoreResult<Option<PolaroidRecord>> {
        self.record(StoreCall::GetPolaroid);
        Ok(self.polaroid(polaroid_id))
    }

    async fn delete_polaroid(
        &self,
        _map_id: &MapId,
        pin_id: &PinId,
        polaroid_id: &PolaroidId,
        storage_path: Option<&str>,
    ) -> StoreResult<()> {
        self.record(StoreCall::DeletePolaroid);
        if self.fail_delete_polaroid.get() {
            return Err(self.injected());
        }
        let mut state = self.state.borrow_mut();
        if let Some(path) = storage_path {
            // A missing blob is tolerated, so no existence check here.
            state.blobs.retain(|blob| blob != path);
        }
        if let Some(pin) = state.pins.iter_mut().find(|pin| &pin.id == pin_id) {
            pin.attached_polaroid_ids.remove(polaroid_id);
        }
        state.polaroids.retain(|polaroid| &polaroid.id != polaroid_id);
        Ok(())
    }
}

pub(crate) struct FakeCamera {
    eases: RefCell<Vec<EaseRequest>>,
    unprojected: RefCell<Vec<ScreenPoint>>,
    pans: RefCell<Vec<(f64, f64)>>,
    click_handlers: Rc<RefCell<Vec<(u64, Rc<dyn Fn()>)>>>,
    next_click_id: Cell<u64>,
}

impl FakeCamera {
    pub(crate) fn new() -> Self {
        Self {
            eases: RefCell::new(Vec::new()),
            unprojected: RefCell::new(Vec::new()),
            pans: RefCell::new(Vec::new()),
            click_handlers: Rc::new(RefCell::new(Vec::new())),
            next_click_id: Cell::new(0),
        }
    }

    /// Deterministic screen-to-geo mapping used by assertions.
    pub(crate) fn geo_for(x: f64, y: f64) -> GeoLocation {
        GeoLocation::new(y / 10.0, x / 10.0)
    }

    pub(crate) fn initial_pose(&self) -> CameraPose {
        CameraPose {
            center: GeoLocation::new(35.0, 139.0),
            zoom: 12.0,
            bearing: 0.0,
            pitch: 0.0,
        }
    }

    pub(crate) fn eases(&self) -> Vec<EaseRequest> {
        self.eases.borrow().clone()
    }

    pub(crate) fn unprojected(&self) -> Vec<ScreenPoint> {
        self.unprojected.borrow().clone()
    }

    #[allow(dead_code)]
    pub(crate) fn pans(&self) -> Vec<(f64, f64)> {
        self.pans.borrow().clone()
    }

    pub(crate) fn simulate_click(&self) {
        let handlers: Vec<_> = self
            .click_handlers
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler();
        }
    }
}

impl MapCamera for FakeCamera {
    fn unproject(&self, point: ScreenPoint) -> GeoLocation {
        self.unprojected.borrow_mut().push(point);
        Self::geo_for(point.x, point.y)
    }

    fn pan_by(&self, dx: f64, dy: f64) {
        self.pans.borrow_mut().push((dx, dy));
    }

    fn ease_to(&self, request: EaseRequest) {
        self.eases.borrow_mut().push(request);
    }

    fn pose(&self) -> CameraPose {
        self.initial_pose()
    }

    fn bounds(&self) -> BoundingBox {
        let center = self.initial_pose().center;
        BoundingBox {
            north: center.lat + 0.1,
            south: center.lat - 0.1,
            east: center.lng + 0.1,
            west: center.lng - 0.1,
        }
    }

    fn viewport_size(&self) -> (f64, f64) {
        (1280.0, 720.0)
    }

    fn on_click(&self, handler: Rc<dyn Fn()>) -> ClickSubscription {
        let id = self.next_click_id.get() + 1;
        self.next_click_id.set(id);
        self.click_handlers.borrow_mut().push((id, handler));
        let registry = Rc::clone(&self.click_handlers);
        ClickSubscription::new(move || {
            registry.borrow_mut().retain(|(entry, _)| *entry != id);
        })
    }
}

pub(crate) fn sample_map(id: &str, owner_uid: &str) -> MapRecord {
    MapRecord {
        id: MapId::from(id),
        name: format!("map {id}"),
        owner_uid: owner_uid.to_string(),
        style_key: "voyager".to_string(),
        style_url: "https://basemaps.cartocdn.com/gl/voyager-gl-style/style.json".to_string(),
        bounding_box: BoundingBox {
            north: 35.1,
            south: 34.9,
            east: 139.1,
            west: 138.9,
        },
        center: GeoLocation::new(35.0, 139.0),
        zoom: 13.0,
        pin_count: 0,
        created_at: 1,
        updated_at: 1,
    }
}

pub(crate) fn sample_pin(id: &str, attachment_ids: &[&str]) -> PinRecord {
    let mut pin = sample_pin_at(id, GeoLocation::new(35.0, 139.0));
    pin.attached_polaroid_ids = AttachmentStack::from_ids(
        attachment_ids.iter().map(|id| PolaroidId::from(*id)).collect(),
    );
    pin
}

pub(crate) fn sample_pin_at(id: &str, location: GeoLocation) -> PinRecord {
    PinRecord {
        id: PinId::from(id),
        map_id: MapId::from("map-1"),
        owner_uid: "user-1".to_string(),
        location,
        style: PinStyle::colored(PinColor::Red),
        attached_polaroid_ids: AttachmentStack::new(),
        created_at: 1,
        updated_at: 1,
    }
}

pub(crate) fn sample_pin_input(map_id: &str) -> CreatePinInput {
    CreatePinInput {
        map_id: MapId::from(map_id),
        owner_uid: "user-1".to_string(),
        location: GeoLocation::new(35.0, 139.0),
        style: PinStyle::colored(PinColor::Red),
    }
}

pub(crate) fn sample_polaroid(map_id: &str, id: &str) -> PolaroidRecord {
    PolaroidRecord {
        id: PolaroidId::from(id),
        map_id: MapId::from(map_id),
        owner_uid: "user-1".to_string(),
        kind: Default::default(),
        photo_url: None,
        storage_path: Some(format!("users/user-1/maps/{map_id}/polaroids/{id}.jpg")),
        memo: Some(format!("memo for {id}")),
        exif_location: None,
        created_at: 1,
    }
}
