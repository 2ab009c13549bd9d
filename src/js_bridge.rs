//! Host-page bridge.
//!
//! The document/blob store and the map renderer are owned by the host page,
//! which exposes them as window globals (`__MACHIPIN_STORE`, `__MACHIPIN_MAP`,
//! `__MACHIPIN_SESSION`). Methods are dispatched via `Reflect`, promises are
//! awaited through `JsFuture`, and documents cross the boundary as JSON
//! (strings or plain objects, both accepted).

use std::rc::Rc;

use js_sys::{Array, Function, Promise, Reflect};
use machipin_core::{
    BoundingBox, CameraPose, CreateMapInput, CreatePinInput, CreatePolaroidInput, GeoLocation,
    MapId, MapRecord, PinId, PinRecord, PolaroidId, PolaroidRecord, ScreenPoint,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::map_camera::{ClickSubscription, EaseRequest, MapCamera};
use crate::store::{
    PhotoFile, PinSubscription, PinsCallback, PinsErrorCallback, ScrapbookStore, StoreError,
    StoreResult, StoredPhoto,
};

const STORE_GLOBAL: &str = "__MACHIPIN_STORE";
const MAP_GLOBAL: &str = "__MACHIPIN_MAP";
const SESSION_GLOBAL: &str = "__MACHIPIN_SESSION";

/// Identity of the mounted map view, published by the host page after auth.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HostSession {
    pub(crate) map_id: MapId,
    pub(crate) user_uid: String,
}

pub(crate) fn host_session() -> Option<HostSession> {
    let window = web_sys::window()?;
    let value = Reflect::get(&window, &JsValue::from_str(SESSION_GLOBAL)).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    decode_value(&value).ok()
}

/// `(pointer: coarse)` media query, the touch-primary signal that selects the
/// larger drag offset and disables edge scrolling.
pub(crate) fn touch_primary() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    match window.match_media("(pointer: coarse)") {
        Ok(Some(query)) => query.matches(),
        _ => false,
    }
}

fn js_err(error: JsValue) -> StoreError {
    if let Some(value) = error.as_string() {
        return StoreError::Backend(value);
    }
    if let Ok(json) = js_sys::JSON::stringify(&error) {
        if let Some(value) = json.as_string() {
            return StoreError::Backend(value);
        }
    }
    StoreError::Backend("js error".to_string())
}

fn host_object(name: &'static str) -> StoreResult<JsValue> {
    let window = web_sys::window().ok_or(StoreError::Unavailable("missing window"))?;
    let value = Reflect::get(&window, &JsValue::from_str(name)).map_err(js_err)?;
    if value.is_null() || value.is_undefined() {
        return Err(StoreError::Unavailable(name));
    }
    Ok(value)
}

fn host_method(target: &JsValue, method: &str) -> StoreResult<Function> {
    Reflect::get(target, &JsValue::from_str(method))
        .map_err(js_err)?
        .dyn_into::<Function>()
        .map_err(|_| StoreError::Decode(format!("host method {method} is not a function")))
}

fn call_sync(target: &JsValue, method: &str, args: &[JsValue]) -> StoreResult<JsValue> {
    let func = host_method(target, method)?;
    let array = Array::new();
    for arg in args {
        array.push(arg);
    }
    func.apply(target, &array).map_err(js_err)
}

async fn call_async(target: &JsValue, method: &str, args: &[JsValue]) -> StoreResult<JsValue> {
    let result = call_sync(target, method, args)?;
    match result.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await.map_err(js_err),
        Err(value) => Ok(value),
    }
}

fn decode_value<T: DeserializeOwned>(value: &JsValue) -> StoreResult<T> {
    let text = if let Some(text) = value.as_string() {
        text
    } else {
        js_sys::JSON::stringify(value)
            .ok()
            .and_then(|json| json.as_string())
            .ok_or_else(|| StoreError::Decode("host value is not stringifiable".to_string()))?
    };
    serde_json::from_str(&text).map_err(|error| StoreError::Decode(error.to_string()))
}

fn decode_optional<T: DeserializeOwned>(value: &JsValue) -> StoreResult<Option<T>> {
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }
    decode_value(value).map(Some)
}

fn decode_id(value: &JsValue) -> StoreResult<String> {
    value
        .as_string()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| StoreError::Decode("host did not return a document id".to_string()))
}

fn encode_arg<T: serde::Serialize>(value: &T) -> StoreResult<JsValue> {
    serde_json::to_string(value)
        .map(|json| JsValue::from_str(&json))
        .map_err(|error| StoreError::Decode(error.to_string()))
}

/// `ScrapbookStore` over the host page's store object.
pub(crate) struct BridgeStore;

impl BridgeStore {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl ScrapbookStore for BridgeStore {
    async fn get_map(&self, map_id: &MapId) -> StoreResult<Option<MapRecord>> {
        let store = host_object(STORE_GLOBAL)?;
        let value = call_async(&store, "getMap", &[JsValue::from_str(map_id.as_str())]).await?;
        decode_optional(&value)
    }

    async fn list_maps_by_owner(&self, owner_uid: &str) -> StoreResult<Vec<MapRecord>> {
        let store = host_object(STORE_GLOBAL)?;
        let value =
            call_async(&store, "listMapsByOwner", &[JsValue::from_str(owner_uid)]).await?;
        decode_value(&value)
    }

    async fn create_map(&self, input: &CreateMapInput) -> StoreResult<MapId> {
        let store = host_object(STORE_GLOBAL)?;
        let value = call_async(&store, "createMap", &[encode_arg(input)?]).await?;
        decode_id(&value).map(MapId::new)
    }

    async fn adjust_pin_count(&self, map_id: &MapId, delta: i64) -> StoreResult<()> {
        let store = host_object(STORE_GLOBAL)?;
        call_async(
            &store,
            "adjustPinCount",
            &[
                JsValue::from_str(map_id.as_str()),
                JsValue::from_f64(delta as f64),
            ],
        )
        .await?;
        Ok(())
    }

    async fn create_pin(&self, input: &CreatePinInput) -> StoreResult<PinId> {
        let store = host_object(STORE_GLOBAL)?;
        let value = call_async(&store, "createPin", &[encode_arg(input)?]).await?;
        decode_id(&value).map(PinId::new)
    }

    fn subscribe_pins(
        &self,
        map_id: &MapId,
        on_data: PinsCallback,
        on_error: PinsErrorCallback,
    ) -> PinSubscription {
        let store = match host_object(STORE_GLOBAL) {
            Ok(store) => store,
            Err(error) => {
                on_error(error);
                return PinSubscription::new(|| {});
            }
        };

        let error_for_data = Rc::clone(&on_error);
        let data_closure = Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |value: JsValue| {
            match decode_value::<Vec<PinRecord>>(&value) {
                Ok(pins) => on_data(pins),
                Err(error) => error_for_data(error),
            }
        }));
        let error_closure = Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |value: JsValue| {
            on_error(js_err(value));
        }));

        let result = call_sync(
            &store,
            "subscribePins",
            &[
                JsValue::from_str(map_id.as_str()),
                data_closure.as_ref().clone(),
                error_closure.as_ref().clone(),
            ],
        );
        match result {
            Ok(unsubscribe) => PinSubscription::new(move || {
                if let Some(unsubscribe) = unsubscribe.dyn_ref::<Function>() {
                    let _ = unsubscribe.call0(&JsValue::NULL);
                }
                // The callbacks must outlive the remote listener.
                drop(data_closure);
                drop(error_closure);
            }),
            Err(error) => {
                gloo::console::error!(format!("subscribePins failed: {error}"));
                PinSubscription::new(|| {})
            }
        }
    }

    async fn attach_polaroid_to_pin(
        &self,
        map_id: &MapId,
        pin_id: &PinId,
        polaroid_id: &PolaroidId,
    ) -> StoreResult<()> {
        let store = host_object(STORE_GLOBAL)?;
        call_async(
            &store,
            "attachPolaroidToPin",
            &[
                JsValue::from_str(map_id.as_str()),
                JsValue::from_str(pin_id.as_str()),
                JsValue::from_str(polaroid_id.as_str()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn upload_photo(
        &self,
        owner_uid: &str,
        map_id: &MapId,
        file: &PhotoFile,
    ) -> StoreResult<StoredPhoto> {
        let backing = file
            .as_file()
            .ok_or(StoreError::Invalid("photo has no backing file"))?;
        let store = host_object(STORE_GLOBAL)?;
        let value = call_async(
            &store,
            "uploadPhoto",
            &[
                JsValue::from_str(owner_uid),
                JsValue::from_str(map_id.as_str()),
                backing.clone().into(),
            ],
        )
        .await?;
        decode_value(&value)
    }

    async fn create_polaroid(&self, input: &CreatePolaroidInput) -> StoreResult<PolaroidId> {
        let store = host_object(STORE_GLOBAL)?;
        let value = call_async(&store, "createPolaroid", &[encode_arg(input)?]).await?;
        decode_id(&value).map(PolaroidId::new)
    }

    async fn get_polaroid(
        &self,
        map_id: &MapId,
        polaroid_id: &PolaroidId,
    ) -> StoreResult<Option<PolaroidRecord>> {
        let store = host_object(STORE_GLOBAL)?;
        let value = call_async(
            &store,
            "getPolaroid",
            &[
                JsValue::from_str(map_id.as_str()),
                JsValue::from_str(polaroid_id.as_str()),
            ],
        )
        .await?;
        decode_optional(&value)
    }

    async fn delete_polaroid(
        &self,
        map_id: &MapId,
        pin_id: &PinId,
        polaroid_id: &PolaroidId,
        storage_path: Option<&str>,
    ) -> StoreResult<()> {
        let store = host_object(STORE_GLOBAL)?;
        let path = match storage_path {
            Some(path) => JsValue::from_str(path),
            None => JsValue::NULL,
        };
        call_async(
            &store,
            "deletePolaroid",
            &[
                JsValue::from_str(map_id.as_str()),
                JsValue::from_str(pin_id.as_str()),
                JsValue::from_str(polaroid_id.as_str()),
                path,
            ],
        )
        .await?;
        Ok(())
    }
}

/// `MapCamera` over the host page's map object. Camera calls never fail the
/// machines; a broken bridge degrades to warnings and neutral values.
pub(crate) struct BridgeCamera;

impl BridgeCamera {
    pub(crate) fn new() -> Self {
        Self
    }

    fn map_object(&self) -> Option<JsValue> {
        match host_object(MAP_GLOBAL) {
            Ok(value) => Some(value),
            Err(error) => {
                gloo::console::warn!(format!("map bridge missing: {error}"));
                None
            }
        }
    }
}

impl MapCamera for BridgeCamera {
    fn unproject(&self, point: ScreenPoint) -> GeoLocation {
        let Some(map) = self.map_object() else {
            return GeoLocation::new(0.0, 0.0);
        };
        let result = call_sync(
            &map,
            "unproject",
            &[JsValue::from_f64(point.x), JsValue::from_f64(point.y)],
        )
        .and_then(|value| decode_value::<GeoLocation>(&value));
        match result {
            Ok(location) => location,
            Err(error) => {
                gloo::console::warn!(format!("unproject failed: {error}"));
                GeoLocation::new(0.0, 0.0)
            }
        }
    }

    fn pan_by(&self, dx: f64, dy: f64) {
        let Some(map) = self.map_object() else {
            return;
        };
        if let Err(error) = call_sync(
            &map,
            "panBy",
            &[JsValue::from_f64(dx), JsValue::from_f64(dy)],
        ) {
            gloo::console::warn!(format!("panBy failed: {error}"));
        }
    }

    fn ease_to(&self, request: EaseRequest) {
        let Some(map) = self.map_object() else {
            return;
        };
        let encoded = match encode_arg(&request) {
            Ok(encoded) => encoded,
            Err(error) => {
                gloo::console::warn!(format!("easeTo encode failed: {error}"));
                return;
            }
        };
        if let Err(error) = call_sync(&map, "easeTo", &[encoded]) {
            gloo::console::warn!(format!("easeTo failed: {error}"));
        }
    }

    fn pose(&self) -> CameraPose {
        let fallback = CameraPose {
            center: GeoLocation::new(0.0, 0.0),
            zoom: 0.0,
            bearing: 0.0,
            pitch: 0.0,
        };
        let Some(map) = self.map_object() else {
            return fallback;
        };
        call_sync(&map, "getPose", &[])
            .and_then(|value| decode_value(&value))
            .unwrap_or_else(|error| {
                gloo::console::warn!(format!("getPose failed: {error}"));
                fallback
            })
    }

    fn bounds(&self) -> BoundingBox {
        let fallback = BoundingBox {
            north: 0.0,
            south: 0.0,
            east: 0.0,
            west: 0.0,
        };
        let Some(map) = self.map_object() else {
            return fallback;
        };
        call_sync(&map, "getBounds", &[])
            .and_then(|value| decode_value(&value))
            .unwrap_or_else(|error| {
                gloo::console::warn!(format!("getBounds failed: {error}"));
                fallback
            })
    }

    fn viewport_size(&self) -> (f64, f64) {
        let Some(window) = web_sys::window() else {
            return (0.0, 0.0);
        };
        let width = window
            .inner_width()
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0);
        let height = window
            .inner_height()
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0);
        (width, height)
    }

    fn on_click(&self, handler: Rc<dyn Fn()>) -> ClickSubscription {
        let Some(map) = self.map_object() else {
            return ClickSubscription::new(|| {});
        };
        let closure = Closure::<dyn FnMut()>::wrap(Box::new(move || handler()));
        let result = call_sync(&map, "onClick", &[closure.as_ref().clone()]);
        match result {
            Ok(unsubscribe) => ClickSubscription::new(move || {
                if let Some(unsubscribe) = unsubscribe.dyn_ref::<Function>() {
                    let _ = unsubscribe.call0(&JsValue::NULL);
                }
                drop(closure);
            }),
            Err(error) => {
                gloo::console::warn!(format!("onClick failed: {error}"));
                ClickSubscription::new(|| {})
            }
        }
    }
}
