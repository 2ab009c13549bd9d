use std::fmt;
use std::rc::Rc;

use machipin_core::{
    CreateMapInput, CreatePinInput, CreatePolaroidInput, GeoLocation, MapId, MapRecord, PinId,
    PinRecord, PolaroidId, PolaroidKind, PolaroidRecord,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum StoreError {
    /// The underlying document/blob store reported a failure.
    Backend(String),
    /// A document crossed the bridge in a shape we could not decode.
    Decode(String),
    /// The request was rejected before any I/O was attempted.
    Invalid(&'static str),
    /// No store implementation is reachable in this environment.
    Unavailable(&'static str),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Backend(message) => write!(f, "store error: {message}"),
            StoreError::Decode(message) => write!(f, "decode error: {message}"),
            StoreError::Invalid(reason) => write!(f, "invalid request: {reason}"),
            StoreError::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

pub(crate) type StoreResult<T> = Result<T, StoreError>;

/// Download URL and storage path of an uploaded photo blob. The path is kept
/// on the polaroid so the blob can be deleted with the card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredPhoto {
    pub(crate) url: String,
    pub(crate) path: String,
}

/// A photo picked in the creator form. Wraps the browser `File` when one is
/// present; test stores only need the name.
#[derive(Clone, Debug)]
pub(crate) struct PhotoFile {
    name: String,
    inner: Option<web_sys::File>,
}

impl PhotoFile {
    pub(crate) fn from_file(file: web_sys::File) -> Self {
        Self {
            name: file.name(),
            inner: Some(file),
        }
    }

    #[allow(dead_code)]
    pub(crate) fn from_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: None,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    #[allow(dead_code)]
    pub(crate) fn as_file(&self) -> Option<&web_sys::File> {
        self.inner.as_ref()
    }
}

pub(crate) type PinsCallback = Rc<dyn Fn(Vec<PinRecord>)>;
pub(crate) type PinsErrorCallback = Rc<dyn Fn(StoreError)>;

/// Live pins subscription handle. The listener stays registered for exactly
/// as long as the handle is alive; dropping it unsubscribes.
pub(crate) struct PinSubscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl PinSubscription {
    pub(crate) fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for PinSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Capability surface over the document store and photo blob store.
///
/// Implemented by the host-page bridge in production and by in-memory fakes
/// in tests. All operations are terminal at the call boundary: no retries,
/// no backoff.
#[allow(async_fn_in_trait)]
pub(crate) trait ScrapbookStore {
    async fn get_map(&self, map_id: &MapId) -> StoreResult<Option<MapRecord>>;

    /// Maps owned by `owner_uid`, newest first.
    async fn list_maps_by_owner(&self, owner_uid: &str) -> StoreResult<Vec<MapRecord>>;

    async fn create_map(&self, input: &CreateMapInput) -> StoreResult<MapId>;

    /// Atomically adds `delta` to the map's pin count and bumps `updatedAt`.
    async fn adjust_pin_count(&self, map_id: &MapId, delta: i64) -> StoreResult<()>;

    async fn create_pin(&self, input: &CreatePinInput) -> StoreResult<PinId>;

    /// Push subscription over the map's pin collection. Every remote change
    /// delivers the full current pin list, not a delta.
    fn subscribe_pins(
        &self,
        map_id: &MapId,
        on_data: PinsCallback,
        on_error: PinsErrorCallback,
    ) -> PinSubscription;

    /// Appends the id to the pin's attachment list unless already present.
    async fn attach_polaroid_to_pin(
        &self,
        map_id: &MapId,
        pin_id: &PinId,
        polaroid_id: &PolaroidId,
    ) -> StoreResult<()>;

    async fn upload_photo(
        &self,
        owner_uid: &str,
        map_id: &MapId,
        file: &PhotoFile,
    ) -> StoreResult<StoredPhoto>;

    async fn create_polaroid(&self, input: &CreatePolaroidInput) -> StoreResult<PolaroidId>;

    async fn get_polaroid(
        &self,
        map_id: &MapId,
        polaroid_id: &PolaroidId,
    ) -> StoreResult<Option<PolaroidRecord>>;

    /// Deletes the card: its blob (a missing blob is not an error), its entry
    /// in the pin's attachment list, and the document itself.
    async fn delete_polaroid(
        &self,
        map_id: &MapId,
        pin_id: &PinId,
        polaroid_id: &PolaroidId,
        storage_path: Option<&str>,
    ) -> StoreResult<()>;

    /// Creates the pin document, then increments the parent map's pin count.
    ///
    /// The two writes are not transactional: if the increment fails after the
    /// pin was created, the pin exists with an understated counter and no
    /// rollback is attempted.
    async fn drop_pin_on_map(&self, input: &CreatePinInput) -> StoreResult<PinId> {
        let pin_id = self.create_pin(input).await?;
        self.adjust_pin_count(&input.map_id, 1).await?;
        Ok(pin_id)
    }

    /// Uploads the photo (when present), creates the polaroid document, and
    /// attaches its id to the pin. Returns the new polaroid id.
    async fn create_polaroid_for_pin(
        &self,
        map_id: &MapId,
        pin_id: &PinId,
        owner_uid: &str,
        photo: Option<&PhotoFile>,
        memo: Option<&str>,
        exif_location: Option<GeoLocation>,
    ) -> StoreResult<PolaroidId> {
        let stored = match photo {
            Some(file) => Some(self.upload_photo(owner_uid, map_id, file).await?),
            None => None,
        };
        let input = CreatePolaroidInput {
            map_id: map_id.clone(),
            owner_uid: owner_uid.to_string(),
            kind: PolaroidKind::Default,
            photo_url: stored.as_ref().map(|photo| photo.url.clone()),
            storage_path: stored.as_ref().map(|photo| photo.path.clone()),
            memo: memo.map(str::to_string),
            exif_location,
        };
        let polaroid_id = self.create_polaroid(&input).await?;
        self.attach_polaroid_to_pin(map_id, pin_id, &polaroid_id)
            .await?;
        Ok(polaroid_id)
    }
}

/// Stand-in store for environments without a host bridge (native builds,
/// pre-boot states). Every operation fails with `Unavailable`.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) struct NullStore;

#[cfg(not(target_arch = "wasm32"))]
impl ScrapbookStore for NullStore {
    async fn get_map(&self, _map_id: &MapId) -> StoreResult<Option<MapRecord>> {
        Err(StoreError::Unavailable("no host bridge"))
    }

    async fn list_maps_by_owner(&self, _owner_uid: &str) -> StoreResult<Vec<MapRecord>> {
        Err(StoreError::Unavailable("no host bridge"))
    }

    async fn create_map(&self, _input: &CreateMapInput) -> StoreResult<MapId> {
        Err(StoreError::Unavailable("no host bridge"))
    }

    async fn adjust_pin_count(&self, _map_id: &MapId, _delta: i64) -> StoreResult<()> {
        Err(StoreError::Unavailable("no host bridge"))
    }

    async fn create_pin(&self, _input: &CreatePinInput) -> StoreResult<PinId> {
        Err(StoreError::Unavailable("no host bridge"))
    }

    fn subscribe_pins(
        &self,
        _map_id: &MapId,
        _on_data: PinsCallback,
        _on_error: PinsErrorCallback,
    ) -> PinSubscription {
        PinSubscription::new(|| {})
    }

    async fn attach_polaroid_to_pin(
        &self,
        _map_id: &MapId,
        _pin_id: &PinId,
        _polaroid_id: &PolaroidId,
    ) -> StoreResult<()> {
        Err(StoreError::Unavailable("no host bridge"))
    }

    async fn upload_photo(
        &self,
        _owner_uid: &str,
        _map_id: &MapId,
        _file: &PhotoFile,
    ) -> StoreResult<StoredPhoto> {
        Err(StoreError::Unavailable("no host bridge"))
    }

    async fn create_polaroid(&self, _input: &CreatePolaroidInput) -> StoreResult<PolaroidId> {
        Err(StoreError::Unavailable("no host bridge"))
    }

    async fn get_polaroid(
        &self,
        _map_id: &MapId,
        _polaroid_id: &PolaroidId,
    ) -> StoreResult<Option<PolaroidRecord>> {
        Err(StoreError::Unavailable("no host bridge"))
    }

    async fn delete_polaroid(
        &self,
        _map_id: &MapId,
        _pin_id: &PinId,
        _polaroid_id: &PolaroidId,
        _storage_path: Option<&str>,
    ) -> StoreResult<()> {
        Err(StoreError::Unavailable("no host bridge"))
    }
}
