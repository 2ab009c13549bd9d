pub mod attachments;
pub mod catalog;
pub mod document;
pub mod edge_pan;
pub mod placement;

pub use attachments::AttachmentStack;
pub use catalog::{style_by_key, MapStyleEntry, DEFAULT_MAP_STYLE_KEY, MAP_STYLE_CATALOG};
pub use document::{
    draft_has_content, BoundingBox, CameraPose, CreateMapInput, CreatePinInput,
    CreatePolaroidInput, GeoLocation, MapId, MapRecord, PinColor, PinIconType, PinId, PinRecord,
    PinStyle, PolaroidId, PolaroidKind, PolaroidRecord, TimestampMs,
};
pub use edge_pan::{pan_vector, EdgePanConfig, PanVector};
pub use placement::{
    corrected_drop_point, drag_offset_y, ScreenPoint, DRAG_OFFSET_Y_POINTER, DRAG_OFFSET_Y_TOUCH,
};
