use std::fmt;

use serde::{Deserialize, Serialize};

/// Epoch milliseconds, stamped server-side by the document store.
pub type TimestampMs = i64;

macro_rules! document_id {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

document_id!(MapId);
document_id!(PinId);
document_id!(PolaroidId);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
}

impl GeoLocation {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn center(&self) -> GeoLocation {
        GeoLocation {
            lat: (self.north + self.south) * 0.5,
            lng: (self.east + self.west) * 0.5,
        }
    }
}

/// Full camera description, captured before easing to a selected pin so the
/// previous view can be restored on deselect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub center: GeoLocation,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinColor {
    Red,
    Blue,
    Yellow,
}

impl PinColor {
    pub const ALL: [PinColor; 3] = [PinColor::Red, PinColor::Blue, PinColor::Yellow];

    pub fn as_str(self) -> &'static str {
        match self {
            PinColor::Red => "red",
            PinColor::Blue => "blue",
            PinColor::Yellow => "yellow",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinIconType {
    #[default]
    Standard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinStyle {
    pub color: PinColor,
    pub icon_type: PinIconType,
}

impl PinStyle {
    pub fn colored(color: PinColor) -> Self {
        Self {
            color,
            icon_type: PinIconType::Standard,
        }
    }
}

/// Reserved for future card kinds; every card is `default` today.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolaroidKind {
    #[default]
    Default,
}

/// A named, bounded geographic canvas owned by a single user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRecord {
    pub id: MapId,
    pub name: String,
    pub owner_uid: String,
    pub style_key: String,
    pub style_url: String,
    pub bounding_box: BoundingBox,
    pub center: GeoLocation,
    pub zoom: f64,
    pub pin_count: u32,
    pub created_at: TimestampMs,
    pub updated_at: TimestampMs,
}

/// A point anchor on a map. `attached_polaroid_ids` is the single source of
/// truth for which card is active: insertion order is stack order, last is
/// topmost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRecord {
    pub id: PinId,
    pub map_id: MapId,
    pub owner_uid: String,
    pub location: GeoLocation,
    pub style: PinStyle,
    #[serde(default)]
    pub attached_polaroid_ids: crate::attachments::AttachmentStack,
    pub created_at: TimestampMs,
    pub updated_at: TimestampMs,
}

/// A photo + memo card. Referenced (not embedded) by pins through
/// `attached_polaroid_ids`; lives in its map's polaroid subcollection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolaroidRecord {
    pub id: PolaroidId,
    pub map_id: MapId,
    pub owner_uid: String,
    #[serde(rename = "type", default)]
    pub kind: PolaroidKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Capture location from the photo's Exif data, when present. May differ
    /// from the pin location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif_location: Option<GeoLocation>,
    pub created_at: TimestampMs,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMapInput {
    pub name: String,
    pub owner_uid: String,
    pub style_key: String,
    pub style_url: String,
    pub bounding_box: BoundingBox,
    pub center: GeoLocation,
    pub zoom: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePinInput {
    pub map_id: MapId,
    pub owner_uid: String,
    pub location: GeoLocation,
    pub style: PinStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolaroidInput {
    pub map_id: MapId,
    pub owner_uid: String,
    #[serde(rename = "type", default)]
    pub kind: PolaroidKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif_location: Option<GeoLocation>,
}

/// A card draft is saveable only with a photo or a non-blank memo.
pub fn draft_has_content(has_photo: bool, memo: &str) -> bool {
    has_photo || !memo.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_requires_photo_or_memo() {
        assert!(!draft_has_content(false, ""));
        assert!(!draft_has_content(false, "   "));
        assert!(draft_has_content(true, ""));
        assert!(draft_has_content(false, "a memo"));
    }

    #[test]
    fn bounding_box_center_is_midpoint() {
        let bbox = BoundingBox {
            north: 36.0,
            south: 34.0,
            east: 140.0,
            west: 138.0,
        };
        assert_eq!(bbox.center(), GeoLocation::new(35.0, 139.0));
    }

    #[test]
    fn pin_color_round_trips_lowercase() {
        for color in PinColor::ALL {
            assert_eq!(
                serde_json::to_string(&color).unwrap(),
                format!("\"{}\"", color.as_str())
            );
        }
    }
}
