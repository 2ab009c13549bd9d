use machipin_core::{style_by_key, BoundingBox, CreateMapInput, GeoLocation, MapId, MapRecord};

use crate::map_camera::MapCamera;
use crate::store::{ScrapbookStore, StoreError, StoreResult};

/// Everything the "cut this area" flow collects before the map document is
/// created: a name, a base style, the drawn box, and the camera at cut time.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CutMapDraft {
    pub(crate) name: String,
    pub(crate) style_key: String,
    pub(crate) bounding_box: BoundingBox,
    pub(crate) center: GeoLocation,
    pub(crate) zoom: f64,
}

/// Snapshot of the camera at cut time: the visible box becomes the map's
/// bounding box, the pose seeds its initial center and zoom.
pub(crate) fn draft_from_camera(camera: &dyn MapCamera, name: &str, style_key: &str) -> CutMapDraft {
    let pose = camera.pose();
    CutMapDraft {
        name: name.to_string(),
        style_key: style_key.to_string(),
        bounding_box: camera.bounds(),
        center: pose.center,
        zoom: pose.zoom,
    }
}

pub(crate) fn build_map_input(draft: &CutMapDraft, owner_uid: &str) -> StoreResult<CreateMapInput> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(StoreError::Invalid("map name is blank"));
    }
    let style =
        style_by_key(&draft.style_key).ok_or(StoreError::Invalid("unknown map style key"))?;
    Ok(CreateMapInput {
        name: name.to_string(),
        owner_uid: owner_uid.to_string(),
        style_key: style.key.to_string(),
        style_url: style.url.to_string(),
        bounding_box: draft.bounding_box,
        center: draft.center,
        zoom: draft.zoom,
    })
}

/// Maps owned by the signed-in user, newest first.
pub(crate) async fn load_maps<S: ScrapbookStore>(
    store: &S,
    owner_uid: &str,
) -> StoreResult<Vec<MapRecord>> {
    store.list_maps_by_owner(owner_uid).await
}

/// Creates the map document for a completed cut flow.
pub(crate) async fn cut_map<S: ScrapbookStore>(
    store: &S,
    owner_uid: &str,
    draft: &CutMapDraft,
) -> StoreResult<MapId> {
    let input = build_map_input(draft, owner_uid)?;
    store.create_map(&input).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeStore;
    use machipin_core::DEFAULT_MAP_STYLE_KEY;

    fn draft() -> CutMapDraft {
        CutMapDraft {
            name: "Kyoto trip".to_string(),
            style_key: DEFAULT_MAP_STYLE_KEY.to_string(),
            bounding_box: BoundingBox {
                north: 35.1,
                south: 34.9,
                east: 135.8,
                west: 135.6,
            },
            center: GeoLocation::new(35.0, 135.7),
            zoom: 13.0,
        }
    }

    #[test]
    fn build_input_resolves_the_style_url() {
        let input = build_map_input(&draft(), "user-1").unwrap();
        assert_eq!(input.style_key, DEFAULT_MAP_STYLE_KEY);
        assert!(input.style_url.starts_with("https://"));
        assert_eq!(input.owner_uid, "user-1");
    }

    #[test]
    fn blank_names_and_unknown_styles_are_rejected() {
        let mut blank = draft();
        blank.name = "   ".to_string();
        assert_eq!(
            build_map_input(&blank, "user-1"),
            Err(StoreError::Invalid("map name is blank"))
        );

        let mut unknown = draft();
        unknown.style_key = "sepia".to_string();
        assert_eq!(
            build_map_input(&unknown, "user-1"),
            Err(StoreError::Invalid("unknown map style key"))
        );
    }

    #[test]
    fn draft_from_camera_captures_the_visible_box() {
        let camera = crate::test_support::FakeCamera::new();
        let draft = draft_from_camera(&camera, "Harbor walk", DEFAULT_MAP_STYLE_KEY);
        assert_eq!(draft.bounding_box, camera.bounds());
        assert_eq!(draft.center, camera.initial_pose().center);
        assert_eq!(draft.zoom, camera.initial_pose().zoom);
    }

    #[tokio::test]
    async fn cut_map_creates_a_document_with_zero_pins() {
        let store = FakeStore::new();
        let map_id = cut_map(&store, "user-1", &draft()).await.unwrap();
        let map = store.map(&map_id).unwrap();
        assert_eq!(map.pin_count, 0);
        assert_eq!(map.name, "Kyoto trip");
    }

    #[tokio::test]
    async fn load_maps_returns_newest_first() {
        let store = FakeStore::new();
        for name in ["first", "second", "third"] {
            let mut d = draft();
            d.name = name.to_string();
            cut_map(&store, "user-1", &d).await.unwrap();
        }
        let maps = load_maps(&store, "user-1").await.unwrap();
        let names: Vec<_> = maps.iter().map(|map| map.name.as_str()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);

        assert!(load_maps(&store, "someone-else").await.unwrap().is_empty());
    }
}
