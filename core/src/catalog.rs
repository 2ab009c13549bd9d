/// Built-in base map styles offered by the "cut this area" flow.
#[derive(Clone, Copy, Debug)]
pub struct MapStyleEntry {
    pub key: &'static str,
    pub url: &'static str,
    pub label: &'static str,
}

pub const DEFAULT_MAP_STYLE_KEY: &str = "voyager";

pub const MAP_STYLE_CATALOG: &[MapStyleEntry] = &[
    MapStyleEntry {
        key: "voyager",
        url: "https://basemaps.cartocdn.com/gl/voyager-gl-style/style.json",
        label: "Voyager",
    },
    MapStyleEntry {
        key: "positron",
        url: "https://basemaps.cartocdn.com/gl/positron-gl-style/style.json",
        label: "Positron",
    },
    MapStyleEntry {
        key: "dark-matter",
        url: "https://basemaps.cartocdn.com/gl/dark-matter-gl-style/style.json",
        label: "Dark Matter",
    },
];

pub fn style_by_key(key: &str) -> Option<&'static MapStyleEntry> {
    let trimmed = key.trim();
    MAP_STYLE_CATALOG
        .iter()
        .find(|entry| entry.key.eq_ignore_ascii_case(trimmed))
}
