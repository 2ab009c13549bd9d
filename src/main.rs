mod dashboard;
mod edge_scroll;
mod inspector;
#[cfg(target_arch = "wasm32")]
mod js_bridge;
mod map_camera;
mod map_view;
mod notify;
mod placement;
mod store;
#[cfg(test)]
mod test_support;
mod yew_app;

use yew_app::App;

fn main() {
    yew::Renderer::<App>::new().render();
}
