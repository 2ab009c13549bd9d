use std::cell::Cell;
use std::rc::Rc;

use machipin_core::{drag_offset_y, MapId, PinColor, PinRecord};
use yew::prelude::*;

use crate::inspector::{InspectorSnapshot, ToastKind};
use crate::map_camera::MapCamera;
use crate::map_view::MapViewOrchestrator;
use crate::store::PhotoFile;

#[cfg(target_arch = "wasm32")]
type AppStore = crate::js_bridge::BridgeStore;
#[cfg(not(target_arch = "wasm32"))]
type AppStore = crate::store::NullStore;

type Orchestrator = MapViewOrchestrator<AppStore>;

/// Identity of the mounted view: which map, which user, which input class.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Session {
    pub(crate) map_id: MapId,
    pub(crate) user_uid: String,
    pub(crate) touch_primary: bool,
}

#[cfg(target_arch = "wasm32")]
fn load_session() -> Option<Session> {
    let session = crate::js_bridge::host_session()?;
    Some(Session {
        map_id: session.map_id,
        user_uid: session.user_uid,
        touch_primary: crate::js_bridge::touch_primary(),
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn load_session() -> Option<Session> {
    None
}

fn build_orchestrator(session: &Session) -> Rc<Orchestrator> {
    #[cfg(target_arch = "wasm32")]
    let (store, camera): (Rc<AppStore>, Rc<dyn MapCamera>) = (
        Rc::new(crate::js_bridge::BridgeStore::new()),
        Rc::new(crate::js_bridge::BridgeCamera::new()),
    );
    #[cfg(not(target_arch = "wasm32"))]
    let (store, camera): (Rc<AppStore>, Rc<dyn MapCamera>) = (
        Rc::new(crate::store::NullStore),
        Rc::new(crate::map_camera::NullCamera),
    );
    MapViewOrchestrator::new(
        store,
        camera,
        session.map_id.clone(),
        session.user_uid.clone(),
        session.touch_primary,
    )
}

#[function_component(App)]
pub(crate) fn app() -> Html {
    let session = use_memo((), |_| load_session());
    match session.as_ref() {
        Some(session) => html! { <MapScreen session={session.clone()} /> },
        None => html! {
            <div class="boot-error">{ "Sign in and open a map to start pinning." }</div>
        },
    }
}

#[derive(Properties, PartialEq)]
struct MapScreenProps {
    session: Session,
}

#[function_component(MapScreen)]
fn map_screen(props: &MapScreenProps) -> Html {
    let orchestrator: Rc<Orchestrator> =
        (*use_memo(props.session.clone(), build_orchestrator)).clone();
    let tick = use_state(|| 0u64);

    {
        let orchestrator = Rc::clone(&orchestrator);
        let tick = tick.clone();
        use_effect_with(props.session.clone(), move |_session| {
            let counter = Rc::new(Cell::new(0u64));
            let bump = {
                let tick = tick.clone();
                let counter = Rc::clone(&counter);
                Rc::new(move || {
                    counter.set(counter.get() + 1);
                    tick.set(counter.get());
                })
            };
            let view_sub = orchestrator.subscribe(bump.clone());
            let inspector_sub = orchestrator.inspector().subscribe(bump.clone());
            let placement_sub = orchestrator.placement().subscribe(bump);
            orchestrator.attach();

            move || {
                drop(view_sub);
                drop(inspector_sub);
                drop(placement_sub);
                orchestrator.detach();
            }
        });
    }

    let view = orchestrator.snapshot();
    if view.is_loading {
        return html! { <div class="screen-loading">{ "Loading your map..." }</div> };
    }
    if let Some(error) = view.load_error {
        return html! { <div class="screen-error">{ error }</div> };
    }

    let drag = orchestrator.placement().snapshot();
    let inspector = orchestrator.inspector().snapshot();
    let touch_primary = props.session.touch_primary;

    let header = view.map.as_ref().map(|map| {
        html! {
            <header class="map-header">
                <h1>{ &map.name }</h1>
                <span class="pin-count">{ format!("{} pins", map.pin_count) }</span>
            </header>
        }
    });

    let markers = view
        .pins
        .iter()
        .map(|pin| marker(&orchestrator, pin, view.selected_pin.as_ref()))
        .collect::<Html>();

    let toolbar = PinColor::ALL
        .iter()
        .map(|color| swatch(&orchestrator, *color, drag.dragging))
        .collect::<Html>();

    let overlay = drag.dragging.then(|| {
        let color = drag.color.map(|color| color.as_str()).unwrap_or_default();
        let style = format!(
            "left:{}px;top:{}px;",
            drag.pointer.x,
            drag.pointer.y - drag_offset_y(touch_primary)
        );
        html! { <div class={classes!("drag-overlay", color)} {style} /> }
    });

    let panel = view
        .selected_pin
        .is_some()
        .then(|| inspector_panel(&orchestrator, &inspector));

    html! {
        <div class="map-screen">
            { for header }
            <div class="pin-markers">{ markers }</div>
            <div class="pin-toolbar">{ toolbar }</div>
            { for overlay }
            { for panel }
            { toast_view(&inspector) }
        </div>
    }
}

fn marker(
    orchestrator: &Rc<Orchestrator>,
    pin: &PinRecord,
    selected: Option<&PinRecord>,
) -> Html {
    let is_selected = selected.is_some_and(|candidate| candidate.id == pin.id);
    let onclick = {
        let orchestrator = Rc::clone(orchestrator);
        let pin = pin.clone();
        Callback::from(move |event: MouseEvent| {
            event.stop_propagation();
            orchestrator.select_pin(pin.clone());
        })
    };
    html! {
        <button
            key={pin.id.to_string()}
            class={classes!("pin-marker", pin.style.color.as_str(), is_selected.then_some("selected"))}
            {onclick}
        />
    }
}

fn swatch(orchestrator: &Rc<Orchestrator>, color: PinColor, dragging: bool) -> Html {
    let onpointerdown = {
        let placement = orchestrator.placement();
        Callback::from(move |event: PointerEvent| {
            placement.begin_drag(color, event.client_x() as f64, event.client_y() as f64);
        })
    };
    html! {
        <button
            class={classes!("pin-swatch", color.as_str(), dragging.then_some("dragging"))}
            {onpointerdown}
        />
    }
}

fn inspector_panel(orchestrator: &Rc<Orchestrator>, inspector: &InspectorSnapshot) -> Html {
    if inspector.is_loading {
        return html! { <aside class="pin-inspector loading">{ "Loading..." }</aside> };
    }

    let card = inspector.active_polaroid.as_ref().map(|polaroid| {
        let photo = polaroid.photo_url.as_ref().map(|url| {
            html! { <img class="polaroid-photo" src={url.clone()} /> }
        });
        let memo = polaroid.memo.as_ref().map(|memo| {
            html! { <p class="polaroid-memo">{ memo }</p> }
        });
        let on_delete = {
            let machine = orchestrator.inspector();
            Callback::from(move |_event: MouseEvent| {
                wasm_bindgen_futures::spawn_local(Rc::clone(&machine).delete_polaroid());
            })
        };
        html! {
            <div class="polaroid-card">
                { for photo }
                { for memo }
                <button class="polaroid-delete" onclick={on_delete}>{ "Delete" }</button>
            </div>
        }
    });

    let creator = if inspector.creator_open {
        Some(html! { <PolaroidCreator orchestrator={OrchestratorHandle(Rc::clone(orchestrator))} /> })
    } else if inspector.creator_peeking {
        let on_open = {
            let machine = orchestrator.inspector();
            Callback::from(move |_event: MouseEvent| machine.open_creator())
        };
        Some(html! {
            <button class="creator-peek" onclick={on_open}>{ "Pin a memory here" }</button>
        })
    } else {
        None
    };

    html! {
        <aside class="pin-inspector">
            { for card }
            { for creator }
        </aside>
    }
}

fn toast_view(inspector: &InspectorSnapshot) -> Html {
    let Some(toast) = inspector.toast.as_ref() else {
        return Html::default();
    };
    let kind = match toast.kind {
        ToastKind::Success => "success",
        ToastKind::Error => "error",
    };
    html! { <div class={classes!("toast", kind)}>{ &toast.message }</div> }
}


/// `Rc` wrapper comparing by identity so orchestrator handles can travel
/// through component props.
#[derive(Clone)]
struct OrchestratorHandle(Rc<Orchestrator>);

impl PartialEq for OrchestratorHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Properties, PartialEq)]
struct PolaroidCreatorProps {
    orchestrator: OrchestratorHandle,
}

#[function_component(PolaroidCreator)]
fn polaroid_creator(props: &PolaroidCreatorProps) -> Html {
    let machine = props.orchestrator.0.inspector();
    let memo = use_state(String::new);
    let photo = use_state(|| None::<PhotoFile>);

    let on_memo = {
        let memo = memo.clone();
        Callback::from(move |event: InputEvent| {
            if let Some(input) = event.target_dyn_into::<web_sys::HtmlTextAreaElement>() {
                memo.set(input.value());
            }
        })
    };

    let on_photo = {
        let photo = photo.clone();
        Callback::from(move |event: Event| {
            let Some(input) = event.target_dyn_into::<web_sys::HtmlInputElement>() else {
                return;
            };
            let file = input.files().and_then(|files| files.get(0));
            photo.set(file.map(PhotoFile::from_file));
        })
    };

    let on_save = {
        let machine = Rc::clone(&machine);
        let memo = memo.clone();
        let photo = photo.clone();
        Callback::from(move |_event: MouseEvent| {
            let machine = Rc::clone(&machine);
            let memo_value = (*memo).clone();
            let photo_value = (*photo).clone();
            wasm_bindgen_futures::spawn_local(machine.save_polaroid(photo_value, memo_value));
        })
    };

    let on_close = {
        let machine = Rc::clone(&machine);
        Callback::from(move |_event: MouseEvent| machine.close_creator())
    };

    html! {
        <div class="polaroid-creator">
            <input type="file" accept="image/*" onchange={on_photo} />
            <textarea
                placeholder="Write the memory down..."
                value={(*memo).clone()}
                oninput={on_memo}
            />
            <button class="creator-save" onclick={on_save}>{ "Save" }</button>
            <button class="creator-close" onclick={on_close}>{ "Close" }</button>
        </div>
    }
}
