//! Pointer gestures, popups and the context menu on a live map.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use teyvat_map::{
    prelude::*,
    tiles::loader::FetchOutcome,
    ui::context_menu::{AreaInfo, CreationPanelRequest, MenuState},
};

struct NullFetcher;

impl ImageFetcher for NullFetcher {
    fn fetch(&self, _url: String, _done: crossbeam_channel::Sender<FetchOutcome>) {}
}

const LAYER: &str = "pins";

/// 400x400 map at zoom 0 centred on the origin, pins at (0,0) and (100,0)
fn map() -> Map {
    let crs = CoordinateSystem::new([0.0, 0.0]);
    let mut map = Map::new(
        crs,
        MapOptions {
            center: WorldPoint::new(0.0, 0.0),
            zoom: 0.0,
            size: Point::new(400.0, 400.0),
            ..MapOptions::default()
        },
    );

    let icons = Arc::new(IconStore::new(Arc::new(NullFetcher), 4));
    let mut group = MarkerGroup::new(
        LAYER.to_string(),
        crs,
        icons,
        Arc::new(DiscMarkerRenderer::default()),
    );
    for (id, x) in [("a", 0.0), ("b", 100.0)] {
        let position = WorldPoint::new(x, 0.0);
        let marker = MarkerPrimitive::new(id, position, MarkerOptions::for_record(None, position), &crs)
            .with_popup(format!("pin {id}"), "details");
        group.add_marker(marker).unwrap();
    }
    let silent = MarkerPrimitive::new(
        "silent",
        WorldPoint::new(-100.0, 0.0),
        MarkerOptions::for_record(None, WorldPoint::new(-100.0, 0.0)),
        &crs,
    );
    group.add_marker(silent).unwrap();

    map.add_layer(Box::new(group)).unwrap();
    map.process_events();
    map
}

fn key(id: &str) -> MarkerKey {
    MarkerKey::new(LAYER, id)
}

fn click(map: &mut Map, x: f64, button: MouseButton) {
    map.handle_input(&InputEvent::Click {
        position: Point::new(x, 200.0),
        button,
    })
    .unwrap();
}

fn view_state(rights: bool) -> ViewState {
    ViewState {
        area_code: "twt31".into(),
        areas: vec![AreaInfo {
            code: "twt31".into(),
            name: "Teyvat".into(),
        }],
        has_punctuate_rights: rights,
    }
}

#[test]
fn each_marker_change_redraws_once() {
    let mut map = map();
    let before = map.marker(&key("a")).unwrap().redraw_count();

    map.handle_input(&InputEvent::MouseMove {
        position: Point::new(200.0, 200.0),
    })
    .unwrap();
    click(&mut map, 200.0, MouseButton::Left);

    let a = map.marker(&key("a")).unwrap();
    assert!(a.state().hover);
    assert!(a.state().popper_open);
    assert_eq!(a.redraw_count(), before + 2);
    assert_eq!(map.marker(&key("b")).unwrap().redraw_count(), 0);
}

#[test]
fn marker_without_popup_ignores_clicks() {
    let mut map = map();
    click(&mut map, 100.0, MouseButton::Left);
    let silent = map.marker(&key("silent")).unwrap();
    assert!(!silent.state().popper_open);
    assert_eq!(silent.redraw_count(), 0);
    assert!(map.popup().is_none());
}

#[test]
fn popups_replace_each_other() {
    let mut map = map();
    let closed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&closed);
    map.on("popupclose", move |event| {
        if let MapEvent::PopupClose { popup_id } = event {
            sink.lock().unwrap().push(popup_id.clone());
        }
    });

    click(&mut map, 200.0, MouseButton::Left);
    let first = map.popup().unwrap().id.clone();
    click(&mut map, 300.0, MouseButton::Left);

    assert!(!map.marker(&key("a")).unwrap().state().popper_open);
    assert!(map.marker(&key("b")).unwrap().state().popper_open);
    assert_eq!(map.popup().unwrap().owner, PopupOwner::Marker(key("b")));

    map.process_events();
    assert_eq!(*closed.lock().unwrap(), vec![first]);
}

#[test]
fn active_state_ends_on_any_pointer_up() {
    let mut map = map();
    map.handle_input(&InputEvent::PointerDown {
        position: Point::new(300.0, 200.0),
        button: MouseButton::Left,
    })
    .unwrap();
    assert!(map.marker(&key("b")).unwrap().state().active);

    map.handle_input(&InputEvent::PointerUp {
        position: Point::new(5.0, 5.0),
    })
    .unwrap();
    assert!(!map.marker(&key("b")).unwrap().state().active);
    assert_eq!(map.pressed_markers(), 0);

    // a second release has nothing left to notify
    let before = map.marker(&key("b")).unwrap().redraw_count();
    map.handle_input(&InputEvent::PointerUp {
        position: Point::new(5.0, 5.0),
    })
    .unwrap();
    assert_eq!(map.marker(&key("b")).unwrap().redraw_count(), before);
}

#[test]
fn right_click_opens_single_context_menu() {
    let mut map = map();
    let mut menu = InteractionController::new();

    click(&mut map, 250.0, MouseButton::Right);
    let world = match map.process_events().as_slice() {
        [MapEvent::ContextMenu { world, .. }] => *world,
        other => panic!("unexpected events {other:?}"),
    };
    assert_eq!(world, WorldPoint::new(50.0, 0.0));

    let first = menu.open_context_menu(&mut map, world, &view_state(true));
    let second = menu.open_context_menu(&mut map, WorldPoint::new(1.0, 1.0), &view_state(true));
    assert_ne!(first, second);
    assert!(map.popups().is_open(&second));
    assert!(matches!(
        menu.state(),
        MenuState::Open { position, .. } if *position == WorldPoint::new(1.0, 1.0)
    ));

    let popup = map.popup().unwrap();
    assert_eq!(popup.options.offset, Point::new(112.0, 226.0));
    assert_eq!(popup.options.container_size, Some((172.0, 172.0)));
}

#[test]
fn add_command_opens_creation_panel() {
    let mut map = map();
    let mut menu = InteractionController::new();
    menu.open_context_menu(&mut map, WorldPoint::new(12.345, -6.0), &view_state(true));

    let command = menu.dispatch(&mut map, "add");
    assert_eq!(
        command,
        Some(DomainCommand::OpenCreationPanel(CreationPanelRequest {
            title: "New marker: Teyvat - (12.35, -6)".into(),
            position: WorldPoint::new(12.345, -6.0),
            area: Some(AreaInfo {
                code: "twt31".into(),
                name: "Teyvat".into(),
            }),
            has_punctuate_rights: true,
        }))
    );
    assert!(!menu.is_open());
    assert!(map.popup().is_none());
}

#[test]
fn add_without_rights_hands_flag_to_panel() {
    let mut map = map();
    let mut menu = InteractionController::new();
    menu.open_context_menu(&mut map, WorldPoint::new(3.0, 4.0), &view_state(false));

    match menu.dispatch(&mut map, "add") {
        Some(DomainCommand::OpenCreationPanel(request)) => {
            assert!(!request.has_punctuate_rights);
            assert_eq!(request.title, "New marker: Teyvat - (3, 4)");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!menu.is_open());
    assert!(map.popup().is_none());
}

#[test]
fn unknown_and_closed_commands_are_ignored() {
    let mut map = map();
    let mut menu = InteractionController::new();
    menu.open_context_menu(&mut map, WorldPoint::new(0.0, 0.0), &view_state(false));

    assert_eq!(menu.dispatch(&mut map, "teleport"), None);
    assert!(menu.is_open());

    assert_eq!(menu.dispatch(&mut map, "refresh"), Some(DomainCommand::RefreshMarkers));
    assert!(!menu.is_open());
    assert_eq!(menu.dispatch(&mut map, "setting"), None);
}

#[test]
fn idle_map_stops_requesting_frames() {
    let mut map = map();
    let mut ctx = RenderContext::new(400, 400);
    let mut frame = |map: &mut Map| {
        map.render(&mut ctx).unwrap();
        map.update().unwrap()
    };

    assert!(!frame(&mut map));
    assert!(!frame(&mut map));

    map.handle_input(&InputEvent::MouseMove {
        position: Point::new(200.0, 200.0),
    })
    .unwrap();
    assert!(frame(&mut map));
    assert!(!frame(&mut map));
}

#[test]
fn marker_popup_supersedes_menu() {
    let mut map = map();
    let mut menu = InteractionController::new();
    menu.open_context_menu(&mut map, WorldPoint::new(0.0, 0.0), &view_state(true));

    click(&mut map, 300.0, MouseButton::Left);
    menu.sync_with(&map);
    assert!(!menu.is_open());

    // closing the stale menu leaves the marker popup alone
    menu.close(&mut map);
    assert_eq!(map.popup().unwrap().owner, PopupOwner::Marker(key("b")));
}

#[test]
fn route_leave_closes_everything() {
    let mut map = map();
    let mut menu = InteractionController::new();
    let ran = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&ran);
    menu.on_teardown(Box::new(move |map: &mut Map| {
        *counter.lock().unwrap() += 1;
        assert!(map.popup().is_none());
    }));

    click(&mut map, 200.0, MouseButton::Left);
    menu.on_route_leave(&mut map);

    assert!(map.popup().is_none());
    assert!(!map.marker(&key("a")).unwrap().state().popper_open);
    assert_eq!(*ran.lock().unwrap(), 1);

    menu.on_route_leave(&mut map);
    assert_eq!(*ran.lock().unwrap(), 1);
}

struct FailingService;

#[async_trait]
impl MarkerService for FailingService {
    async fn search_markers(&self, _query: &MarkerQuery) -> Result<Vec<MarkerRecord>> {
        Err(MapError::Service("backend down".into()))
    }

    async fn list_icons(&self) -> Result<IconTable> {
        Ok(IconTable::default())
    }
}

#[derive(Default)]
struct RecordingNotifier(Mutex<Vec<String>>);

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

#[tokio::test]
async fn fetch_failure_clears_layer_and_notifies() {
    let mut map = map();
    let icons = Arc::new(IconStore::new(Arc::new(NullFetcher), 4));
    let builder = ClusterBuilder::new(icons, Arc::new(DiscMarkerRenderer::default()));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut controller = MarkerLayerController::new(Arc::new(FailingService), builder)
        .with_notifier(notifier.clone());

    controller.load_icons(&mut map).await.unwrap();
    let outcome = controller
        .refresh(MarkerQuery::for_items(vec![1]), &mut map)
        .await
        .unwrap();

    assert_eq!(outcome, RefreshOutcome::Failed { built: true });
    assert!(controller.records().is_empty());
    assert!(!controller.is_loading());
    assert_eq!(notifier.0.lock().unwrap().len(), 1);

    let layer = map.get_layer(controller.layer_id().unwrap()).unwrap();
    assert!(layer.as_any().downcast_ref::<MarkerGroup>().unwrap().is_empty());
}
