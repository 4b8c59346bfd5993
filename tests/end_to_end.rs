//! Area resolution through to marker layers, driven through the public API.

use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use teyvat_map::{
    core::{builder::BASE_TILE_LAYER_ID, config::ResolvedArea},
    prelude::*,
    tiles::source::tile_url,
};

const AREAS: &str = r#"{
    "base": {
        "code": "base",
        "extension": "jpg",
        "size": [12288, 15360],
        "center": [3568, 6286],
        "tilesOffset": [0, 0],
        "settings": { "center": [10, 20], "zoom": -3, "maxZoom": 1 }
    },
    "child": {
        "extends": "base",
        "code": "kid",
        "settings": { "center": [1800, -500] }
    },
    "orphan": {
        "size": [100, 100]
    }
}"#;

fn registry() -> AreaRegistry {
    AreaRegistry::from_json_str(AREAS, "base").unwrap()
}

fn resolved(name: &str) -> ResolvedArea {
    registry().resolve(name).unwrap()
}

/// Counts searches; answers every item id with one record
#[derive(Default)]
struct CountingService {
    searches: AtomicUsize,
}

#[async_trait]
impl MarkerService for CountingService {
    async fn search_markers(&self, query: &MarkerQuery) -> Result<Vec<MarkerRecord>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(query
            .item_id_list
            .iter()
            .map(|&id| MarkerRecord {
                id,
                position: Some(format!("{},{}", id, id)),
                ..MarkerRecord::default()
            })
            .collect())
    }

    async fn list_icons(&self) -> Result<IconTable> {
        Ok(IconTable::default())
    }
}

/// Never completes a download; markers stay unloaded
struct NullFetcher;

impl ImageFetcher for NullFetcher {
    fn fetch(&self, _url: String, _done: crossbeam_channel::Sender<teyvat_map::tiles::loader::FetchOutcome>) {}
}

fn controller(service: Arc<CountingService>) -> MarkerLayerController {
    let icons = Arc::new(IconStore::new(Arc::new(NullFetcher), 16));
    let builder = ClusterBuilder::new(icons, Arc::new(DiscMarkerRenderer::default()));
    MarkerLayerController::new(service, builder)
}

#[test]
fn tile_bounds_follow_center_and_offset() {
    let source = TileSourceDescriptor::from_area(&resolved("base"), "https://tiles/");
    assert_eq!(source.bounds.min, WorldPoint::new(-3568.0, -6286.0));
    assert_eq!(source.bounds.max, WorldPoint::new(8720.0, 9074.0));
    assert_eq!(source.min_native_zoom, -3);
    assert_eq!(source.max_native_zoom, 0);
}

#[test]
fn world_and_projection_round_trip() {
    let crs = CoordinateSystem::new([3568.0, 6286.0]);
    assert_eq!(crs.project(&WorldPoint::new(100.0, 200.0)), Point::new(3668.0, 6486.0));

    for x in (-3568..8720).step_by(997) {
        for y in (-6286..9074).step_by(1013) {
            let p = WorldPoint::new(x as f64 + 0.25, y as f64 - 0.5);
            assert_eq!(crs.unproject(&crs.project(&p)), p);
        }
    }
}

#[test]
fn tile_urls_are_deterministic() {
    let a = tile_url("https://tiles/", "twt31", TileCoord::new(3, -2, -1), "png");
    assert_eq!(a, "https://tiles/twt31/12/3_-2.png");
    assert_eq!(a, tile_url("https://tiles/", "twt31", TileCoord::new(3, -2, -1), "png"));
    assert_ne!(a, tile_url("https://tiles/", "twt31", TileCoord::new(3, -2, 0), "png"));
    assert_ne!(a, tile_url("https://tiles/", "twt31", TileCoord::new(3, -2, -1), "jpg"));
}

#[test]
fn inheritance_keeps_base_settings() {
    let child = resolved("child");
    assert_eq!(child.code, "kid");
    assert_eq!(child.extension, "jpg");
    assert_eq!(child.size, [12288.0, 15360.0]);
    assert_eq!(child.settings.center, Some([1800.0, -500.0]));
    assert_eq!(child.settings.zoom, Some(-3.0));
    assert_eq!(child.settings.extra.get("maxZoom"), Some(&serde_json::json!(1)));
}

#[test]
fn unknown_area_falls_back_and_codeless_area_fails() {
    assert_eq!(resolved("nowhere").code, "base");
    assert!(registry().resolve("orphan").is_none());

    let factory = MapFactory::new(registry());
    assert!(matches!(
        factory.create_map("orphan", MapOptions::default()),
        Err(MapError::AreaNotResolved(_))
    ));
}

#[test]
fn factory_sets_limits_and_overrides() {
    let factory = MapFactory::new(registry()).with_config(EngineConfig {
        tile_url_prefix: "https://tiles/".into(),
        ..EngineConfig::default()
    });
    let map = factory.create_map("child", MapOptions::default()).unwrap();

    let max = map.viewport().max_bounds().copied().unwrap();
    assert_eq!(max.min, WorldPoint::new(-13568.0, -16286.0));
    assert_eq!(max.max, WorldPoint::new(18720.0, 19074.0));

    assert_eq!(map.viewport().center, WorldPoint::new(1800.0, -500.0));
    assert_eq!(map.viewport().zoom, -3.0);
    assert_eq!(map.viewport().max_zoom, 1.0);
    assert_eq!(map.viewport().min_zoom, -4.0);
    assert!(!map.options().zoom_control);

    let tiles = map.get_layer(BASE_TILE_LAYER_ID).unwrap();
    let tiles = tiles.as_any().downcast_ref::<TileLayer>().unwrap();
    assert_eq!(tiles.source().code, "kid");
    assert_eq!(tiles.source().url_prefix, "https://tiles/");
}

#[test]
fn rendering_a_fresh_map_queues_tiles() {
    let map_size = Point::new(800.0, 600.0);
    let mut map = MapFactory::default()
        .create_map(
            "提瓦特-base0",
            MapOptions {
                size: map_size,
                ..MapOptions::default()
            },
        )
        .unwrap();

    let mut ctx = RenderContext::new(800, 600);
    map.render(&mut ctx).unwrap();
    assert!(ctx
        .commands()
        .iter()
        .any(|c| matches!(c, DrawCommand::Tile { .. })));
}

#[tokio::test]
async fn empty_query_builds_empty_layer_without_network() {
    let service = Arc::new(CountingService::default());
    let mut controller = controller(Arc::clone(&service));
    let mut map = MapFactory::default()
        .create_map("提瓦特-base0", MapOptions::default())
        .unwrap();

    controller.apply_icons(IconTable::default(), &mut map).unwrap();
    let outcome = controller
        .refresh(MarkerQuery::default(), &mut map)
        .await
        .unwrap();

    assert_eq!(outcome, RefreshOutcome::Applied { built: true });
    assert_eq!(service.searches.load(Ordering::SeqCst), 0);
    assert_eq!(controller.builds(), 1);

    let layer_id = controller.layer_id().unwrap();
    let layer = map.get_layer(layer_id).unwrap();
    let group = layer.as_any().downcast_ref::<MarkerGroup>().unwrap();
    assert!(group.is_empty());
    assert_eq!(map.list_layers().len(), 2);
}

#[tokio::test]
async fn markers_land_at_their_world_positions() {
    let service = Arc::new(CountingService::default());
    let mut controller = controller(Arc::clone(&service));
    let mut map = MapFactory::default()
        .create_map("金苹果群岛", MapOptions::default())
        .unwrap();

    controller
        .refresh(MarkerQuery::for_items(vec![100, 200]), &mut map)
        .await
        .unwrap();
    assert_eq!(controller.builds(), 0);
    controller.load_icons(&mut map).await.unwrap();
    assert_eq!(controller.builds(), 1);
    assert_eq!(service.searches.load(Ordering::SeqCst), 1);

    let key = MarkerKey::new(controller.layer_id().unwrap(), "200");
    let marker = map.marker(&key).unwrap();
    assert_eq!(marker.position(), WorldPoint::new(200.0, 200.0));
    assert_eq!(
        map.crs().project(&marker.position()),
        Point::new(3768.0, 6486.0)
    );
}
