use crate::{
    core::{
        crs::CoordinateSystem,
        geo::{Point, WorldBounds},
        viewport::Viewport,
    },
    layers::{
        base::{LayerProperties, LayerTrait, LayerType},
        marker::MarkerPrimitive,
    },
    prelude::HashMap,
    rendering::{context::RenderContext, marker::MarkerRenderer},
    spatial::{
        clustering::{Clustering, ClusteringConfig},
        index::SpatialItem,
    },
    tiles::cache::IconStore,
    MapError, Result,
};
use std::sync::Arc;

/// Screen margin kept around the view so half-visible markers still draw
const CULL_MARGIN_PX: f64 = 64.0;

/// A layer owning a set of canvas markers that share one icon store and
/// one renderer, optionally aggregated into clusters at low zoom.
pub struct MarkerGroup {
    properties: LayerProperties,
    crs: CoordinateSystem,
    markers: Vec<MarkerPrimitive>,
    index: HashMap<String, usize>,
    icons: Arc<IconStore>,
    renderer: Arc<dyn MarkerRenderer>,
    clustering: Option<Clustering<usize>>,
    /// Markers shown individually in the last clustered frame
    visible: Option<Vec<usize>>,
}

impl MarkerGroup {
    pub fn new(
        id: String,
        crs: CoordinateSystem,
        icons: Arc<IconStore>,
        renderer: Arc<dyn MarkerRenderer>,
    ) -> Self {
        Self {
            properties: LayerProperties::new(id, "Markers".to_string(), LayerType::Marker),
            crs,
            markers: Vec::new(),
            index: HashMap::default(),
            icons,
            renderer,
            clustering: None,
            visible: None,
        }
    }

    /// Turns clustering on, indexing every marker added so far
    pub fn with_clustering(mut self, config: ClusteringConfig) -> Self {
        let items = self
            .markers
            .iter()
            .enumerate()
            .map(|(i, m)| SpatialItem::from_world(m.id().to_string(), &self.crs, &m.position(), i))
            .collect();
        self.clustering = Some(Clustering::with_items(config, items));
        self
    }

    pub fn add_marker(&mut self, marker: MarkerPrimitive) -> Result<()> {
        if self.index.contains_key(marker.id()) {
            return Err(MapError::Layer(format!(
                "duplicate marker {:?} in {}",
                marker.id(),
                self.properties.id
            )));
        }

        let slot = self.markers.len();
        if let Some(clustering) = self.clustering.as_mut() {
            clustering.add_item(SpatialItem::from_world(
                marker.id().to_string(),
                &self.crs,
                &marker.position(),
                slot,
            ))?;
        }
        self.index.insert(marker.id().to_string(), slot);
        self.markers.push(marker);
        Ok(())
    }

    pub fn markers(&self) -> &[MarkerPrimitive] {
        &self.markers
    }

    pub fn marker(&self, id: &str) -> Option<&MarkerPrimitive> {
        self.index.get(id).map(|&i| &self.markers[i])
    }

    pub fn marker_mut(&mut self, id: &str) -> Option<&mut MarkerPrimitive> {
        let i = *self.index.get(id)?;
        self.markers.get_mut(i)
    }

    pub fn icons(&self) -> &Arc<IconStore> {
        &self.icons
    }

    pub fn is_clustered(&self) -> bool {
        self.clustering.is_some()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Top-most marker under a screen point
    pub fn marker_at(&self, screen: Point, viewport: &Viewport) -> Option<&str> {
        let hit = |i: usize| {
            let marker = &self.markers[i];
            let anchor = viewport.world_to_screen(&marker.position());
            marker.contains_screen_point(anchor, screen)
        };

        let found = match &self.visible {
            Some(visible) => visible.iter().rev().copied().find(|&i| hit(i)),
            None => (0..self.markers.len()).rev().find(|&i| hit(i)),
        };
        found.map(|i| self.markers[i].id())
    }

    /// Clears a marker's icon, failed or not, so the next frame fetches it again
    pub fn reset_marker_image(&mut self, id: &str) -> bool {
        let icons = Arc::clone(&self.icons);
        let Some(marker) = self.marker_mut(id) else {
            return false;
        };
        if let Some(url) = marker.icon_url() {
            icons.forget(url);
        }
        marker.reset_image();
        true
    }

    fn draw_marker(&mut self, i: usize, context: &mut RenderContext, viewport: &Viewport) {
        let renderer = Arc::clone(&self.renderer);
        let marker = &mut self.markers[i];
        let screen = viewport.world_to_screen(&marker.position());
        marker.draw(context, renderer.as_ref(), &self.icons, screen);
    }
}

impl LayerTrait for MarkerGroup {
    crate::impl_layer_trait!(MarkerGroup, properties);

    fn bounds(&self) -> Option<WorldBounds> {
        None
    }

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let view = viewport
            .bounds()
            .expanded(CULL_MARGIN_PX / viewport.scale());

        let Some(clustering) = self.clustering.as_mut() else {
            self.visible = None;
            for i in 0..self.markers.len() {
                let position = self.markers[i].position();
                if view.contains(&position) {
                    self.draw_marker(i, context, viewport);
                }
            }
            return Ok(());
        };

        let projected = self.crs.project_bounds(&view, 0.0);
        let clusters = clustering.get_clusters(&projected, viewport.zoom);
        let mut singles = Vec::with_capacity(clusters.len());

        for cluster in clusters {
            if cluster.is_single() {
                let i = cluster.items[0].data;
                singles.push(i);
                self.draw_marker(i, context, viewport);
            } else {
                let center = self.crs.unproject(&cluster.center);
                let screen = viewport.world_to_screen(&center);
                self.renderer.draw_cluster(context, screen, cluster.count());
            }
        }
        self.visible = Some(singles);
        Ok(())
    }

    /// Reports settled icon loads and repaint requests made since the last
    /// call. Culled, clustered and failed markers never hold a request open.
    fn update(&mut self, _viewport: &Viewport) -> Result<bool> {
        let settled = self.icons.poll();
        let mut changed = settled > 0;
        for marker in &mut self.markers {
            changed |= marker.poll_image(&self.icons);
            changed |= marker.take_dirty();
        }
        Ok(changed)
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "markers": self.markers.len(),
            "clustered": self.clustering.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::geo::WorldPoint,
        layers::marker::MarkerOptions,
        rendering::{context::DrawCommand, marker::DiscMarkerRenderer},
        tiles::cache::tests::InstantFetcher,
    };

    fn group(positions: &[(f64, f64)]) -> (MarkerGroup, Viewport) {
        let crs = CoordinateSystem::new([0.0, 0.0]);
        let icons = Arc::new(IconStore::new(Arc::new(InstantFetcher::default()), 16));
        let mut group = MarkerGroup::new(
            "markers".into(),
            crs,
            icons,
            Arc::new(DiscMarkerRenderer::default()),
        );
        for (i, (x, y)) in positions.iter().enumerate() {
            let pos = WorldPoint::new(*x, *y);
            let url = Some(format!("https://icons/{i}.png"));
            group
                .add_marker(MarkerPrimitive::new(
                    format!("m{i}"),
                    pos,
                    MarkerOptions::for_record(url, pos),
                    &crs,
                ))
                .unwrap();
        }
        let viewport = Viewport::new(crs, WorldPoint::new(0.0, 0.0), 0.0, Point::new(400.0, 400.0));
        (group, viewport)
    }

    fn images(ctx: &RenderContext) -> usize {
        ctx.commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Image { .. }))
            .count()
    }

    #[test]
    fn test_icons_load_then_markers_draw() {
        let (mut group, viewport) = group(&[(0.0, 0.0), (50.0, 0.0)]);
        let mut ctx = RenderContext::new(400, 400);

        group.render(&mut ctx, &viewport).unwrap();
        assert_eq!(images(&ctx), 0);

        assert!(group.update(&viewport).unwrap());
        ctx.begin_frame();
        group.render(&mut ctx, &viewport).unwrap();
        assert_eq!(images(&ctx), 2);
    }

    fn idle_frames(group: &mut MarkerGroup, viewport: &Viewport, frames: usize) -> Vec<bool> {
        let mut ctx = RenderContext::new(400, 400);
        (0..frames)
            .map(|_| {
                ctx.begin_frame();
                group.render(&mut ctx, viewport).unwrap();
                group.update(viewport).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_idle_group_stops_requesting_frames() {
        let (mut group, viewport) = group(&[(0.0, 0.0), (5000.0, 5000.0)]);
        assert_eq!(idle_frames(&mut group, &viewport, 5), [true, false, false, false, false]);
        assert!(group.marker("m0").unwrap().state().finished());

        group.marker_mut("m1").unwrap().on_mouse_over();
        assert_eq!(idle_frames(&mut group, &viewport, 3), [true, false, false]);
    }

    #[test]
    fn test_failed_and_clustered_markers_settle() {
        let crs = CoordinateSystem::new([0.0, 0.0]);
        let (group, viewport) = group(&[(0.0, 0.0), (5.0, 5.0)]);
        let mut group = group.with_clustering(ClusteringConfig::default());
        let pos = WorldPoint::new(150.0, 150.0);
        group
            .add_marker(MarkerPrimitive::new(
                "broken",
                pos,
                MarkerOptions::for_record(Some("https://icons/missing.png".into()), pos),
                &crs,
            ))
            .unwrap();

        assert_eq!(idle_frames(&mut group, &viewport, 4), [true, false, false, false]);
        assert_eq!(
            group.marker("broken").unwrap().state().image,
            crate::layers::marker::ImageSlot::Errored
        );
    }

    #[test]
    fn test_offscreen_markers_are_culled() {
        let (mut group, viewport) = group(&[(0.0, 0.0), (5000.0, 5000.0)]);
        let mut ctx = RenderContext::new(400, 400);
        group.render(&mut ctx, &viewport).unwrap();
        group.update(&viewport).unwrap();
        assert_eq!(group.icons().len(), 1);
    }

    #[test]
    fn test_duplicate_marker_rejected() {
        let (mut group, _) = group(&[(0.0, 0.0)]);
        let crs = CoordinateSystem::new([0.0, 0.0]);
        let dup = MarkerPrimitive::new("m0", WorldPoint::new(1.0, 1.0), MarkerOptions::default(), &crs);
        assert!(group.add_marker(dup).is_err());
    }

    #[test]
    fn test_marker_at_prefers_top_most() {
        let (group, viewport) = group(&[(0.0, 0.0), (10.0, 0.0)]);
        // (205, 200) is inside both discs; m1 was added last
        assert_eq!(group.marker_at(Point::new(205.0, 200.0), &viewport), Some("m1"));
        assert_eq!(group.marker_at(Point::new(190.0, 200.0), &viewport), Some("m0"));
        assert_eq!(group.marker_at(Point::new(300.0, 300.0), &viewport), None);
    }

    #[test]
    fn test_clusters_draw_summary_glyph() {
        let (group, viewport) = group(&[(0.0, 0.0), (5.0, 5.0), (150.0, 150.0)]);
        let mut group = group.with_clustering(ClusteringConfig::default());
        let mut ctx = RenderContext::new(400, 400);
        group.render(&mut ctx, &viewport).unwrap();

        assert!(ctx.commands().iter().any(
            |c| matches!(c, DrawCommand::Text { text, .. } if text == "2")
        ));
        // only the lone marker can be hit
        assert_eq!(group.marker_at(Point::new(200.0, 200.0), &viewport), None);
        assert_eq!(group.marker_at(Point::new(350.0, 350.0), &viewport), Some("m2"));
    }

    #[test]
    fn test_reset_marker_image_refetches() {
        let (mut group, viewport) = group(&[(0.0, 0.0)]);
        let mut ctx = RenderContext::new(400, 400);
        group.render(&mut ctx, &viewport).unwrap();
        group.update(&viewport).unwrap();
        assert!(group.marker("m0").unwrap().state().finished());

        assert!(group.reset_marker_image("m0"));
        assert!(!group.marker("m0").unwrap().state().finished());
        assert!(group.icons().is_empty());
        assert!(!group.reset_marker_image("nope"));
    }
}
