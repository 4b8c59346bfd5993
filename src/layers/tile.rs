use crate::{
    core::{
        bounds::Bounds,
        crs::CoordinateSystem,
        geo::{TileCoord, WorldBounds},
        viewport::Viewport,
    },
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::context::RenderContext,
    tiles::source::{TileSource, TileSourceDescriptor},
    Result,
};

/// A tile-based layer showing one area's imagery pyramid
pub struct TileLayer {
    /// Base layer properties
    properties: LayerProperties,
    /// Where tiles live and which part of the world they cover
    source: TileSourceDescriptor,
    crs: CoordinateSystem,
    /// Tiles queued by the last render
    visible_tiles: Vec<TileCoord>,
}

impl TileLayer {
    pub fn new(id: String, source: TileSourceDescriptor, crs: CoordinateSystem) -> Self {
        let name = format!("Tiles {}", source.code);
        Self {
            properties: LayerProperties::new(id, name, LayerType::Tile),
            source,
            crs,
            visible_tiles: Vec::new(),
        }
    }

    pub fn source(&self) -> &TileSourceDescriptor {
        &self.source
    }

    /// Tiles covering the viewport, in row-major order
    pub fn visible_tiles(&self, viewport: &Viewport) -> Vec<TileCoord> {
        self.source
            .tiles_in_view(&self.crs, &viewport.bounds(), viewport.zoom)
    }

    /// Tiles emitted by the most recent render
    pub fn last_rendered(&self) -> &[TileCoord] {
        &self.visible_tiles
    }

    fn screen_bounds(&self, coord: TileCoord, viewport: &Viewport) -> Bounds {
        let world = self.source.tile_world_bounds(&self.crs, coord);
        Bounds::new(
            viewport.world_to_screen(&world.min),
            viewport.world_to_screen(&world.max),
        )
    }
}

impl LayerTrait for TileLayer {
    crate::impl_layer_trait!(TileLayer, properties);

    fn bounds(&self) -> Option<WorldBounds> {
        Some(self.source.bounds)
    }

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        self.visible_tiles = self.visible_tiles(viewport);
        log::trace!(
            "rendering {} tiles of {} at zoom {}",
            self.visible_tiles.len(),
            self.source.code,
            viewport.zoom
        );

        for &coord in &self.visible_tiles {
            let bounds = self.screen_bounds(coord, viewport);
            context.render_tile(coord, self.source.url(coord), bounds, self.properties.opacity)?;
        }
        Ok(())
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.source.code,
            "extension": self.source.extension,
            "minZoom": self.source.min_zoom,
            "maxZoom": self.source.max_zoom,
            "minNativeZoom": self.source.min_native_zoom,
            "maxNativeZoom": self.source.max_native_zoom,
            "tileSize": self.source.tile_size,
        })
    }
}
