use crate::{
    constants::{
        TILE_MAX_NATIVE_ZOOM, TILE_MAX_ZOOM, TILE_MIN_NATIVE_ZOOM, TILE_MIN_ZOOM, TILE_SIZE,
    },
    core::{
        config::ResolvedArea,
        crs::CoordinateSystem,
        geo::{TileCoord, WorldBounds, WorldPoint},
    },
};

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// Tile URL as the remote tile store lays it out: `{prefix}{code}/{z+13}/{x}_{y}.{ext}`
pub fn tile_url(prefix: &str, code: &str, coord: TileCoord, extension: &str) -> String {
    format!(
        "{prefix}{code}/{}/{}_{}.{extension}",
        coord.url_zoom(),
        coord.x,
        coord.y
    )
}

/// Everything needed to request and place one area's tile pyramid
#[derive(Debug, Clone, PartialEq)]
pub struct TileSourceDescriptor {
    pub url_prefix: String,
    pub code: String,
    pub extension: String,
    /// World rectangle covered by imagery
    pub bounds: WorldBounds,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub min_native_zoom: i32,
    pub max_native_zoom: i32,
    pub tile_size: u32,
}

impl TileSourceDescriptor {
    /// Builds the descriptor for a resolved area.
    ///
    /// Bounds run from `-center + tilesOffset` to `size - center + tilesOffset`.
    pub fn from_area(area: &ResolvedArea, url_prefix: impl Into<String>) -> Self {
        let [cx, cy] = area.center;
        let [ox, oy] = area.tiles_offset;
        let [w, h] = area.size;
        let bounds = WorldBounds::new(
            WorldPoint::new(-cx + ox, -cy + oy),
            WorldPoint::new(w - cx + ox, h - cy + oy),
        );

        Self {
            url_prefix: url_prefix.into(),
            code: area.code.clone(),
            extension: area.extension.clone(),
            bounds,
            min_zoom: TILE_MIN_ZOOM,
            max_zoom: TILE_MAX_ZOOM,
            min_native_zoom: TILE_MIN_NATIVE_ZOOM,
            max_native_zoom: TILE_MAX_NATIVE_ZOOM,
            tile_size: TILE_SIZE,
        }
    }

    /// Zoom of the imagery used at a view zoom
    pub fn tile_zoom(&self, zoom: f64) -> i32 {
        (zoom.round() as i32).clamp(self.min_native_zoom, self.max_native_zoom)
    }

    /// Tiles intersecting both `view` and the imagery bounds
    pub fn tiles_in_view(
        &self,
        crs: &CoordinateSystem,
        view: &WorldBounds,
        zoom: f64,
    ) -> Vec<TileCoord> {
        if zoom < self.min_zoom || zoom > self.max_zoom {
            return Vec::new();
        }
        let Some(visible) = view.intersection(&self.bounds) else {
            return Vec::new();
        };

        let z = self.tile_zoom(zoom);
        let pixels = crs.project_bounds(&visible, z as f64);
        let size = self.tile_size as f64;

        let x0 = (pixels.min.x / size).floor() as i32;
        let y0 = (pixels.min.y / size).floor() as i32;
        let x1 = ((pixels.max.x / size).ceil() as i32 - 1).max(x0);
        let y1 = ((pixels.max.y / size).ceil() as i32 - 1).max(y0);

        let mut tiles = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)) as usize);
        for y in y0..=y1 {
            for x in x0..=x1 {
                tiles.push(TileCoord::new(x, y, z));
            }
        }
        tiles
    }

    /// World rectangle covered by one tile
    pub fn tile_world_bounds(&self, crs: &CoordinateSystem, coord: TileCoord) -> WorldBounds {
        let size = self.tile_size as f64;
        let zoom = coord.z as f64;
        let min = crate::core::geo::Point::new(coord.x as f64 * size, coord.y as f64 * size);
        let max = crate::core::geo::Point::new(min.x + size, min.y + size);
        WorldBounds::new(crs.pixel_to_world(&min, zoom), crs.pixel_to_world(&max, zoom))
    }
}

impl TileSource for TileSourceDescriptor {
    fn url(&self, coord: TileCoord) -> String {
        tile_url(&self.url_prefix, &self.code, coord, &self.extension)
    }
}
