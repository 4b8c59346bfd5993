use crate::core::{
    crs::CoordinateSystem,
    geo::{Point, WorldBounds, WorldPoint},
};

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// The center of the map view in world coordinates
    pub center: WorldPoint,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
    /// Zoom levels snap to multiples of this value (0 disables snapping)
    pub zoom_snap: f64,
    /// Step used by `zoom_in` / `zoom_out`
    pub zoom_delta: f64,
    /// Maximum bounds the center may move within
    max_bounds: Option<WorldBounds>,
    crs: CoordinateSystem,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(crs: CoordinateSystem, center: WorldPoint, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom,
            size,
            min_zoom: f64::NEG_INFINITY,
            max_zoom: f64::INFINITY,
            zoom_snap: 0.0,
            zoom_delta: 1.0,
            max_bounds: None,
            crs,
        }
    }

    pub fn crs(&self) -> &CoordinateSystem {
        &self.crs
    }

    /// Sets the maximum bounds for the map and re-clamps the center
    pub fn set_max_bounds(&mut self, bounds: Option<WorldBounds>) {
        self.max_bounds = bounds;
        self.center = self.clamp_center(self.center);
    }

    pub fn max_bounds(&self) -> Option<&WorldBounds> {
        self.max_bounds.as_ref()
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    pub fn set_zoom_steps(&mut self, zoom_snap: f64, zoom_delta: f64) {
        self.zoom_snap = zoom_snap.max(0.0);
        self.zoom_delta = zoom_delta;
    }

    /// Snaps then clamps a zoom level to what this viewport allows
    pub fn constrain_zoom(&self, zoom: f64) -> f64 {
        let snapped = if self.zoom_snap > 0.0 {
            (zoom / self.zoom_snap).round() * self.zoom_snap
        } else {
            zoom
        };
        snapped.clamp(self.min_zoom, self.max_zoom)
    }

    /// Sets the center of the viewport with bounds checking
    pub fn set_center(&mut self, center: WorldPoint) {
        self.center = self.clamp_center(center);
    }

    /// Sets the zoom level, snapping and clamping to the valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = self.constrain_zoom(zoom);
    }

    pub fn set_view(&mut self, center: WorldPoint, zoom: f64) {
        self.set_zoom(zoom);
        self.set_center(center);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Gets the scale factor for the current zoom level
    pub fn scale(&self) -> f64 {
        self.crs.scale(self.zoom)
    }

    /// Converts a world coordinate to screen pixel coordinates (container relative)
    pub fn world_to_screen(&self, world: &WorldPoint) -> Point {
        let pixel = self.crs.world_to_pixel(world, self.zoom);
        let origin = self.crs.world_to_pixel(&self.center, self.zoom);
        pixel
            .subtract(&origin)
            .add(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
    }

    /// Converts screen pixel coordinates back to world coordinates
    pub fn screen_to_world(&self, screen: &Point) -> WorldPoint {
        let origin = self.crs.world_to_pixel(&self.center, self.zoom);
        let pixel = screen
            .subtract(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
            .add(&origin);
        self.crs.pixel_to_world(&pixel, self.zoom)
    }

    /// World-space rectangle currently visible on screen
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::new(
            self.screen_to_world(&Point::new(0.0, 0.0)),
            self.screen_to_world(&self.size),
        )
    }

    /// Pans by a screen-space delta; dragging right moves the view left.
    ///
    /// Returns the delta that was actually applied after clamping.
    pub fn pan(&mut self, delta: Point) -> Point {
        let scale = self.scale();
        let target = WorldPoint::new(
            self.center.x - delta.x / scale,
            self.center.y - delta.y / scale,
        );
        let clamped = self.clamp_center(target);
        let applied = Point::new(
            (self.center.x - clamped.x) * scale,
            (self.center.y - clamped.y) * scale,
        );
        self.center = clamped;
        applied
    }

    /// Zooms to a level, keeping the world point under `focus` fixed on screen
    pub fn zoom_to(&mut self, zoom: f64, focus: Option<Point>) {
        let Some(focus) = focus else {
            self.set_zoom(zoom);
            return;
        };

        let before = self.screen_to_world(&focus);
        self.set_zoom(zoom);
        let after = self.screen_to_world(&focus);
        let center = WorldPoint::new(
            self.center.x + before.x - after.x,
            self.center.y + before.y - after.y,
        );
        self.set_center(center);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.zoom_delta);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.zoom_delta);
    }

    fn clamp_center(&self, center: WorldPoint) -> WorldPoint {
        match &self.max_bounds {
            Some(bounds) => bounds.clamp(&center),
            None => center,
        }
    }
}
