//! Flat coordinate reference system bound to one map area.
//!
//! World coordinates are translated by the area's `center` offset to land in
//! projection space; the projection is then scaled by `2^zoom` like Leaflet's
//! `CRS.Simple` with an identity transformation.

use crate::core::{
    bounds::Bounds,
    geo::{Point, WorldBounds, WorldPoint},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSystem {
    origin: Point,
}

impl CoordinateSystem {
    /// Creates a coordinate system from an area's `center` offset
    pub fn new(center: [f64; 2]) -> Self {
        Self {
            origin: Point::new(center[0], center[1]),
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// World units to projection space: `pixel = world + center`
    pub fn project(&self, world: &WorldPoint) -> Point {
        Point::new(world.x + self.origin.x, world.y + self.origin.y)
    }

    /// Projection space back to world units: `world = pixel - center`
    pub fn unproject(&self, pixel: &Point) -> WorldPoint {
        WorldPoint::new(pixel.x - self.origin.x, pixel.y - self.origin.y)
    }

    /// Scale factor at the given zoom level
    pub fn scale(&self, zoom: f64) -> f64 {
        2_f64.powf(zoom)
    }

    /// World units to pixels at a zoom level
    pub fn world_to_pixel(&self, world: &WorldPoint, zoom: f64) -> Point {
        self.project(world).multiply(self.scale(zoom))
    }

    /// Pixels at a zoom level back to world units
    pub fn pixel_to_world(&self, pixel: &Point, zoom: f64) -> WorldPoint {
        self.unproject(&pixel.divide(self.scale(zoom)))
    }

    /// Projects a world rectangle into pixel bounds at a zoom level
    pub fn project_bounds(&self, bounds: &WorldBounds, zoom: f64) -> Bounds {
        let min = self.world_to_pixel(&bounds.min, zoom);
        let max = self.world_to_pixel(&bounds.max, zoom);
        Bounds::new(min, max)
    }

    /// Screen-space bearing from `from` towards `to`, in degrees
    pub fn bearing(&self, from: &WorldPoint, to: &WorldPoint) -> f64 {
        let start = self.project(from);
        let end = self.project(to);
        (start.y - end.y).atan2(start.x - end.x).to_degrees()
    }
}
