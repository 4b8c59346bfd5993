use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A position in game-world units; every marker is authored in this space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    /// Creates a new world coordinate
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_array(coords: [f64; 2]) -> Self {
        Self::new(coords[0], coords[1])
    }

    /// Parses a serialized `"x,y"` pair.
    ///
    /// Anything other than exactly two finite numbers is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split(',');
        let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(MapError::InvalidCoordinates(format!(
                "expected \"x,y\", got {raw:?}"
            )));
        };

        let parse_axis = |axis: &str| -> Result<f64> {
            let value: f64 = axis.trim().parse().map_err(|_| {
                MapError::InvalidCoordinates(format!("{axis:?} is not a number in {raw:?}"))
            })?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(MapError::InvalidCoordinates(format!(
                    "non-finite component in {raw:?}"
                )))
            }
        };

        Ok(Self::new(parse_axis(x)?, parse_axis(y)?))
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_to(&self, other: &WorldPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Default for WorldPoint {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl FromStr for WorldPoint {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for WorldPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Represents a point in screen or projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn divide(&self, scalar: f64) -> Point {
        Point::new(self.x / scalar, self.y / scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }

    pub fn round(&self) -> Point {
        Point::new(self.x.round(), self.y.round())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Axis-aligned rectangle in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: WorldPoint,
    pub max: WorldPoint,
}

impl WorldBounds {
    /// Builds bounds from two opposite corners in any order
    pub fn new(a: WorldPoint, b: WorldPoint) -> Self {
        Self {
            min: WorldPoint::new(a.x.min(b.x), a.y.min(b.y)),
            max: WorldPoint::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(WorldPoint::new(min_x, min_y), WorldPoint::new(max_x, max_y))
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &WorldPoint) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Checks if the bounds intersect with another bounds
    pub fn intersects(&self, other: &WorldBounds) -> bool {
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y)
    }

    pub fn intersection(&self, other: &WorldBounds) -> Option<WorldBounds> {
        if !self.intersects(other) {
            return None;
        }
        Some(WorldBounds::from_coords(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
        ))
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &WorldPoint) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Returns a copy grown by `padding` on every side
    pub fn expanded(&self, padding: f64) -> WorldBounds {
        WorldBounds::from_coords(
            self.min.x - padding,
            self.min.y - padding,
            self.max.x + padding,
            self.max.y + padding,
        )
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> WorldPoint {
        WorldPoint::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Clamps a point into the bounds
    pub fn clamp(&self, point: &WorldPoint) -> WorldPoint {
        WorldPoint::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
        )
    }
}

/// Identifies one raster tile. Grid positions may be negative when an area
/// declares a tile offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TileCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Zoom as it appears in the tile URL
    pub fn url_zoom(&self) -> i32 {
        self.z + crate::constants::TILE_ZOOM_OFFSET
    }
}
