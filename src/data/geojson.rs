use crate::{
    core::geo::{WorldBounds, WorldPoint},
    markers::record::MarkerRecord,
};
use serde::{Deserialize, Serialize};

/// Feature geometry. Marker data only ever carries points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        /// `[x, y]` in world units
        coordinates: [f64; 2],
    },
}

impl Geometry {
    pub fn point(position: WorldPoint) -> Self {
        Geometry::Point {
            coordinates: [position.x, position.y],
        }
    }

    pub fn position(&self) -> WorldPoint {
        match self {
            Geometry::Point { coordinates } => WorldPoint::from_array(*coordinates),
        }
    }
}

/// Popup text carried by a feature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureProperties {
    pub pop_title: String,
    pub popup_content: String,
}

/// A point feature plus the record it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: FeatureProperties,
    pub data: MarkerRecord,
}

impl Feature {
    pub fn position(&self) -> WorldPoint {
        self.geometry.position()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct GeometryCollection {
    pub features: Vec<Feature>,
}

impl GeometryCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Smallest rectangle holding every feature
    pub fn bounds(&self) -> Option<WorldBounds> {
        let mut iter = self.features.iter().map(Feature::position);
        let first = iter.next()?;
        let mut bounds = WorldBounds::new(first, first);
        for position in iter {
            bounds.extend(&position);
        }
        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(id: u64, x: f64, y: f64) -> Feature {
        Feature {
            geometry: Geometry::point(WorldPoint::new(x, y)),
            properties: FeatureProperties {
                pop_title: format!("t{id}"),
                popup_content: String::new(),
            },
            data: MarkerRecord {
                id,
                ..MarkerRecord::default()
            },
        }
    }

    #[test]
    fn test_serialized_shape() {
        let collection = GeometryCollection {
            features: vec![feature(1, 3.0, 4.0)],
        };
        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["geometry"]["type"], "Point");
        assert_eq!(value["features"][0]["geometry"]["coordinates"], serde_json::json!([3.0, 4.0]));
        assert_eq!(value["features"][0]["properties"]["popTitle"], "t1");

        let back: GeometryCollection = serde_json::from_value(value).unwrap();
        assert_eq!(back, collection);
    }

    #[test]
    fn test_bounds() {
        let collection = GeometryCollection {
            features: vec![feature(1, -5.0, 2.0), feature(2, 10.0, -3.0)],
        };
        let bounds = collection.bounds().unwrap();
        assert_eq!(bounds.min, WorldPoint::new(-5.0, -3.0));
        assert_eq!(bounds.max, WorldPoint::new(10.0, 2.0));
        assert!(GeometryCollection::default().bounds().is_none());
    }
}
