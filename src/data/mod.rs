pub mod cluster;
pub mod geojson;

pub use cluster::ClusterBuilder;
pub use geojson::{Feature, FeatureProperties, Geometry, GeometryCollection};
