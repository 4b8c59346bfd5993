pub mod base;
pub mod group;
pub mod image;
pub mod macros;
pub mod manager;
pub mod marker;
pub mod tile;

pub use base::{LayerProperties, LayerTrait, LayerType};
pub use group::MarkerGroup;
pub use image::{ImageLayer, IslandOverlay};
pub use manager::LayerManager;
pub use marker::{ImageSlot, MarkerImageOptions, MarkerOptions, MarkerPrimitive, MarkerVisualState};
pub use tile::TileLayer;
