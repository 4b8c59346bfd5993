//! # teyvat-map
//!
//! A tiled game-world map engine in the spirit of Leaflet's `CRS.Simple`.
//!
//! The crate covers the pieces that have to be exactly right for a pannable,
//! zoomable world map with thousands of interactive markers:
//!
//! - a per-area coordinate system translating world units into tile pixels,
//! - an immutable area registry with `extends` inheritance that yields tile
//!   sources and viewport limits,
//! - a canvas marker primitive with an explicit visual state machine and lazy
//!   icon loading,
//! - controllers that keep the marker layer in sync with remote data and turn
//!   pointer gestures into popups, menus and domain commands.

pub mod core;
pub mod data;
pub mod input;
pub mod layers;
pub mod markers;
pub mod prelude;
pub mod rendering;
pub mod spatial;
pub mod tiles;
pub mod traits;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    bounds::Bounds,
    builder::MapFactory,
    config::{AreaConfig, AreaRegistry, EngineConfig, ResolvedArea},
    crs::CoordinateSystem,
    geo::{Point, TileCoord, WorldBounds, WorldPoint},
    map::{Map, MapOptions},
    viewport::Viewport,
};

pub use layers::{
    base::LayerTrait, group::MarkerGroup, image::ImageLayer, marker::MarkerPrimitive,
    tile::TileLayer,
};

pub use input::events::{InputEvent, MapEvent};

pub use markers::controller::MarkerLayerController;

pub use ui::{context_menu::InteractionController, popup::Popup};

pub use rendering::{canvas::Canvas, context::RenderContext, marker::DiscMarkerRenderer};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Area could not be resolved: {0}")]
    AreaNotResolved(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Service error: {0}")]
    Service(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs an `env_logger` backend honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(cfg!(test))
        .try_init();
}
