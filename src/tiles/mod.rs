pub mod cache;
pub mod loader;
pub mod source;

// Re-exports for convenience
pub use cache::{IconEntry, IconStore, MarkerImage};
pub use loader::{FetchOutcome, HttpImageFetcher, ImageFetcher};
pub use source::{tile_url, TileSource, TileSourceDescriptor};
