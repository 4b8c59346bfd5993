pub mod canvas;
pub mod context;
#[cfg(feature = "egui")]
pub mod egui_painter;
pub mod marker;

// Re-export main types
pub use canvas::{Canvas, Color, Shadow};
pub use context::{DrawCommand, RenderContext};
pub use marker::{DiscMarkerRenderer, MarkerDrawParams, MarkerRenderer, MarkerStyle};
