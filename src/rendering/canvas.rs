use crate::{
    core::{bounds::Bounds, geo::Point},
    tiles::cache::MarkerImage,
};
use std::sync::Arc;

/// RGBA colour with a fractional alpha channel, as CSS writes it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Drop shadow applied to fills while set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub blur: f64,
    pub color: Color,
}

/// Immediate-mode 2D drawing surface modelled on the HTML canvas API.
///
/// `save`/`restore` bracket every state change so a pass or marker never
/// leaks transforms or styles into the next one.
pub trait Canvas {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, radians: f64);
    fn set_shadow(&mut self, shadow: Option<Shadow>);
    fn set_fill_color(&mut self, color: Color);
    fn set_stroke(&mut self, color: Color, line_width: f64);
    fn fill_circle(&mut self, center: Point, radius: f64);
    fn stroke_circle(&mut self, center: Point, radius: f64);
    /// Draws `source` (image pixels) into `dest` (local canvas units)
    fn draw_image(&mut self, image: &Arc<MarkerImage>, source: Bounds, dest: Bounds);
    fn fill_text(&mut self, text: &str, position: Point);
}

