//! Marker drawing strategies.
//!
//! A [`MarkerRenderer`] is held by every marker layer and receives one call
//! per visible marker. The default [`DiscMarkerRenderer`] paints the round
//! icon badge in four order-significant passes.

use crate::{
    core::{bounds::Bounds, geo::Point},
    layers::marker::MarkerVisualState,
    rendering::canvas::{Canvas, Color, Shadow},
    tiles::cache::MarkerImage,
};
use std::sync::Arc;

/// Everything a renderer needs to paint one marker
#[derive(Debug, Clone)]
pub struct MarkerDrawParams<'a> {
    /// Marker anchor in screen pixels
    pub position: Point,
    /// Extra pixel offset applied to the anchor
    pub offset: Point,
    /// Base icon size before state adjustments
    pub size: (f64, f64),
    /// Rotation in degrees
    pub rotation: f64,
    pub image: &'a Arc<MarkerImage>,
    pub state: &'a MarkerVisualState,
}

pub trait MarkerRenderer: Send + Sync {
    fn draw_marker(&self, canvas: &mut dyn Canvas, params: &MarkerDrawParams<'_>);

    /// Summary glyph for a cluster of `count` markers
    fn draw_cluster(&self, canvas: &mut dyn Canvas, center: Point, count: usize) {
        canvas.save();
        canvas.set_fill_color(Color::rgba(50, 57, 71, 0.8));
        canvas.fill_circle(center, 20.0);
        canvas.set_fill_color(Color::rgb(255, 255, 255));
        canvas.fill_text(&count.to_string(), center);
        canvas.restore();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub shadow: Shadow,
    pub background: Color,
    pub hover_tint: Color,
    pub active_tint: Color,
    pub outline: Color,
    pub highlight: Color,
    pub outline_width: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            shadow: Shadow {
                blur: 10.0,
                color: Color::rgb(50, 57, 71),
            },
            background: Color::rgb(50, 57, 71),
            hover_tint: Color::rgba(255, 255, 255, 0.2),
            active_tint: Color::rgba(0, 0, 0, 0.2),
            outline: Color::rgb(0xD3, 0xBC, 0x8E),
            highlight: Color::rgb(58, 205, 82),
            outline_width: 2.0,
        }
    }
}

/// Rectangle an image occupies inside a box under `object-fit: contain`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Scales `(image_w, image_h)` to fit entirely inside `(box_w, box_h)`,
/// preserving aspect ratio and centering the result.
pub fn contain_fit(box_w: f64, box_h: f64, image_w: f64, image_h: f64) -> FitRect {
    if image_w <= 0.0 || image_h <= 0.0 {
        return FitRect {
            x: 0.0,
            y: 0.0,
            width: box_w,
            height: box_h,
        };
    }

    let scale = (box_w / image_w).min(box_h / image_h);
    let width = image_w * scale;
    let height = image_h * scale;
    FitRect {
        x: (box_w - width) / 2.0,
        y: (box_h - height) / 2.0,
        width,
        height,
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscMarkerRenderer {
    pub style: MarkerStyle,
}

impl DiscMarkerRenderer {
    pub fn new(style: MarkerStyle) -> Self {
        Self { style }
    }
}

impl MarkerRenderer for DiscMarkerRenderer {
    fn draw_marker(&self, canvas: &mut dyn Canvas, params: &MarkerDrawParams<'_>) {
        let state = params.state;
        let (w, h) = state.visual_size(params.size);
        let anchor = params.position.round();
        let center = Point::new(anchor.x + params.offset.x, anchor.y + params.offset.y);
        let radius = w.max(h) / 2.0;

        // shadow + background disc
        canvas.save();
        canvas.set_shadow(Some(self.style.shadow));
        canvas.set_fill_color(self.style.background);
        canvas.fill_circle(center, radius);
        canvas.restore();

        // bitmap, rotated around the disc center
        canvas.save();
        canvas.translate(center.x, center.y);
        if params.rotation != 0.0 {
            canvas.rotate(params.rotation.to_radians());
        }
        let image = params.image;
        let fit = contain_fit(w, h, image.width as f64, image.height as f64);
        let source = Bounds::from_coords(0.0, 0.0, image.width as f64, image.height as f64);
        let dest = Bounds::from_coords(
            fit.x - w / 2.0,
            fit.y - h / 2.0,
            fit.x - w / 2.0 + fit.width,
            fit.y - h / 2.0 + fit.height,
        );
        canvas.draw_image(image, source, dest);
        canvas.restore();

        // hover / active tint
        if state.hover {
            canvas.save();
            let tint = if state.active {
                self.style.active_tint
            } else {
                self.style.hover_tint
            };
            canvas.set_fill_color(tint);
            canvas.fill_circle(center, radius);
            canvas.restore();
        }

        // outline
        canvas.save();
        let outline = if state.popper_open {
            self.style.highlight
        } else {
            self.style.outline
        };
        canvas.set_stroke(outline, self.style.outline_width);
        canvas.stroke_circle(center, radius);
        canvas.restore();
    }
}
