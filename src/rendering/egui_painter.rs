//! Replays a recorded [`RenderContext`] onto an `egui::Painter`.

use crate::{
    core::geo::Point,
    rendering::{
        canvas::Color,
        context::{DrawCommand, RenderContext},
    },
    tiles::cache::MarkerImage,
    traits::MatrixTransform,
};
use egui::{
    epaint::{Mesh, Vertex},
    Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, TextureHandle, TextureId,
    TextureOptions,
};
use std::sync::Arc;

impl From<Color> for Color32 {
    fn from(c: Color) -> Self {
        Color32::from_rgba_unmultiplied(c.r, c.g, c.b, (c.a.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}

/// Supplies textures for tile URLs; hosts own tile downloading
pub trait TileTextures {
    fn texture_for(&mut self, url: &str) -> Option<TextureId>;
}

/// Uploads decoded marker icons once and hands out their texture ids
#[derive(Default)]
pub struct IconTextures {
    textures: crate::prelude::HashMap<usize, TextureHandle>,
}

impl IconTextures {
    pub fn texture_for(&mut self, ctx: &egui::Context, image: &Arc<MarkerImage>) -> TextureId {
        let key = Arc::as_ptr(image) as usize;
        self.textures
            .entry(key)
            .or_insert_with(|| {
                let color_image = egui::ColorImage::from_rgba_unmultiplied(
                    [image.width as usize, image.height as usize],
                    &image.rgba,
                );
                ctx.load_texture(format!("marker-icon-{key}"), color_image, TextureOptions::LINEAR)
            })
            .id()
    }
}

pub struct EguiReplay<'a> {
    pub painter: &'a Painter,
    /// Screen position of the map's top-left corner
    pub origin: Pos2,
    pub icons: &'a mut IconTextures,
    pub tiles: Option<&'a mut dyn TileTextures>,
}

impl EguiReplay<'_> {
    fn pos(&self, p: Point) -> Pos2 {
        Pos2::new(self.origin.x + p.x as f32, self.origin.y + p.y as f32)
    }

    fn rect(&self, min: Point, max: Point) -> Rect {
        Rect::from_min_max(self.pos(min), self.pos(max))
    }

    pub fn replay(&mut self, context: &RenderContext) {
        for command in context.commands() {
            match command {
                DrawCommand::Tile {
                    url,
                    bounds,
                    opacity,
                    ..
                }
                | DrawCommand::Overlay {
                    url,
                    bounds,
                    opacity,
                } => {
                    let rect = self.rect(bounds.min, bounds.max);
                    let texture = self.tiles.as_mut().and_then(|t| t.texture_for(url));
                    match texture {
                        Some(id) => {
                            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                            let tint = Color32::from_white_alpha((opacity * 255.0) as u8);
                            self.painter.image(id, rect, uv, tint);
                        }
                        None => {
                            self.painter
                                .rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::DARK_GRAY));
                        }
                    }
                }
                DrawCommand::Circle {
                    center,
                    radius,
                    fill,
                    stroke,
                    shadow,
                } => {
                    let center = self.pos(*center);
                    let radius = *radius as f32;
                    if let (Some(shadow), Some(_)) = (shadow, fill) {
                        let mut glow: Color32 = shadow.color.into();
                        glow = glow.gamma_multiply(0.35);
                        self.painter
                            .circle_filled(center, radius + shadow.blur as f32 / 2.0, glow);
                    }
                    if let Some(fill) = fill {
                        self.painter.circle_filled(center, radius, *fill);
                    }
                    if let Some((color, width)) = stroke {
                        self.painter
                            .circle_stroke(center, radius, Stroke::new(*width as f32, *color));
                    }
                }
                DrawCommand::Image {
                    image,
                    source,
                    dest,
                    transform,
                } => {
                    let ctx = self.painter.ctx().clone();
                    let texture = self.icons.texture_for(&ctx, image);
                    let (iw, ih) = (image.width.max(1) as f32, image.height.max(1) as f32);
                    let corners = [
                        (dest.min.x, dest.min.y, source.min.x, source.min.y),
                        (dest.max.x, dest.min.y, source.max.x, source.min.y),
                        (dest.max.x, dest.max.y, source.max.x, source.max.y),
                        (dest.min.x, dest.max.y, source.min.x, source.max.y),
                    ];
                    let mut mesh = Mesh::with_texture(texture);
                    for (x, y, u, v) in corners {
                        let screen = Point::new(x, y).apply_transform(transform);
                        mesh.vertices.push(Vertex {
                            pos: self.pos(screen),
                            uv: Pos2::new(u as f32 / iw, v as f32 / ih),
                            color: Color32::WHITE,
                        });
                    }
                    mesh.add_triangle(0, 1, 2);
                    mesh.add_triangle(0, 2, 3);
                    self.painter.add(Shape::mesh(mesh));
                }
                DrawCommand::Text {
                    text,
                    position,
                    color,
                } => {
                    self.painter.text(
                        self.pos(*position),
                        Align2::CENTER_CENTER,
                        text,
                        FontId::proportional(12.0),
                        (*color).into(),
                    );
                }
            }
        }
    }
}
