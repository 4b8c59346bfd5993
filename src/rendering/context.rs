use crate::{
    core::{bounds::Bounds, geo::{Point, TileCoord}},
    rendering::canvas::{Canvas, Color, Shadow},
    tiles::cache::MarkerImage,
    traits::MatrixTransform,
    MapError, Result,
};
use std::sync::Arc;

/// Commands recorded by the render context
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Tile {
        coord: TileCoord,
        url: String,
        bounds: Bounds, // screen coordinates
        opacity: f32,
    },
    Overlay {
        url: String,
        bounds: Bounds,
        opacity: f32,
    },
    Circle {
        center: Point,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<(Color, f64)>,
        shadow: Option<Shadow>,
    },
    /// `dest` is in local units; `transform` maps it to the screen
    Image {
        image: Arc<MarkerImage>,
        source: Bounds,
        dest: Bounds,
        transform: [f64; 6],
    },
    Text {
        text: String,
        position: Point,
        color: Color,
    },
}

#[derive(Debug, Clone, Copy)]
struct CanvasState {
    transform: [f64; 6],
    fill: Color,
    stroke: Color,
    line_width: f64,
    shadow: Option<Shadow>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            transform: Point::identity_matrix(),
            fill: Color::rgb(0, 0, 0),
            stroke: Color::rgb(0, 0, 0),
            line_width: 1.0,
            shadow: None,
        }
    }
}

/// Recording rendering context.
///
/// Layers draw into it through the [`Canvas`] API; hosts replay the command
/// list onto their real surface.
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    /// Drawing primitives queue
    pub drawing_queue: Vec<DrawCommand>,
    /// Viewport clipping bounds in screen coordinates
    pub clip_bounds: Option<Bounds>,
    state: CanvasState,
    stack: Vec<CanvasState>,
}

impl RenderContext {
    /// Create a new render context
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            drawing_queue: Vec::new(),
            clip_bounds: None,
            state: CanvasState::default(),
            stack: Vec::new(),
        }
    }

    /// Begin a frame
    pub fn begin_frame(&mut self) {
        self.drawing_queue.clear();
        self.state = CanvasState::default();
        self.stack.clear();
    }

    /// Get the current drawing queue
    pub fn commands(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }

    /// Number of unmatched `save` calls
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Queue a tile, dropping it when it lies completely outside the clip
    pub fn render_tile(
        &mut self,
        coord: TileCoord,
        url: String,
        bounds: Bounds,
        opacity: f32,
    ) -> Result<()> {
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(MapError::Render(format!("invalid tile bounds for {coord:?}")));
        }
        if !(0.0..=1.0).contains(&opacity) {
            return Err(MapError::Render("opacity must be between 0.0 and 1.0".into()));
        }

        if self.is_clipped(&bounds) {
            return Ok(());
        }
        self.drawing_queue.push(DrawCommand::Tile {
            coord,
            url,
            bounds,
            opacity,
        });
        Ok(())
    }

    /// Queue a georeferenced image overlay
    pub fn render_overlay(&mut self, url: String, bounds: Bounds, opacity: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(MapError::Render("opacity must be between 0.0 and 1.0".into()));
        }
        if self.is_clipped(&bounds) {
            return Ok(());
        }
        self.drawing_queue.push(DrawCommand::Overlay {
            url,
            bounds,
            opacity,
        });
        Ok(())
    }

    /// Set viewport clipping bounds (like Leaflet's clip rectangle)
    pub fn set_clip_bounds(&mut self, bounds: Bounds) {
        self.clip_bounds = Some(bounds);
    }

    pub fn clear_clip_bounds(&mut self) {
        self.clip_bounds = None;
    }

    fn is_clipped(&self, bounds: &Bounds) -> bool {
        self.clip_bounds
            .as_ref()
            .map(|clip| !clip.intersects(bounds))
            .unwrap_or(false)
    }

    fn to_screen(&self, point: Point) -> Point {
        point.apply_transform(&self.state.transform)
    }
}

impl Canvas for RenderContext {
    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        } else {
            log::warn!("restore() without matching save()");
        }
    }

    fn translate(&mut self, x: f64, y: f64) {
        let m = [1.0, 0.0, 0.0, 1.0, x, y];
        self.state.transform = Point::combine_matrices(&self.state.transform, &m);
    }

    fn rotate(&mut self, radians: f64) {
        let (sin, cos) = radians.sin_cos();
        let m = [cos, sin, -sin, cos, 0.0, 0.0];
        self.state.transform = Point::combine_matrices(&self.state.transform, &m);
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.state.shadow = shadow;
    }

    fn set_fill_color(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn set_stroke(&mut self, color: Color, line_width: f64) {
        self.state.stroke = color;
        self.state.line_width = line_width;
    }

    fn fill_circle(&mut self, center: Point, radius: f64) {
        let center = self.to_screen(center);
        self.drawing_queue.push(DrawCommand::Circle {
            center,
            radius,
            fill: Some(self.state.fill),
            stroke: None,
            shadow: self.state.shadow,
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f64) {
        let center = self.to_screen(center);
        self.drawing_queue.push(DrawCommand::Circle {
            center,
            radius,
            fill: None,
            stroke: Some((self.state.stroke, self.state.line_width)),
            shadow: self.state.shadow,
        });
    }

    fn draw_image(&mut self, image: &Arc<MarkerImage>, source: Bounds, dest: Bounds) {
        self.drawing_queue.push(DrawCommand::Image {
            image: Arc::clone(image),
            source,
            dest,
            transform: self.state.transform,
        });
    }

    fn fill_text(&mut self, text: &str, position: Point) {
        let position = self.to_screen(position);
        self.drawing_queue.push(DrawCommand::Text {
            text: text.to_string(),
            position,
            color: self.state.fill,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_restore_isolates_transforms() {
        let mut ctx = RenderContext::new(100, 100);
        ctx.save();
        ctx.translate(10.0, 20.0);
        ctx.fill_circle(Point::new(0.0, 0.0), 5.0);
        ctx.restore();
        ctx.fill_circle(Point::new(0.0, 0.0), 5.0);
        assert_eq!(ctx.depth(), 0);

        let centers: Vec<Point> = ctx
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Circle { center, .. } => Some(*center),
                _ => None,
            })
            .collect();
        assert_eq!(centers, vec![Point::new(10.0, 20.0), Point::new(0.0, 0.0)]);
    }

    #[test]
    fn test_rotation_after_translation() {
        let mut ctx = RenderContext::new(100, 100);
        ctx.translate(50.0, 50.0);
        ctx.rotate(std::f64::consts::FRAC_PI_2);
        ctx.fill_circle(Point::new(10.0, 0.0), 1.0);
        match &ctx.commands()[0] {
            DrawCommand::Circle { center, .. } => {
                assert!((center.x - 50.0).abs() < 1e-9);
                assert!((center.y - 60.0).abs() < 1e-9);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_tiles_outside_clip_are_dropped() {
        let mut ctx = RenderContext::new(256, 256);
        ctx.set_clip_bounds(Bounds::from_coords(0.0, 0.0, 256.0, 256.0));
        let coord = TileCoord::new(0, 0, -3);

        ctx.render_tile(coord, "a".into(), Bounds::from_coords(0.0, 0.0, 256.0, 256.0), 1.0)
            .unwrap();
        ctx.render_tile(coord, "b".into(), Bounds::from_coords(300.0, 0.0, 556.0, 256.0), 1.0)
            .unwrap();
        assert_eq!(ctx.commands().len(), 1);

        assert!(ctx
            .render_tile(coord, "c".into(), Bounds::from_coords(0.0, 0.0, 0.0, 0.0), 1.0)
            .is_err());
    }
}
