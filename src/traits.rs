//! Traits shared by the layer, geometry and rendering modules.

use crate::{
    core::{
        geo::{Point, WorldBounds},
        viewport::Viewport,
    },
    input::events::InputEvent,
    rendering::context::RenderContext,
    Result,
};

/// 2D affine transforms as `[a, b, c, d, e, f]`
pub trait MatrixTransform {
    /// Apply 2D transformation matrix
    fn apply_transform(&self, matrix: &[f64; 6]) -> Self;

    /// Identity matrix
    fn identity_matrix() -> [f64; 6] {
        [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
    }

    /// Combine two transformation matrices (`a` applied after `b`)
    fn combine_matrices(a: &[f64; 6], b: &[f64; 6]) -> [f64; 6] {
        [
            a[0] * b[0] + a[2] * b[1],        // a
            a[1] * b[0] + a[3] * b[1],        // b
            a[0] * b[2] + a[2] * b[3],        // c
            a[1] * b[2] + a[3] * b[3],        // d
            a[0] * b[4] + a[2] * b[5] + a[4], // e
            a[1] * b[4] + a[3] * b[5] + a[5], // f
        ]
    }
}

impl MatrixTransform for Point {
    fn apply_transform(&self, matrix: &[f64; 6]) -> Self {
        Point::new(
            matrix[0] * self.x + matrix[2] * self.y + matrix[4],
            matrix[1] * self.x + matrix[3] * self.y + matrix[5],
        )
    }
}

/// Everything the map needs from a layer
pub trait LayerOperations: Send + Sync {
    /// Get layer ID
    fn id(&self) -> &str;

    /// Get layer name
    fn name(&self) -> &str;

    /// Get layer type
    fn layer_type(&self) -> crate::layers::base::LayerType;

    /// Check if layer is visible
    fn is_visible(&self) -> bool;

    /// Set layer visibility
    fn set_visible(&mut self, visible: bool);

    /// Get layer opacity (0.0 to 1.0)
    fn opacity(&self) -> f32;

    /// Set layer opacity
    fn set_opacity(&mut self, opacity: f32);

    /// Get layer z-index for ordering
    fn z_index(&self) -> i32;

    /// Set layer z-index
    fn set_z_index(&mut self, z_index: i32);

    /// Render the layer
    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()>;

    /// Handle input events
    fn handle_input(&mut self, _input: &InputEvent) -> Result<()> {
        Ok(())
    }

    /// Update layer state; returns whether anything needs repainting
    fn update(&mut self, _viewport: &Viewport) -> Result<bool> {
        Ok(false)
    }

    /// Get layer bounds if applicable
    fn bounds(&self) -> Option<WorldBounds> {
        None
    }

    /// Check if layer intersects with given bounds
    fn intersects_bounds(&self, bounds: &WorldBounds) -> bool {
        if let Some(layer_bounds) = self.bounds() {
            layer_bounds.intersects(bounds)
        } else {
            true
        }
    }

    /// Get layer options
    fn options(&self) -> serde_json::Value;

    /// Dynamic casting support
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
