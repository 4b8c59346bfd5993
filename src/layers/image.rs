use crate::{
    core::{
        bounds::Bounds,
        geo::WorldBounds,
        viewport::Viewport,
    },
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::context::RenderContext,
    Result,
};

/// Island backdrops drawn over the base tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IslandOverlay {
    Ww,
    Pp,
    Ss,
    Bd,
}

impl IslandOverlay {
    pub const ALL: [IslandOverlay; 4] = [
        IslandOverlay::Ww,
        IslandOverlay::Pp,
        IslandOverlay::Ss,
        IslandOverlay::Bd,
    ];

    /// Path segment used in the overlay URL
    pub fn code(&self) -> &'static str {
        match self {
            IslandOverlay::Ww => "ww",
            IslandOverlay::Pp => "pp",
            IslandOverlay::Ss => "ss",
            IslandOverlay::Bd => "bd",
        }
    }

    pub fn bounds(&self) -> WorldBounds {
        match self {
            IslandOverlay::Ww => WorldBounds::from_coords(-494.0, -1164.0, 1554.0, -140.0),
            IslandOverlay::Pp => WorldBounds::from_coords(-581.0, -3214.0, 443.0, -2190.0),
            IslandOverlay::Ss => WorldBounds::from_coords(528.0, -4237.0, 2576.0, -2189.0),
            IslandOverlay::Bd => WorldBounds::from_coords(1433.0, -1814.0, 2201.0, -1046.0),
        }
    }

    pub fn url(&self, prefix: &str, index: u32) -> String {
        format!("{prefix}qd28/other/{}/{index}.png", self.code())
    }
}

/// A single image stretched over a world rectangle
pub struct ImageLayer {
    properties: LayerProperties,
    url: String,
    bounds: WorldBounds,
}

impl ImageLayer {
    pub fn new(id: String, url: String, bounds: WorldBounds) -> Self {
        let properties = LayerProperties::new(id, "Image Layer".to_string(), LayerType::Image);
        Self {
            properties,
            url,
            bounds,
        }
    }

    pub fn island(prefix: &str, overlay: IslandOverlay, index: u32) -> Self {
        Self::new(
            format!("island-{}-{index}", overlay.code()),
            overlay.url(prefix, index),
            overlay.bounds(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn screen_bounds(&self, viewport: &Viewport) -> Bounds {
        let min = viewport.world_to_screen(&self.bounds.min);
        let max = viewport.world_to_screen(&self.bounds.max);
        Bounds::new(min, max)
    }
}

impl LayerTrait for ImageLayer {
    crate::impl_layer_trait!(ImageLayer, properties);

    fn bounds(&self) -> Option<WorldBounds> {
        Some(self.bounds)
    }

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let bounds = self.screen_bounds(viewport);
        context.render_overlay(self.url.clone(), bounds, self.properties.opacity)
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "url": self.url,
            "bounds": [
                [self.bounds.min.x, self.bounds.min.y],
                [self.bounds.max.x, self.bounds.max.y]
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{
            crs::CoordinateSystem,
            geo::{Point, WorldPoint},
        },
        rendering::context::DrawCommand,
    };

    #[test]
    fn test_island_url_and_bounds() {
        let layer = ImageLayer::island("https://assets.yuanshen.site/tiles_", IslandOverlay::Ss, 2);
        assert_eq!(
            layer.url(),
            "https://assets.yuanshen.site/tiles_qd28/other/ss/2.png"
        );
        assert_eq!(
            layer.bounds(),
            Some(WorldBounds::from_coords(528.0, -4237.0, 2576.0, -2189.0))
        );
        assert_eq!(layer.id(), "island-ss-2");
    }

    #[test]
    fn test_renders_overlay_in_screen_space() {
        let crs = CoordinateSystem::new([0.0, 0.0]);
        let viewport = Viewport::new(crs, WorldPoint::new(0.0, 0.0), 0.0, Point::new(100.0, 100.0));
        let mut layer = ImageLayer::new(
            "o".into(),
            "u.png".into(),
            WorldBounds::from_coords(-10.0, -10.0, 10.0, 10.0),
        );
        let mut ctx = RenderContext::new(100, 100);
        layer.render(&mut ctx, &viewport).unwrap();

        match &ctx.commands()[0] {
            DrawCommand::Overlay { bounds, url, .. } => {
                assert_eq!(url, "u.png");
                assert_eq!(*bounds, Bounds::from_coords(40.0, 40.0, 60.0, 60.0));
            }
            other => panic!("expected overlay, got {other:?}"),
        }
    }
}
