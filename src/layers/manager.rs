use crate::{
    core::viewport::Viewport, layers::base::LayerTrait, prelude::HashMap,
    rendering::context::RenderContext, MapError, Result,
};

/// Manages layers for the map, handling ordering and rendering
pub struct LayerManager {
    /// All layers indexed by ID
    layers: HashMap<String, Box<dyn LayerTrait>>,
    /// Ordered list of layer IDs for rendering (sorted by z-index)
    render_order: Vec<String>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            layers: HashMap::default(),
            render_order: Vec::new(),
        }
    }

    /// Adds a layer to the manager
    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        let layer_id = layer.id().to_string();
        if self.layers.contains_key(&layer_id) {
            return Err(MapError::Layer(format!("layer {layer_id:?} already exists")));
        }
        let z_index = layer.z_index();

        self.layers.insert(layer_id.clone(), layer);

        // Insert in sorted order by z-index
        let insert_pos = self
            .render_order
            .iter()
            .position(|id| {
                self.layers
                    .get(id)
                    .map(|l| l.z_index() > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());

        self.render_order.insert(insert_pos, layer_id);
        Ok(())
    }

    /// Removes a layer from the manager
    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        self.render_order.retain(|id| id != layer_id);
        self.layers.remove(layer_id)
    }

    /// Swaps `old` for `new` in one step so callers never observe both or
    /// neither attached. Returns the detached layer.
    pub fn replace_layer(
        &mut self,
        old: Option<&str>,
        new: Box<dyn LayerTrait>,
    ) -> Result<Option<Box<dyn LayerTrait>>> {
        let new_id = new.id();
        if old != Some(new_id) && self.layers.contains_key(new_id) {
            return Err(MapError::Layer(format!("layer {new_id:?} already exists")));
        }

        let removed = old.and_then(|id| self.remove_layer(id));
        self.add_layer(new)?;
        Ok(removed)
    }

    pub fn contains(&self, layer_id: &str) -> bool {
        self.layers.contains_key(layer_id)
    }

    /// Gets a reference to a layer by ID
    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layers.get(layer_id).map(|l| l.as_ref())
    }

    /// Applies a function to a specific layer mutably
    pub fn with_layer_mut<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn LayerTrait) -> R,
    {
        self.layers.get_mut(layer_id).map(|layer| f(layer.as_mut()))
    }

    /// Layer IDs in render order
    pub fn list_layers(&self) -> Vec<String> {
        self.render_order.clone()
    }

    /// Applies a function to each layer mutably in render order
    pub fn for_each_layer_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut dyn LayerTrait),
    {
        for id in &self.render_order {
            if let Some(layer) = self.layers.get_mut(id) {
                f(layer.as_mut());
            }
        }
    }

    /// Applies a function to each layer immutably in render order.
    pub fn for_each_layer<F>(&self, mut f: F)
    where
        F: FnMut(&dyn LayerTrait),
    {
        for id in &self.render_order {
            if let Some(layer) = self.layers.get(id) {
                f(layer.as_ref());
            }
        }
    }

    /// Renders all layers in order
    pub fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let viewport_bounds = viewport.bounds();

        for layer_id in &self.render_order {
            if let Some(layer) = self.layers.get_mut(layer_id) {
                // Only render visible layers that intersect with viewport
                if layer.is_visible() && layer.intersects_bounds(&viewport_bounds) {
                    layer.render(context, viewport)?;
                }
            }
        }
        Ok(())
    }

    /// Lets every layer advance its state; true when any of them changed
    pub fn update(&mut self, viewport: &Viewport) -> Result<bool> {
        let mut changed = false;
        for layer_id in &self.render_order {
            if let Some(layer) = self.layers.get_mut(layer_id) {
                changed |= layer.update(viewport)?;
            }
        }
        Ok(changed)
    }

    /// Updates the render order based on current z-indices
    pub fn update_render_order(&mut self) {
        let layers = &self.layers;
        self.render_order.sort_by_key(|id| layers.get(id).map(|l| l.z_index()).unwrap_or(0));
    }

    /// Gets the number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Checks if the manager is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::geo::WorldBounds, layers::image::ImageLayer};

    fn overlay(id: &str, z: i32) -> Box<dyn LayerTrait> {
        let mut layer = ImageLayer::new(
            id.to_string(),
            format!("https://example/{id}.png"),
            WorldBounds::from_coords(0.0, 0.0, 1.0, 1.0),
        );
        layer.set_z_index(z);
        Box::new(layer)
    }

    #[test]
    fn test_render_order_follows_z_index() {
        let mut manager = LayerManager::new();
        manager.add_layer(overlay("top", 10)).unwrap();
        manager.add_layer(overlay("bottom", 1)).unwrap();
        manager.add_layer(overlay("middle", 5)).unwrap();
        assert_eq!(manager.list_layers(), vec!["bottom", "middle", "top"]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut manager = LayerManager::new();
        manager.add_layer(overlay("a", 0)).unwrap();
        assert!(matches!(manager.add_layer(overlay("a", 0)), Err(MapError::Layer(_))));
    }

    #[test]
    fn test_replace_layer_swaps_atomically() {
        let mut manager = LayerManager::new();
        manager.add_layer(overlay("markers-1", 0)).unwrap();

        let removed = manager.replace_layer(Some("markers-1"), overlay("markers-2", 0)).unwrap();
        assert_eq!(removed.map(|l| l.id().to_string()), Some("markers-1".to_string()));
        assert_eq!(manager.list_layers(), vec!["markers-2"]);

        // first build has nothing to detach
        let removed = manager.replace_layer(None, overlay("markers-3", 0)).unwrap();
        assert!(removed.is_none());
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_failed_replace_keeps_old_layer() {
        let mut manager = LayerManager::new();
        manager.add_layer(overlay("a", 0)).unwrap();
        manager.add_layer(overlay("b", 0)).unwrap();

        assert!(manager.replace_layer(Some("a"), overlay("b", 0)).is_err());
        assert!(manager.contains("a"));
        assert!(manager.contains("b"));
    }
}
