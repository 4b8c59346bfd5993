//! Process-wide pointer tracking.
//!
//! Markers pressed with `mousedown` register here instead of installing their
//! own pointer-up listener. A single global pointer-up releases every
//! registration exactly once.

use serde::{Deserialize, Serialize};

/// Addresses one marker inside one marker layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerKey {
    pub layer_id: String,
    pub marker_id: String,
}

impl MarkerKey {
    pub fn new(layer_id: impl Into<String>, marker_id: impl Into<String>) -> Self {
        Self {
            layer_id: layer_id.into(),
            marker_id: marker_id.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    pressed: Vec<MarkerKey>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pressed marker; a marker is held at most once
    pub fn register(&mut self, key: MarkerKey) {
        if !self.pressed.contains(&key) {
            self.pressed.push(key);
        }
    }

    pub fn is_registered(&self, key: &MarkerKey) -> bool {
        self.pressed.contains(key)
    }

    /// Global pointer-up: hands back and forgets every registration
    pub fn release(&mut self) -> Vec<MarkerKey> {
        std::mem::take(&mut self.pressed)
    }

    /// Drops registrations belonging to a layer that left the map
    pub fn forget_layer(&mut self, layer_id: &str) {
        self.pressed.retain(|key| key.layer_id != layer_id);
    }

    pub fn pending(&self) -> usize {
        self.pressed.len()
    }
}
