//! Map construction from area names.
//!
//! [`MapFactory`] ties the area registry, the coordinate system and the tile
//! source together and hands back a ready [`Map`] with its base tile layer
//! attached and viewport limits applied.

use crate::{
    constants::MAX_BOUNDS_PADDING,
    core::{
        config::{AreaRegistry, EngineConfig, ResolvedArea},
        crs::CoordinateSystem,
        geo::WorldBounds,
        map::{Map, MapOptions},
    },
    layers::tile::TileLayer,
    tiles::source::TileSourceDescriptor,
    MapError, Result,
};
use std::sync::Arc;

/// Id of the base tile layer on every map the factory builds
pub const BASE_TILE_LAYER_ID: &str = "tiles";

#[derive(Debug, Clone)]
pub struct MapFactory {
    registry: Arc<AreaRegistry>,
    config: EngineConfig,
}

impl MapFactory {
    pub fn new(registry: AreaRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            config: EngineConfig::default(),
        }
    }

    /// Shares an already loaded registry
    pub fn from_shared(registry: Arc<AreaRegistry>) -> Self {
        Self {
            registry,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &AreaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Tile pyramid description for an area, `None` when it does not resolve
    pub fn tile_source(&self, area_name: &str) -> Option<TileSourceDescriptor> {
        let area = self.registry.resolve(area_name)?;
        Some(TileSourceDescriptor::from_area(
            &area,
            self.config.tile_url_prefix.as_str(),
        ))
    }

    /// Pan limit for an area: tile bounds plus a fixed overscroll margin
    pub fn max_bounds(source: &TileSourceDescriptor) -> WorldBounds {
        source.bounds.expanded(MAX_BOUNDS_PADDING)
    }

    /// Builds a map for `area_name`.
    ///
    /// `options` carries the caller's defaults; the area's own settings are
    /// layered on top. Fails with [`MapError::AreaNotResolved`] when the
    /// area has no code after inheritance, in which case nothing is built.
    pub fn create_map(&self, area_name: &str, options: MapOptions) -> Result<Map> {
        let Some(area) = self.registry.resolve(area_name) else {
            log::warn!("no map built for area {area_name:?}");
            return Err(MapError::AreaNotResolved(area_name.to_string()));
        };
        self.build(area, options)
    }

    /// Builds a map for the configured default area
    pub fn create_default_map(&self, options: MapOptions) -> Result<Map> {
        let name = self.config.default_area.clone();
        self.create_map(&name, options)
    }

    fn build(&self, area: ResolvedArea, options: MapOptions) -> Result<Map> {
        let crs = CoordinateSystem::new(area.center);
        let source = TileSourceDescriptor::from_area(&area, self.config.tile_url_prefix.as_str());
        let options = options.with_area_settings(&area.settings);

        log::info!(
            "building map for {:?} (code {}, center {:?}, zoom {})",
            area.name,
            area.code,
            options.center,
            options.zoom
        );

        let max_bounds = Self::max_bounds(&source);
        let mut map = Map::new(crs, options);
        map.set_max_bounds(Some(max_bounds));
        map.add_layer(Box::new(TileLayer::new(
            BASE_TILE_LAYER_ID.to_string(),
            source,
            crs,
        )))?;
        Ok(map.with_area(area))
    }
}

impl Default for MapFactory {
    fn default() -> Self {
        Self::new(AreaRegistry::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{config::AreaConfig, geo::WorldPoint};
    use crate::prelude::HashMap;

    #[test]
    fn test_create_map_applies_area_settings() {
        let factory = MapFactory::default();
        let map = factory.create_map("金苹果群岛", MapOptions::default()).unwrap();

        assert_eq!(map.viewport().center, WorldPoint::new(600.0, -2190.0));
        assert_eq!(map.viewport().zoom, -2.0);
        assert_eq!(map.area().map(|a| a.code.as_str()), Some("qd28"));
        assert_eq!(map.list_layers(), vec![BASE_TILE_LAYER_ID.to_string()]);
    }

    #[test]
    fn test_max_bounds_pads_tile_bounds() {
        let factory = MapFactory::default();
        let source = factory.tile_source("提瓦特-base1").unwrap();
        let padded = MapFactory::max_bounds(&source);
        assert_eq!(padded.min, WorldPoint::new(-13568.0, -16286.0));
        assert_eq!(padded.max, WorldPoint::new(18720.0, 19074.0));

        let map = factory.create_map("地下矿区", MapOptions::default()).unwrap();
        assert_eq!(map.viewport().max_bounds(), Some(&padded));
    }

    #[test]
    fn test_unresolvable_area_builds_nothing() {
        let mut areas = HashMap::default();
        areas.insert("bare".to_string(), AreaConfig::default());
        let factory = MapFactory::new(AreaRegistry::new(areas, "bare"));

        assert!(matches!(
            factory.create_map("bare", MapOptions::default()),
            Err(MapError::AreaNotResolved(_))
        ));
        assert!(factory.tile_source("missing").is_none());
    }
}
