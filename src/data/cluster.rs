//! Records to features, features to a clustered marker layer.

use crate::{
    core::crs::CoordinateSystem,
    data::geojson::{Feature, FeatureProperties, Geometry, GeometryCollection},
    layers::{group::MarkerGroup, marker::MarkerOptions, marker::MarkerPrimitive},
    markers::{
        icon::{LegacyIconOptions, PinVariant},
        record::MarkerRecord,
    },
    rendering::marker::MarkerRenderer,
    spatial::clustering::ClusteringConfig,
    tiles::cache::IconStore,
};
use std::sync::Arc;

/// Builds marker layers from fetched records.
///
/// The builder only translates geometry; how markers aggregate on screen is
/// left to the layer's [`ClusteringConfig`].
pub struct ClusterBuilder {
    icons: Arc<IconStore>,
    renderer: Arc<dyn MarkerRenderer>,
    clustering: Option<ClusteringConfig>,
}

impl ClusterBuilder {
    pub fn new(icons: Arc<IconStore>, renderer: Arc<dyn MarkerRenderer>) -> Self {
        Self {
            icons,
            renderer,
            clustering: Some(ClusteringConfig::default()),
        }
    }

    /// `None` keeps every marker individual at all zooms
    pub fn with_clustering(mut self, clustering: Option<ClusteringConfig>) -> Self {
        self.clustering = clustering;
        self
    }

    /// One point feature per record with a usable position.
    ///
    /// Records whose position cannot be parsed are logged and left out.
    pub fn to_geometry_collection(records: &[MarkerRecord]) -> GeometryCollection {
        let features = records
            .iter()
            .filter_map(|record| match record.world_position() {
                Ok(position) => Some(Feature {
                    geometry: Geometry::point(position),
                    properties: FeatureProperties {
                        pop_title: record.title.clone(),
                        popup_content: record.content.clone(),
                    },
                    data: record.clone(),
                }),
                Err(e) => {
                    log::warn!("skipping marker {}: {e}", record.id);
                    None
                }
            })
            .collect();
        GeometryCollection { features }
    }

    /// Materializes one canvas marker per feature inside a new layer.
    ///
    /// `icon_url` picks the icon for each record.
    pub fn to_clustered_layer<F>(
        &self,
        layer_id: impl Into<String>,
        collection: &GeometryCollection,
        crs: CoordinateSystem,
        icon_url: F,
    ) -> MarkerGroup
    where
        F: Fn(&MarkerRecord) -> Option<String>,
    {
        let mut group = MarkerGroup::new(
            layer_id.into(),
            crs,
            Arc::clone(&self.icons),
            Arc::clone(&self.renderer),
        );

        for feature in &collection.features {
            let position = feature.position();
            let mut options = MarkerOptions::for_record(icon_url(&feature.data), position);
            options.image.hidden_flag = feature.data.hidden_flag;

            let marker = MarkerPrimitive::new(feature.data.marker_id(), position, options, &crs)
                .with_popup(
                    feature.properties.pop_title.clone(),
                    feature.properties.popup_content.clone(),
                )
                .with_record(feature.data.clone());

            if let Err(e) = group.add_marker(marker) {
                log::warn!("{e}");
            }
        }

        match &self.clustering {
            Some(config) => group.with_clustering(config.clone()),
            None => group,
        }
    }

    /// Pin icon options for the DOM marker style, one per feature
    pub fn legacy_icons(collection: &GeometryCollection, variant: PinVariant) -> Vec<LegacyIconOptions> {
        collection
            .features
            .iter()
            .map(|f| LegacyIconOptions::new(f.data.id, f.data.icon.clone(), variant))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::geo::WorldPoint,
        rendering::marker::DiscMarkerRenderer,
        tiles::cache::tests::InstantFetcher,
    };

    fn record(id: u64, position: Option<&str>) -> MarkerRecord {
        MarkerRecord {
            id,
            position: position.map(str::to_string),
            title: format!("title {id}"),
            content: format!("content {id}"),
            icon: Some(format!("https://icons/{id}.png")),
            hidden_flag: Some(0),
            ..MarkerRecord::default()
        }
    }

    fn builder() -> ClusterBuilder {
        let icons = Arc::new(IconStore::new(Arc::new(InstantFetcher::default()), 8));
        ClusterBuilder::new(icons, Arc::new(DiscMarkerRenderer::default()))
    }

    #[test]
    fn test_geometry_collection_skips_bad_positions() {
        let records = vec![
            record(1, Some("100,200")),
            record(2, Some("not a point")),
            record(3, None),
        ];
        let collection = ClusterBuilder::to_geometry_collection(&records);

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.features[0].position(), WorldPoint::new(100.0, 200.0));
        assert_eq!(collection.features[0].properties.pop_title, "title 1");
        assert_eq!(collection.features[1].data.id, 3);
        assert_eq!(collection.features[1].position(), WorldPoint::new(0.0, 0.0));
    }

    #[test]
    fn test_clustered_layer_carries_records() {
        let records = vec![record(1, Some("0,0")), record(2, Some("50,50"))];
        let collection = ClusterBuilder::to_geometry_collection(&records);
        let crs = CoordinateSystem::new([3568.0, 6286.0]);

        let layer = builder().to_clustered_layer("markers-1", &collection, crs, |r| r.icon.clone());

        assert!(layer.is_clustered());
        assert_eq!(layer.len(), 2);
        let marker = layer.marker("2").unwrap();
        assert_eq!(marker.position(), WorldPoint::new(50.0, 50.0));
        assert_eq!(marker.icon_url(), Some("https://icons/2.png"));
        assert_eq!(marker.rotation(), 0.0);
        assert_eq!(marker.radius(), 16.0);
        assert_eq!(marker.record().map(|r| r.id), Some(2));
        assert!(matches!(
            marker.popup(),
            Some(crate::ui::popup::PopupContent::Marker { title, .. }) if title == "title 2"
        ));
    }

    #[test]
    fn test_duplicate_records_keep_first() {
        let records = vec![record(1, Some("0,0")), record(1, Some("9,9"))];
        let collection = ClusterBuilder::to_geometry_collection(&records);
        let layer = builder()
            .with_clustering(None)
            .to_clustered_layer("m", &collection, CoordinateSystem::new([0.0, 0.0]), |_| None);
        assert_eq!(layer.len(), 1);
        assert!(!layer.is_clustered());
        assert_eq!(layer.marker("1").unwrap().position(), WorldPoint::new(0.0, 0.0));
    }

    #[test]
    fn test_legacy_icons_follow_records() {
        let collection = ClusterBuilder::to_geometry_collection(&[record(5, Some("1,1"))]);
        let icons = ClusterBuilder::legacy_icons(&collection, PinVariant::Off);
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].class_name, "mark-5");
        assert_eq!(icons[0].icon_url.as_deref(), Some("https://icons/5.png"));
    }
}
