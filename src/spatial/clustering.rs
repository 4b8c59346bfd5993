use crate::prelude::HashMap;
use crate::{
    core::{bounds::Bounds, geo::Point},
    spatial::index::{SpatialIndex, SpatialItem},
    Result,
};
use std::fmt::Write;

/// Represents a cluster of markers
#[derive(Debug, Clone)]
pub struct Cluster<T> {
    pub id: String,
    /// Center in projection space
    pub center: Point,
    pub bounds: Bounds,
    pub items: Vec<SpatialItem<T>>,
    /// Zoom level at which this cluster was created
    pub zoom_level: f64,
}

impl<T> Cluster<T> {
    pub fn new(id: String, items: Vec<SpatialItem<T>>, zoom_level: f64) -> Self {
        let bounds = Self::calculate_bounds(&items);
        let center = bounds.center();

        Self {
            id,
            center,
            bounds,
            items,
            zoom_level,
        }
    }

    fn calculate_bounds(items: &[SpatialItem<T>]) -> Bounds {
        let mut iter = items.iter();
        let Some(first) = iter.next() else {
            return Bounds::default();
        };
        iter.fold(first.bounds, |mut acc, item| {
            acc.extend_bounds(&item.bounds);
            acc
        })
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_single(&self) -> bool {
        self.items.len() == 1
    }
}

/// Configuration for clustering
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringConfig {
    /// Zoom level from which every marker is shown individually
    pub disable_clustering_at_zoom: f64,
    /// Maximum number of items in a single cluster
    pub max_cluster_size: usize,
    /// Grid cell edge in screen pixels
    pub grid_size: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            disable_clustering_at_zoom: 2.0,
            max_cluster_size: 100,
            grid_size: 60.0,
        }
    }
}

/// Grid clustering over an R-tree of projected positions
pub struct Clustering<T> {
    config: ClusteringConfig,
    spatial_index: SpatialIndex<T>,
    /// Last query and its result
    cache: Option<(Bounds, f64, Vec<Cluster<T>>)>,
    id_buffer: String,
}

impl<T: Clone> Clustering<T> {
    pub fn new(config: ClusteringConfig) -> Self {
        Self {
            config,
            spatial_index: SpatialIndex::new(),
            cache: None,
            id_buffer: String::with_capacity(32),
        }
    }

    pub fn with_items(config: ClusteringConfig, items: Vec<SpatialItem<T>>) -> Self {
        Self {
            config,
            spatial_index: SpatialIndex::bulk_load(items),
            cache: None,
            id_buffer: String::with_capacity(32),
        }
    }

    pub fn add_item(&mut self, item: SpatialItem<T>) -> Result<()> {
        self.spatial_index.insert(item)?;
        self.cache = None;
        Ok(())
    }

    pub fn remove_item(&mut self, id: &str) -> Result<Option<SpatialItem<T>>> {
        let removed = self.spatial_index.remove(id)?;
        self.cache = None;
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.spatial_index.clear();
        self.cache = None;
    }

    /// Clusters for the visible projection-space rectangle at `zoom`.
    ///
    /// Output is ordered by grid row, then column, so repeated calls draw in
    /// the same order.
    pub fn get_clusters(&mut self, view: &Bounds, zoom: f64) -> Vec<Cluster<T>> {
        if let Some((bounds, cached_zoom, clusters)) = &self.cache {
            if bounds == view && (cached_zoom - zoom).abs() < 0.01 {
                return clusters.clone();
            }
        }

        let mut items: Vec<SpatialItem<T>> =
            self.spatial_index.query(view).into_iter().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));

        let clusters = if zoom >= self.config.disable_clustering_at_zoom {
            items
                .into_iter()
                .map(|item| Cluster::new(item.id.clone(), vec![item], zoom))
                .collect()
        } else {
            self.grid_cluster(items, zoom)
        };

        self.cache = Some((*view, zoom, clusters.clone()));
        clusters
    }

    fn grid_cluster(&mut self, items: Vec<SpatialItem<T>>, zoom: f64) -> Vec<Cluster<T>> {
        // a screen-space cell spans fewer projection units as we zoom in
        let cell = self.config.grid_size / 2f64.powf(zoom);
        let mut grid: HashMap<(i32, i32), Vec<SpatialItem<T>>> = HashMap::default();

        for item in items {
            let center = item.bounds.center();
            let key = ((center.y / cell).floor() as i32, (center.x / cell).floor() as i32);
            grid.entry(key).or_default().push(item);
        }

        let mut cells: Vec<_> = grid.into_iter().collect();
        cells.sort_by_key(|(key, _)| *key);

        let mut clusters = Vec::with_capacity(cells.len());
        for ((row, col), cell_items) in cells {
            if cell_items.len() == 1 {
                clusters.push(Cluster::new(cell_items[0].id.clone(), cell_items, zoom));
                continue;
            }
            for (chunk_index, chunk) in cell_items.chunks(self.config.max_cluster_size.max(1)).enumerate() {
                let id = self.cluster_id(col, row, chunk_index);
                clusters.push(Cluster::new(id, chunk.to_vec(), zoom));
            }
        }
        clusters
    }

    fn cluster_id(&mut self, grid_x: i32, grid_y: i32, chunk: usize) -> String {
        self.id_buffer.clear();
        // writing into a String cannot fail
        let _ = write!(self.id_buffer, "cluster_{grid_x}_{grid_y}_{chunk}");
        self.id_buffer.clone()
    }

    pub fn get_all_items(&self) -> Vec<&SpatialItem<T>> {
        self.spatial_index.all_items()
    }

    pub fn len(&self) -> usize {
        self.spatial_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spatial_index.is_empty()
    }

    pub fn set_config(&mut self, config: ClusteringConfig) {
        self.config = config;
        self.cache = None;
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }
}

impl<T: Clone> Default for Clustering<T> {
    fn default() -> Self {
        Self::new(ClusteringConfig::default())
    }
}
