//! Keeps a map's marker layer in step with remote marker data.
//!
//! Two inputs have to arrive before markers can be built: the icon table and
//! the marker records. [`MarkerLayerController`] gates construction on both
//! with a single pending slot. The first signal only arms it; every signal
//! after that rebuilds the layer. Each rebuild swaps the previous layer out
//! in one step so the map never shows both or neither.

use crate::{
    core::map::Map,
    data::cluster::ClusterBuilder,
    markers::{
        record::{MarkerQuery, MarkerRecord},
        service::{IconTable, LogNotifier, MarkerService, Notifier},
    },
    Result,
};
use std::sync::Arc;

/// Message shown when a marker fetch fails
pub const FETCH_FAILED_MESSAGE: &str = "Failed to load markers";

/// Identifies one marker fetch. Only the newest ticket's result is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshTicket {
    generation: u64,
    query: MarkerQuery,
}

impl RefreshTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &MarkerQuery {
        &self.query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Records stored; `built` tells whether the layer was rebuilt
    Applied { built: bool },
    /// Fetch failed; the marker list was emptied
    Failed { built: bool },
    /// A newer refresh started before this one finished
    Stale,
}

pub struct MarkerLayerController {
    service: Arc<dyn MarkerService>,
    notifier: Arc<dyn Notifier>,
    builder: ClusterBuilder,
    icons: IconTable,
    selected_icon_tag: Option<String>,
    records: Vec<MarkerRecord>,
    /// Set by the first readiness signal
    armed: bool,
    generation: u64,
    loading: bool,
    layer_id: Option<String>,
    builds: usize,
}

impl MarkerLayerController {
    pub fn new(service: Arc<dyn MarkerService>, builder: ClusterBuilder) -> Self {
        Self {
            service,
            notifier: Arc::new(LogNotifier),
            builder,
            icons: IconTable::default(),
            selected_icon_tag: None,
            records: Vec::new(),
            armed: false,
            generation: 0,
            loading: false,
            layer_id: None,
            builds: 0,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Icon tag of the currently selected item; its icon is used for every marker
    pub fn set_selected_icon_tag(&mut self, tag: Option<String>) {
        self.selected_icon_tag = tag;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Number of times the layer has been built
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn records(&self) -> &[MarkerRecord] {
        &self.records
    }

    pub fn icons(&self) -> &IconTable {
        &self.icons
    }

    /// Id of the marker layer currently on the map
    pub fn layer_id(&self) -> Option<&str> {
        self.layer_id.as_deref()
    }

    // --- icons ----------------------------------------------------------------------------------

    /// Stores the icon table and counts it as one readiness signal
    pub fn apply_icons(&mut self, icons: IconTable, map: &mut Map) -> Result<bool> {
        log::debug!("icon table ready ({} entries)", icons.len());
        self.icons = icons;
        self.signal_ready(map)
    }

    pub async fn load_icons(&mut self, map: &mut Map) -> Result<bool> {
        match self.service.list_icons().await {
            Ok(icons) => self.apply_icons(icons, map),
            Err(e) => {
                log::error!("icon list failed: {e}");
                Err(e)
            }
        }
    }

    // --- records --------------------------------------------------------------------------------

    /// Starts a refresh for `query`, superseding any refresh still in flight
    pub fn begin_refresh(&mut self, query: MarkerQuery) -> RefreshTicket {
        self.generation += 1;
        self.loading = true;
        RefreshTicket {
            generation: self.generation,
            query,
        }
    }

    /// Fetches the records for a ticket. Queries without item ids resolve
    /// to an empty list without touching the service.
    pub async fn fetch(&self, ticket: &RefreshTicket) -> Result<Vec<MarkerRecord>> {
        if ticket.query.is_empty() {
            log::debug!("refresh {} has no item ids", ticket.generation);
            return Ok(Vec::new());
        }
        self.service.search_markers(&ticket.query).await
    }

    /// Applies a fetch result unless a newer refresh has started since
    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<MarkerRecord>>,
        map: &mut Map,
    ) -> Result<RefreshOutcome> {
        if ticket.generation != self.generation {
            log::debug!(
                "dropping refresh {} superseded by {}",
                ticket.generation,
                self.generation
            );
            return Ok(RefreshOutcome::Stale);
        }
        self.loading = false;

        match result {
            Ok(records) => {
                log::debug!("refresh {} got {} records", ticket.generation, records.len());
                self.records = records;
                let built = self.signal_ready(map)?;
                Ok(RefreshOutcome::Applied { built })
            }
            Err(e) => {
                log::warn!("marker fetch failed: {e}");
                self.records.clear();
                self.notifier.error(FETCH_FAILED_MESSAGE);
                let built = self.signal_ready(map)?;
                Ok(RefreshOutcome::Failed { built })
            }
        }
    }

    /// Fetches and applies in one go
    pub async fn refresh(&mut self, query: MarkerQuery, map: &mut Map) -> Result<RefreshOutcome> {
        let ticket = self.begin_refresh(query);
        let result = self.fetch(&ticket).await;
        self.finish_refresh(ticket, result, map)
    }

    // --- building -------------------------------------------------------------------------------

    fn signal_ready(&mut self, map: &mut Map) -> Result<bool> {
        if !self.armed {
            self.armed = true;
            return Ok(false);
        }
        self.build(map)?;
        Ok(true)
    }

    fn icon_url(&self, record: &MarkerRecord) -> Option<String> {
        self.selected_icon_tag
            .as_ref()
            .or(record.icon_tag.as_ref())
            .and_then(|tag| self.icons.get(tag).cloned())
            .or_else(|| record.icon.clone())
    }

    fn build(&mut self, map: &mut Map) -> Result<()> {
        let collection = ClusterBuilder::to_geometry_collection(&self.records);
        let layer_id = format!("markers-{}", self.builds + 1);
        let layer = self.builder.to_clustered_layer(
            layer_id.as_str(),
            &collection,
            *map.crs(),
            |record| self.icon_url(record),
        );

        map.replace_layer(self.layer_id.as_deref(), Box::new(layer))?;
        log::info!(
            "marker layer {layer_id} built with {} markers",
            collection.len()
        );
        self.layer_id = Some(layer_id);
        self.builds += 1;
        Ok(())
    }

    /// Removes the marker layer from `map`
    pub fn detach(&mut self, map: &mut Map) {
        if let Some(id) = self.layer_id.take() {
            map.remove_layer(&id);
        }
    }
}
