//! Prelude module for common teyvat-map types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use teyvat_map::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    builder::MapFactory,
    config::{AreaConfig, AreaRegistry, AreaSettings, EngineConfig, ImageLoadingConfig, ResolvedArea},
    crs::CoordinateSystem,
    geo::{Point, TileCoord, WorldBounds, WorldPoint},
    map::{Map, MapOptions},
    viewport::Viewport,
};

pub use crate::layers::{
    base::{LayerTrait, LayerType},
    group::MarkerGroup,
    image::{ImageLayer, IslandOverlay},
    manager::LayerManager,
    marker::{ImageSlot, MarkerImageOptions, MarkerOptions, MarkerPrimitive, MarkerVisualState},
    tile::TileLayer,
};

pub use crate::tiles::{
    cache::{IconEntry, IconStore, MarkerImage},
    loader::{HttpImageFetcher, ImageFetcher},
    source::{TileSource, TileSourceDescriptor},
};

pub use crate::input::{
    events::{InputEvent, MapEvent, MarkerEventKind, MouseButton},
    handler::EventManager,
    pointer::{MarkerKey, PointerTracker},
};

pub use crate::spatial::{
    clustering::{Cluster, Clustering, ClusteringConfig},
    index::{SpatialIndex, SpatialItem},
};

pub use crate::data::{
    cluster::ClusterBuilder,
    geojson::{Feature, GeometryCollection},
};

pub use crate::markers::{
    controller::{MarkerLayerController, RefreshOutcome, RefreshTicket},
    icon::{LegacyIconOptions, PinVariant},
    record::{MarkerQuery, MarkerRecord},
    service::{HttpMarkerService, IconTable, LogNotifier, MarkerService, Notifier},
};

pub use crate::rendering::{
    canvas::{Canvas, Color},
    context::{DrawCommand, RenderContext},
    marker::{DiscMarkerRenderer, MarkerRenderer, MarkerStyle},
};

pub use crate::ui::{
    context_menu::{DomainCommand, InteractionController, MenuCommand, ViewState},
    popup::{Popup, PopupContent, PopupOptions, PopupOwner},
};

pub use crate::{MapError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
