use crate::core::geo::{Point, WorldPoint};
use crate::input::pointer::MarkerKey;
use serde::{Deserialize, Serialize};

/// Raw input events fed to the map by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Single click/tap
    Click {
        position: Point,
        button: MouseButton,
    },
    /// Button pressed
    PointerDown {
        position: Point,
        button: MouseButton,
    },
    /// Button released anywhere on the page
    PointerUp { position: Point },
    /// Mouse/finger move
    MouseMove { position: Point },
    /// Start of drag operation
    DragStart { position: Point },
    /// Drag in progress
    Drag { delta: Point },
    /// End of drag operation
    DragEnd,
    /// Scroll wheel or pinch zoom, in zoom levels (positive zooms in)
    Scroll { delta: f64, position: Point },
    /// Viewport/window resize
    Resize { size: Point },
}

/// Mouse button types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Marker-scoped pointer notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerEventKind {
    Click,
    MouseDown,
    PointerUp,
    MouseOver,
    MouseOut,
    PopupClose,
}

impl MarkerEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerEventKind::Click => "click",
            MarkerEventKind::MouseDown => "mousedown",
            MarkerEventKind::PointerUp => "pointerup",
            MarkerEventKind::MouseOver => "mouseover",
            MarkerEventKind::MouseOut => "mouseout",
            MarkerEventKind::PopupClose => "popupclose",
        }
    }
}

/// Map event types that can be emitted by the map
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Map view has changed (center, zoom, or size)
    ViewChanged { center: WorldPoint, zoom: f64 },
    /// Left click on empty map
    Click { world: WorldPoint, pixel: Point },
    /// Right click on the map
    ContextMenu { world: WorldPoint, pixel: Point },
    /// Mouse/touch move over the map
    MouseMove { world: WorldPoint, pixel: Point },
    /// Zoom ended
    ZoomEnd { zoom: f64 },
    /// Pan ended
    MoveEnd { center: WorldPoint },
    /// Layer was added to the map
    LayerAdd { layer_id: String },
    /// Layer was removed from the map
    LayerRemove { layer_id: String },
    /// A popup was opened on the map
    PopupOpen { popup_id: String },
    /// A popup was closed
    PopupClose { popup_id: String },
    /// Pointer interaction with a single marker
    Marker { key: MarkerKey, kind: MarkerEventKind },
}

impl MapEvent {
    /// Listener key used by [`crate::input::handler::EventManager::on`]
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::ViewChanged { .. } => "viewchanged",
            MapEvent::Click { .. } => "click",
            MapEvent::ContextMenu { .. } => "contextmenu",
            MapEvent::MouseMove { .. } => "mousemove",
            MapEvent::ZoomEnd { .. } => "zoomend",
            MapEvent::MoveEnd { .. } => "moveend",
            MapEvent::LayerAdd { .. } => "layeradd",
            MapEvent::LayerRemove { .. } => "layerremove",
            MapEvent::PopupOpen { .. } => "popupopen",
            MapEvent::PopupClose { .. } => "popupclose",
            MapEvent::Marker { .. } => "marker",
        }
    }
}

impl InputEvent {
    /// Gets the primary position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::Click { position, .. }
            | InputEvent::PointerDown { position, .. }
            | InputEvent::PointerUp { position }
            | InputEvent::MouseMove { position }
            | InputEvent::DragStart { position }
            | InputEvent::Scroll { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Checks if this is a mouse/pointer event
    pub fn is_pointer_event(&self) -> bool {
        !matches!(self, InputEvent::Resize { .. })
    }
}
