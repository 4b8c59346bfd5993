use crate::{
    constants::{
        DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_VIEW_CENTER, DEFAULT_ZOOM, DEFAULT_ZOOM_DELTA,
        DEFAULT_ZOOM_SNAP,
    },
    core::{
        bounds::Bounds,
        config::{AreaSettings, ResolvedArea},
        crs::CoordinateSystem,
        geo::{Point, WorldBounds, WorldPoint},
        viewport::Viewport,
    },
    input::{
        events::{InputEvent, MapEvent, MarkerEventKind, MouseButton},
        handler::EventManager,
        pointer::{MarkerKey, PointerTracker},
    },
    layers::{base::LayerTrait, group::MarkerGroup, manager::LayerManager, marker::MarkerPrimitive},
    rendering::context::RenderContext,
    ui::popup::{Popup, PopupContent, PopupManager, PopupOptions, PopupOwner},
    Result,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub center: WorldPoint,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_snap: f64,
    pub zoom_delta: f64,
    pub zoom_control: bool,
    pub attribution_control: bool,
    pub dragging: bool,
    pub scroll_wheel_zoom: bool,
    pub tap: bool,
    /// Container size in pixels
    pub size: Point,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: WorldPoint::from_array(DEFAULT_VIEW_CENTER),
            zoom: DEFAULT_ZOOM,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            zoom_snap: DEFAULT_ZOOM_SNAP,
            zoom_delta: DEFAULT_ZOOM_DELTA,
            zoom_control: false,
            attribution_control: false,
            dragging: true,
            scroll_wheel_zoom: true,
            tap: false,
            size: Point::new(800.0, 600.0),
        }
    }
}

impl MapOptions {
    /// Applies an area's viewport overrides; area values win
    pub fn with_area_settings(mut self, settings: &AreaSettings) -> Self {
        if let Some(center) = settings.center {
            self.center = WorldPoint::from_array(center);
        }
        if let Some(zoom) = settings.zoom {
            self.zoom = zoom;
        }

        let number = |key: &str| settings.extra.get(key).and_then(serde_json::Value::as_f64);
        let flag = |key: &str| settings.extra.get(key).and_then(serde_json::Value::as_bool);

        if let Some(v) = number("minZoom") {
            self.min_zoom = v;
        }
        if let Some(v) = number("maxZoom") {
            self.max_zoom = v;
        }
        if let Some(v) = number("zoomSnap") {
            self.zoom_snap = v;
        }
        if let Some(v) = number("zoomDelta") {
            self.zoom_delta = v;
        }
        if let Some(v) = flag("zoomControl") {
            self.zoom_control = v;
        }
        if let Some(v) = flag("attributionControl") {
            self.attribution_control = v;
        }
        if let Some(v) = flag("dragging") {
            self.dragging = v;
        }
        if let Some(v) = flag("scrollWheelZoom") {
            self.scroll_wheel_zoom = v;
        }
        if let Some(v) = flag("tap") {
            self.tap = v;
        }
        self
    }
}

/// A live map: viewport, layers, the single open popup and pointer routing.
pub struct Map {
    area: Option<ResolvedArea>,
    viewport: Viewport,
    options: MapOptions,
    layer_manager: LayerManager,
    event_manager: EventManager,
    popups: PopupManager,
    pointer: PointerTracker,
    hovered: Option<MarkerKey>,
    dragging: bool,
}

impl Map {
    pub fn new(crs: CoordinateSystem, options: MapOptions) -> Self {
        let mut viewport = Viewport::new(crs, options.center, options.zoom, options.size);
        viewport.set_zoom_limits(options.min_zoom, options.max_zoom);
        viewport.set_zoom_steps(options.zoom_snap, options.zoom_delta);
        viewport.set_zoom(options.zoom);

        Self {
            area: None,
            viewport,
            options,
            layer_manager: LayerManager::new(),
            event_manager: EventManager::new(),
            popups: PopupManager::new(),
            pointer: PointerTracker::new(),
            hovered: None,
            dragging: false,
        }
    }

    pub(crate) fn with_area(mut self, area: ResolvedArea) -> Self {
        self.area = Some(area);
        self
    }

    /// Area this map was built for
    pub fn area(&self) -> Option<&ResolvedArea> {
        self.area.as_ref()
    }

    pub fn crs(&self) -> &CoordinateSystem {
        self.viewport.crs()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    /// World rectangle currently on screen
    pub fn bounds(&self) -> WorldBounds {
        self.viewport.bounds()
    }

    pub fn set_max_bounds(&mut self, bounds: Option<WorldBounds>) {
        self.viewport.set_max_bounds(bounds);
    }

    pub fn set_view(&mut self, center: WorldPoint, zoom: f64) {
        let old = (self.viewport.center, self.viewport.zoom);
        self.viewport.set_view(center, zoom);
        self.emit_view_change(old);
    }

    /// Pans by a screen delta and reports the end of the move
    pub fn pan_by(&mut self, delta: Point) {
        let old = (self.viewport.center, self.viewport.zoom);
        self.viewport.pan(delta);
        if self.emit_view_change(old) {
            self.event_manager.emit(MapEvent::MoveEnd {
                center: self.viewport.center,
            });
        }
    }

    pub fn zoom_to(&mut self, zoom: f64, focus: Option<Point>) {
        let old = (self.viewport.center, self.viewport.zoom);
        self.viewport.zoom_to(zoom, focus);
        if self.viewport.zoom != old.1 {
            self.event_manager.emit(MapEvent::ZoomEnd {
                zoom: self.viewport.zoom,
            });
        }
        self.emit_view_change(old);
    }

    fn emit_view_change(&mut self, old: (WorldPoint, f64)) -> bool {
        let changed = self.viewport.center != old.0 || self.viewport.zoom != old.1;
        if changed {
            self.event_manager.emit(MapEvent::ViewChanged {
                center: self.viewport.center,
                zoom: self.viewport.zoom,
            });
        }
        changed
    }

    // --- layers ---------------------------------------------------------------------------------

    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        let layer_id = layer.id().to_string();
        self.layer_manager.add_layer(layer)?;
        self.event_manager.emit(MapEvent::LayerAdd { layer_id });
        Ok(())
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        self.detach_interaction(layer_id);
        let removed = self.layer_manager.remove_layer(layer_id)?;
        self.event_manager.emit(MapEvent::LayerRemove {
            layer_id: layer_id.to_string(),
        });
        Some(removed)
    }

    /// Swaps one layer for another without a frame in between
    pub fn replace_layer(&mut self, old: Option<&str>, new: Box<dyn LayerTrait>) -> Result<()> {
        let new_id = new.id().to_string();
        if let Some(old_id) = old {
            self.detach_interaction(old_id);
        }

        let removed = self.layer_manager.replace_layer(old, new)?;
        if let Some(removed) = removed {
            self.event_manager.emit(MapEvent::LayerRemove {
                layer_id: removed.id().to_string(),
            });
        }
        self.event_manager.emit(MapEvent::LayerAdd { layer_id: new_id });
        Ok(())
    }

    /// Drops popup, hover and press state that points into `layer_id`
    fn detach_interaction(&mut self, layer_id: &str) {
        let owned = matches!(
            self.popups.current().map(|p| &p.owner),
            Some(PopupOwner::Marker(key)) if key.layer_id == layer_id
        );
        if owned {
            if let Some(popup) = self.popups.close() {
                self.event_manager
                    .emit(MapEvent::PopupClose { popup_id: popup.id });
            }
        }
        if self.hovered.as_ref().is_some_and(|k| k.layer_id == layer_id) {
            self.hovered = None;
        }
        self.pointer.forget_layer(layer_id);
    }

    pub fn has_layer(&self, layer_id: &str) -> bool {
        self.layer_manager.contains(layer_id)
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layer_manager.get_layer(layer_id)
    }

    pub fn with_layer_mut<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn LayerTrait) -> R,
    {
        self.layer_manager.with_layer_mut(layer_id, f)
    }

    pub fn list_layers(&self) -> Vec<String> {
        self.layer_manager.list_layers()
    }

    /// Runs `f` on one marker of a marker layer
    pub fn with_marker_mut<F, R>(&mut self, key: &MarkerKey, f: F) -> Option<R>
    where
        F: FnOnce(&mut MarkerPrimitive) -> R,
    {
        self.layer_manager
            .with_layer_mut(&key.layer_id, |layer| {
                layer
                    .as_any_mut()
                    .downcast_mut::<MarkerGroup>()
                    .and_then(|group| group.marker_mut(&key.marker_id))
                    .map(f)
            })
            .flatten()
    }

    pub fn marker(&self, key: &MarkerKey) -> Option<&MarkerPrimitive> {
        self.layer_manager
            .get_layer(&key.layer_id)?
            .as_any()
            .downcast_ref::<MarkerGroup>()?
            .marker(&key.marker_id)
    }

    /// Top-most marker under a screen point across all marker layers
    pub fn marker_at(&self, screen: Point) -> Option<MarkerKey> {
        let mut hit = None;
        let viewport = &self.viewport;
        self.layer_manager.for_each_layer(|layer| {
            if !layer.is_visible() {
                return;
            }
            if let Some(group) = layer.as_any().downcast_ref::<MarkerGroup>() {
                if let Some(marker_id) = group.marker_at(screen, viewport) {
                    hit = Some(MarkerKey::new(layer.id(), marker_id));
                }
            }
        });
        hit
    }

    // --- events ---------------------------------------------------------------------------------

    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.event_manager.on(event_type, callback);
    }

    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.event_manager.process_events()
    }

    fn emit_marker(&mut self, key: &MarkerKey, kind: MarkerEventKind) {
        self.event_manager.emit(MapEvent::Marker {
            key: key.clone(),
            kind,
        });
    }

    // --- popups ---------------------------------------------------------------------------------

    /// Opens a popup, closing whatever was open before.
    ///
    /// The previous owner is told its popup closed unless it is the same
    /// owner reopening.
    pub fn open_popup(
        &mut self,
        anchor: WorldPoint,
        content: PopupContent,
        options: PopupOptions,
        owner: PopupOwner,
    ) -> String {
        let same_owner = self.popups.current().is_some_and(|p| p.owner == owner);
        let (popup_id, replaced) = self.popups.open(anchor, content, options, owner);

        if let Some(previous) = replaced {
            self.event_manager.emit(MapEvent::PopupClose {
                popup_id: previous.id.clone(),
            });
            if !same_owner {
                self.notify_popup_closed(&previous.owner);
            }
        }
        self.event_manager.emit(MapEvent::PopupOpen {
            popup_id: popup_id.clone(),
        });
        popup_id
    }

    pub fn close_popup(&mut self) -> Option<Popup> {
        let popup = self.popups.close()?;
        self.event_manager.emit(MapEvent::PopupClose {
            popup_id: popup.id.clone(),
        });
        self.notify_popup_closed(&popup.owner);
        Some(popup)
    }

    /// Closes the popup only while it is still `popup_id`
    pub fn close_popup_if(&mut self, popup_id: &str) -> bool {
        if self.popups.is_open(popup_id) {
            self.close_popup().is_some()
        } else {
            false
        }
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popups.current()
    }

    pub fn popups(&self) -> &PopupManager {
        &self.popups
    }

    fn notify_popup_closed(&mut self, owner: &PopupOwner) {
        if let PopupOwner::Marker(key) = owner {
            if self.with_marker_mut(key, |m| m.on_popup_close()).is_some() {
                self.emit_marker(key, MarkerEventKind::PopupClose);
            }
        }
    }

    // --- input ----------------------------------------------------------------------------------

    pub fn handle_input(&mut self, input: &InputEvent) -> Result<()> {
        match input {
            InputEvent::PointerDown {
                position,
                button: MouseButton::Left,
            } => {
                if let Some(key) = self.marker_at(*position) {
                    self.with_marker_mut(&key, |m| m.on_mouse_down());
                    self.pointer.register(key.clone());
                    self.emit_marker(&key, MarkerEventKind::MouseDown);
                }
            }
            InputEvent::PointerUp { .. } => {
                for key in self.pointer.release() {
                    if self.with_marker_mut(&key, |m| m.on_pointer_up()).is_some() {
                        self.emit_marker(&key, MarkerEventKind::PointerUp);
                    }
                }
            }
            InputEvent::Click {
                position,
                button: MouseButton::Left,
            } => self.click(*position),
            InputEvent::Click {
                position,
                button: MouseButton::Right,
            } => {
                let world = self.viewport.screen_to_world(position);
                self.event_manager.emit(MapEvent::ContextMenu {
                    world,
                    pixel: *position,
                });
            }
            InputEvent::MouseMove { position } => self.hover(*position),
            InputEvent::DragStart { .. } => {
                self.dragging = self.options.dragging;
            }
            InputEvent::Drag { delta } => {
                if self.dragging {
                    let old = (self.viewport.center, self.viewport.zoom);
                    self.viewport.pan(*delta);
                    self.emit_view_change(old);
                }
            }
            InputEvent::DragEnd => {
                if std::mem::take(&mut self.dragging) {
                    self.event_manager.emit(MapEvent::MoveEnd {
                        center: self.viewport.center,
                    });
                }
            }
            InputEvent::Scroll { delta, position } => {
                if self.options.scroll_wheel_zoom {
                    self.zoom_to(self.viewport.zoom + delta, Some(*position));
                }
            }
            InputEvent::Resize { size } => {
                let old = (self.viewport.center, self.viewport.zoom);
                self.viewport.set_size(*size);
                self.emit_view_change(old);
            }
            _ => {}
        }

        let mut result = Ok(());
        self.layer_manager.for_each_layer_mut(|layer| {
            if result.is_ok() {
                result = layer.handle_input(input);
            }
        });
        result
    }

    fn click(&mut self, position: Point) {
        let Some(key) = self.marker_at(position) else {
            // clicking the bare map closes any popup
            self.close_popup();
            let world = self.viewport.screen_to_world(&position);
            self.event_manager.emit(MapEvent::Click {
                world,
                pixel: position,
            });
            return;
        };

        self.emit_marker(&key, MarkerEventKind::Click);
        let opened = self
            .with_marker_mut(&key, |m| m.on_click().map(|content| (content, m.position())))
            .flatten();
        if let Some((content, anchor)) = opened {
            self.open_popup(anchor, content, PopupOptions::marker(), PopupOwner::Marker(key));
        }
    }

    fn hover(&mut self, position: Point) {
        let hit = self.marker_at(position);
        if hit != self.hovered {
            if let Some(old) = self.hovered.take() {
                if self.with_marker_mut(&old, |m| m.on_mouse_out()).is_some() {
                    self.emit_marker(&old, MarkerEventKind::MouseOut);
                }
            }
            if let Some(new) = &hit {
                self.with_marker_mut(new, |m| m.on_mouse_over());
                self.emit_marker(new, MarkerEventKind::MouseOver);
            }
            self.hovered = hit;
        }

        let world = self.viewport.screen_to_world(&position);
        self.event_manager.emit(MapEvent::MouseMove {
            world,
            pixel: position,
        });
    }

    /// Markers currently held by a pointer press
    pub fn pressed_markers(&self) -> usize {
        self.pointer.pending()
    }

    // --- frame ----------------------------------------------------------------------------------

    /// Advances layer state (icon loads). True when a repaint is needed.
    pub fn update(&mut self) -> Result<bool> {
        self.layer_manager.update(&self.viewport)
    }

    /// Records one frame into `context`
    pub fn render(&mut self, context: &mut RenderContext) -> Result<()> {
        context.begin_frame();
        context.set_clip_bounds(Bounds::from_coords(
            0.0,
            0.0,
            self.viewport.size.x,
            self.viewport.size.y,
        ));
        let result = self.layer_manager.render(context, &self.viewport);
        context.clear_clip_bounds();
        result
    }
}
