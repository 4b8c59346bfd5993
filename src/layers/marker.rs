//! Canvas marker primitive.
//!
//! A [`MarkerPrimitive`] carries two independent pieces of state: the load
//! state of its icon ([`ImageSlot`]) and the interaction flags set by pointer
//! hooks. Every hook mutates state and then calls [`MarkerPrimitive::redraw`]
//! exactly once; the owning layer picks dirty markers up on its next frame.

use crate::{
    constants::{
        MARKER_ACTIVE_SHRINK, MARKER_BASE_ROTATION, MARKER_BEARING_CORRECTION,
        MARKER_FALLBACK_SIZE, MARKER_ICON_SIZE, MARKER_POPPER_GROW,
    },
    core::{
        crs::CoordinateSystem,
        geo::{Point, WorldPoint},
    },
    markers::record::MarkerRecord,
    rendering::{
        canvas::Canvas,
        marker::{MarkerDrawParams, MarkerRenderer},
    },
    tiles::cache::{IconEntry, IconStore, MarkerImage},
    ui::popup::PopupContent,
};
use std::sync::Arc;

/// Load state of a marker's icon
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ImageSlot {
    #[default]
    Unloaded,
    Loading,
    Loaded(Arc<MarkerImage>),
    /// Load failed; the marker stays invisible until reset
    Errored,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerVisualState {
    pub hover: bool,
    pub active: bool,
    pub popper_open: bool,
    pub image: ImageSlot,
}

impl MarkerVisualState {
    /// True once the icon bitmap is available
    pub fn finished(&self) -> bool {
        matches!(self.image, ImageSlot::Loaded(_))
    }

    /// Icon size after interaction adjustments. `active` wins over `popper_open`.
    pub fn visual_size(&self, base: (f64, f64)) -> (f64, f64) {
        let (w, h) = base;
        if self.active {
            (w - MARKER_ACTIVE_SHRINK, h - MARKER_ACTIVE_SHRINK)
        } else if self.popper_open {
            (w + MARKER_POPPER_GROW, h + MARKER_POPPER_GROW)
        } else {
            (w, h)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerImageOptions {
    pub url: Option<String>,
    pub size: (f64, f64),
    /// Base rotation in degrees
    pub rotate: f64,
    pub offset: Point,
    pub hidden_flag: Option<i32>,
}

impl Default for MarkerImageOptions {
    fn default() -> Self {
        Self {
            url: None,
            size: MARKER_FALLBACK_SIZE,
            rotate: 0.0,
            offset: Point::new(0.0, 0.0),
            hidden_flag: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerOptions {
    pub image: MarkerImageOptions,
    /// Previous position; when set the icon is turned to face away from it
    pub prev_position: Option<WorldPoint>,
    /// Hit radius; derived from the icon size when absent
    pub radius: Option<f64>,
}

impl MarkerOptions {
    /// Options used for markers built from fetched records
    pub fn for_record(url: Option<String>, position: WorldPoint) -> Self {
        Self {
            image: MarkerImageOptions {
                url,
                size: MARKER_ICON_SIZE,
                rotate: MARKER_BASE_ROTATION,
                ..MarkerImageOptions::default()
            },
            prev_position: Some(position),
            radius: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarkerPrimitive {
    id: String,
    position: WorldPoint,
    options: MarkerOptions,
    /// Effective rotation in degrees, fixed at construction
    rotation: f64,
    radius: f64,
    state: MarkerVisualState,
    popup: Option<PopupContent>,
    record: Option<MarkerRecord>,
    dirty: bool,
    redraw_count: u64,
}

impl MarkerPrimitive {
    pub fn new(
        id: impl Into<String>,
        position: WorldPoint,
        options: MarkerOptions,
        crs: &CoordinateSystem,
    ) -> Self {
        let (w, h) = options.image.size;
        let radius = options.radius.unwrap_or_else(|| (w.max(h) / 2.0).ceil());

        let mut rotation = options.image.rotate;
        if let Some(prev) = options.prev_position {
            rotation += crs.bearing(&prev, &position) + MARKER_BEARING_CORRECTION;
        }

        Self {
            id: id.into(),
            position,
            options,
            rotation,
            radius,
            state: MarkerVisualState::default(),
            popup: None,
            record: None,
            dirty: false,
            redraw_count: 0,
        }
    }

    pub fn with_popup(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.popup = Some(PopupContent::Marker {
            title: title.into(),
            content: content.into(),
        });
        self
    }

    pub fn with_record(mut self, record: MarkerRecord) -> Self {
        self.record = Some(record);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> WorldPoint {
        self.position
    }

    pub fn options(&self) -> &MarkerOptions {
        &self.options
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn state(&self) -> &MarkerVisualState {
        &self.state
    }

    pub fn popup(&self) -> Option<&PopupContent> {
        self.popup.as_ref()
    }

    pub fn record(&self) -> Option<&MarkerRecord> {
        self.record.as_ref()
    }

    pub fn icon_url(&self) -> Option<&str> {
        self.options.image.url.as_deref()
    }

    /// Paints the marker at `screen`.
    ///
    /// The first call on an unloaded marker starts the icon fetch; nothing is
    /// painted until the icon has been decoded. Returns whether anything was
    /// drawn.
    pub fn draw(
        &mut self,
        canvas: &mut dyn Canvas,
        renderer: &dyn MarkerRenderer,
        icons: &IconStore,
        screen: Point,
    ) -> bool {
        if self.state.image == ImageSlot::Unloaded {
            let Some(url) = self.options.image.url.as_deref() else {
                return false;
            };
            icons.request(url);
            self.state.image = ImageSlot::Loading;
            // another marker may already have loaded the same icon
            self.apply_icon_status(icons);
        }

        let ImageSlot::Loaded(image) = &self.state.image else {
            return false;
        };
        let image = Arc::clone(image);
        let params = MarkerDrawParams {
            position: screen,
            offset: self.options.image.offset,
            size: self.options.image.size,
            rotation: self.rotation,
            image: &image,
            state: &self.state,
        };
        renderer.draw_marker(canvas, &params);
        self.dirty = false;
        true
    }

    /// Picks up a finished icon load. Returns true when the image state changed.
    pub fn poll_image(&mut self, icons: &IconStore) -> bool {
        if !self.apply_icon_status(icons) {
            return false;
        }
        if self.state.finished() {
            self.redraw();
        }
        true
    }

    fn apply_icon_status(&mut self, icons: &IconStore) -> bool {
        if self.state.image != ImageSlot::Loading {
            return false;
        }
        let Some(url) = self.options.image.url.as_deref() else {
            return false;
        };

        match icons.status(url) {
            Some(IconEntry::Ready(image)) => {
                self.state.image = ImageSlot::Loaded(image);
                true
            }
            Some(IconEntry::Failed) => {
                log::debug!("marker {} disabled, icon {url} failed", self.id);
                self.state.image = ImageSlot::Errored;
                true
            }
            Some(IconEntry::Loading) => false,
            None => {
                // evicted while in flight
                self.state.image = ImageSlot::Unloaded;
                true
            }
        }
    }

    /// Drops the icon so the next draw fetches it again
    pub fn reset_image(&mut self) {
        self.state.image = ImageSlot::Unloaded;
        self.redraw();
    }

    /// Whether the screen point `pointer` falls on a marker anchored at `screen`
    pub fn contains_screen_point(&self, screen: Point, pointer: Point) -> bool {
        let offset = self.options.image.offset;
        let center = screen.round().add(&offset);
        center.distance_to(&pointer) <= self.radius
    }

    /// Requests a repaint of this marker only
    pub fn redraw(&mut self) {
        self.dirty = true;
        self.redraw_count += 1;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Number of repaint requests so far
    pub fn redraw_count(&self) -> u64 {
        self.redraw_count
    }

    /// Opens the marker's popup. Markers without popup content stay closed.
    pub fn on_click(&mut self) -> Option<PopupContent> {
        let content = self.popup.clone()?;
        self.state.popper_open = true;
        self.redraw();
        Some(content)
    }

    pub fn on_popup_close(&mut self) {
        self.state.popper_open = false;
        self.redraw();
    }

    /// Pressed; stays active until the pointer is released anywhere
    pub fn on_mouse_down(&mut self) {
        self.state.active = true;
        self.redraw();
    }

    pub fn on_pointer_up(&mut self) {
        self.state.active = false;
        self.redraw();
    }

    pub fn on_mouse_over(&mut self) {
        self.state.hover = true;
        self.redraw();
    }

    pub fn on_mouse_out(&mut self) {
        self.state.hover = false;
        self.redraw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rendering::{
            context::{DrawCommand, RenderContext},
            marker::DiscMarkerRenderer,
        },
        tiles::cache::tests::InstantFetcher,
    };

    fn crs() -> CoordinateSystem {
        CoordinateSystem::new([0.0, 0.0])
    }

    fn icons() -> IconStore {
        IconStore::new(Arc::new(InstantFetcher::default()), 16)
    }

    fn marker(url: &str) -> MarkerPrimitive {
        let pos = WorldPoint::new(10.0, 20.0);
        MarkerPrimitive::new("m1", pos, MarkerOptions::for_record(Some(url.into()), pos), &crs())
            .with_popup("Anemoculus", "<p>on the cliff</p>")
    }

    #[test]
    fn test_record_defaults() {
        let m = marker("https://icons/a.png");
        assert_eq!(m.options().image.size, (32.0, 32.0));
        assert_eq!(m.radius(), 16.0);
        // rotate 90 facing itself cancels the -90 correction
        assert_eq!(m.rotation(), 0.0);
        assert_eq!(m.state(), &MarkerVisualState::default());
        assert!(!m.is_dirty());
    }

    #[test]
    fn test_bearing_rotation() {
        let options = MarkerOptions {
            prev_position: Some(WorldPoint::new(0.0, 0.0)),
            ..MarkerOptions::default()
        };
        let m = MarkerPrimitive::new("m", WorldPoint::new(0.0, 10.0), options, &crs());
        // from (0,0) to (0,10): atan2(-10, 0) = -90
        assert!((m.rotation() - -180.0).abs() < 1e-9);
        assert_eq!(m.radius(), 20.0);
    }

    #[test]
    fn test_active_wins_over_popper_open() {
        let state = MarkerVisualState {
            active: true,
            popper_open: true,
            ..Default::default()
        };
        assert_eq!(state.visual_size((32.0, 32.0)), (30.0, 30.0));

        let state = MarkerVisualState {
            popper_open: true,
            ..Default::default()
        };
        assert_eq!(state.visual_size((32.0, 32.0)), (36.0, 36.0));
    }

    #[test]
    fn test_first_draw_starts_load_and_paints_nothing() {
        let icons = icons();
        let mut m = marker("https://icons/a.png");
        let mut ctx = RenderContext::new(100, 100);
        let renderer = DiscMarkerRenderer::default();

        assert!(!m.draw(&mut ctx, &renderer, &icons, Point::new(50.0, 50.0)));
        assert!(ctx.commands().is_empty());
        assert_eq!(m.state().image, ImageSlot::Loading);

        assert_eq!(icons.poll(), 1);
        assert!(m.poll_image(&icons));
        assert!(m.state().finished());
        assert!(m.is_dirty());

        assert!(m.draw(&mut ctx, &renderer, &icons, Point::new(50.0, 50.0)));
        assert!(ctx
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Image { .. })));
        assert!(!m.is_dirty());
    }

    #[test]
    fn test_failed_icon_disables_marker_until_reset() {
        let icons = icons();
        let mut m = marker("https://icons/missing.png");
        let mut ctx = RenderContext::new(100, 100);
        let renderer = DiscMarkerRenderer::default();

        m.draw(&mut ctx, &renderer, &icons, Point::new(0.0, 0.0));
        icons.poll();
        assert!(m.poll_image(&icons));
        assert_eq!(m.state().image, ImageSlot::Errored);

        // stays dark, no new request
        assert!(!m.draw(&mut ctx, &renderer, &icons, Point::new(0.0, 0.0)));
        assert!(ctx.commands().is_empty());

        m.reset_image();
        assert_eq!(m.state().image, ImageSlot::Unloaded);
    }

    #[test]
    fn test_cached_icon_draws_immediately() {
        let icons = icons();
        let mut first = marker("https://icons/a.png");
        let mut second = marker("https://icons/a.png");
        let mut ctx = RenderContext::new(100, 100);
        let renderer = DiscMarkerRenderer::default();

        first.draw(&mut ctx, &renderer, &icons, Point::new(0.0, 0.0));
        icons.poll();
        assert!(second.draw(&mut ctx, &renderer, &icons, Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_each_hook_redraws_once() {
        let mut m = marker("https://icons/a.png");
        let before = m.redraw_count();

        assert!(m.on_click().is_some());
        assert!(m.state().popper_open);
        m.on_popup_close();
        assert!(!m.state().popper_open);
        m.on_mouse_down();
        assert!(m.state().active);
        m.on_pointer_up();
        assert!(!m.state().active);
        m.on_mouse_over();
        assert!(m.state().hover);
        m.on_mouse_out();
        assert!(!m.state().hover);

        assert_eq!(m.redraw_count() - before, 6);
    }

    #[test]
    fn test_click_without_popup_is_inert() {
        let pos = WorldPoint::new(0.0, 0.0);
        let mut m = MarkerPrimitive::new("bare", pos, MarkerOptions::default(), &crs());
        assert!(m.on_click().is_none());
        assert!(!m.state().popper_open);
        assert_eq!(m.redraw_count(), 0);
    }

    #[test]
    fn test_hit_test_uses_radius_and_offset() {
        let mut m = marker("u");
        assert!(m.contains_screen_point(Point::new(50.0, 50.0), Point::new(60.0, 50.0)));
        assert!(!m.contains_screen_point(Point::new(50.0, 50.0), Point::new(67.0, 50.0)));

        m.options.image.offset = Point::new(10.0, 0.0);
        assert!(m.contains_screen_point(Point::new(50.0, 50.0), Point::new(75.0, 50.0)));
    }
}
