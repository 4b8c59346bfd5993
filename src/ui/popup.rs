//! Floating panels anchored to a world position.
//!
//! A map shows at most one popup. Opening a new one hands the previous popup
//! back to the caller so its owner can be told it closed.

use crate::{
    constants::{CONTEXT_MENU_OFFSET, CONTEXT_MENU_SIZE, MARKER_POPUP_WIDTH},
    core::{
        geo::{Point, WorldPoint},
        viewport::Viewport,
    },
    input::pointer::MarkerKey,
    ui::context_menu::ContextMenuView,
};

#[cfg(feature = "egui")]
use crate::ui::context_menu::MenuCommand;

#[derive(Debug, Clone, PartialEq)]
pub struct PopupOptions {
    pub close_button: bool,
    pub class_name: Option<String>,
    /// Screen offset from the anchor
    pub offset: Point,
    pub min_width: f32,
    pub max_width: f32,
    /// Pre-sized container, for content that cannot be measured before paint
    pub container_size: Option<(f32, f32)>,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            close_button: true,
            class_name: None,
            offset: Point::new(0.0, 0.0),
            min_width: 50.0,
            max_width: 300.0,
            container_size: None,
        }
    }
}

impl PopupOptions {
    pub fn marker() -> Self {
        Self {
            close_button: false,
            min_width: MARKER_POPUP_WIDTH,
            max_width: MARKER_POPUP_WIDTH,
            ..Self::default()
        }
    }

    pub fn context_menu() -> Self {
        let (dx, dy) = CONTEXT_MENU_OFFSET;
        Self {
            close_button: false,
            class_name: Some("no-arrow".to_string()),
            offset: Point::new(dx as f64, dy as f64),
            container_size: Some(CONTEXT_MENU_SIZE),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PopupContent {
    Marker { title: String, content: String },
    ContextMenu(ContextMenuView),
    Text(String),
}

/// Who gets notified when a popup closes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PopupOwner {
    Marker(MarkerKey),
    ContextMenu,
    Map,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub id: String,
    pub anchor: WorldPoint,
    pub content: PopupContent,
    pub options: PopupOptions,
    pub owner: PopupOwner,
}

impl Popup {
    /// Top-left corner on screen
    pub fn screen_position(&self, viewport: &Viewport) -> Point {
        viewport.world_to_screen(&self.anchor).add(&self.options.offset)
    }
}

/// Holds the single open popup of a map
#[derive(Debug, Default)]
pub struct PopupManager {
    current: Option<Popup>,
    next_id: u64,
}

impl PopupManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a popup, returning its id and the popup it replaced
    pub fn open(
        &mut self,
        anchor: WorldPoint,
        content: PopupContent,
        options: PopupOptions,
        owner: PopupOwner,
    ) -> (String, Option<Popup>) {
        self.next_id += 1;
        let id = format!("popup-{}", self.next_id);
        let popup = Popup {
            id: id.clone(),
            anchor,
            content,
            options,
            owner,
        };
        (id, self.current.replace(popup))
    }

    pub fn close(&mut self) -> Option<Popup> {
        self.current.take()
    }

    /// Closes the popup only if it is still `id`
    pub fn close_if(&mut self, id: &str) -> Option<Popup> {
        if self.current.as_ref().is_some_and(|p| p.id == id) {
            self.current.take()
        } else {
            None
        }
    }

    pub fn current(&self) -> Option<&Popup> {
        self.current.as_ref()
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.current.as_ref().is_some_and(|p| p.id == id)
    }
}

#[cfg(feature = "egui")]
impl Popup {
    /// Paints the popup with egui. Returns the menu command the user picked.
    pub fn show(&self, ctx: &egui::Context, viewport: &Viewport) -> Option<MenuCommand> {
        let pos = self.screen_position(viewport);
        let mut picked = None;

        egui::Area::new(egui::Id::new(&self.id))
            .fixed_pos(egui::pos2(pos.x as f32, pos.y as f32))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    if let Some((w, h)) = self.options.container_size {
                        ui.set_min_size(egui::vec2(w, h));
                    }
                    ui.set_min_width(self.options.min_width);
                    ui.set_max_width(self.options.max_width);

                    match &self.content {
                        PopupContent::Marker { title, content } => {
                            ui.strong(title);
                            ui.label(content);
                        }
                        PopupContent::Text(text) => {
                            ui.label(text);
                        }
                        PopupContent::ContextMenu(_) => {
                            for command in MenuCommand::ALL {
                                if ui.button(command.label()).clicked() {
                                    picked = Some(command);
                                }
                            }
                        }
                    }
                });
            });
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_open_popup() {
        let mut popups = PopupManager::new();
        let owner = PopupOwner::Marker(MarkerKey::new("layer", "m1"));
        let (first, replaced) = popups.open(
            WorldPoint::new(0.0, 0.0),
            PopupContent::Text("a".into()),
            PopupOptions::default(),
            owner.clone(),
        );
        assert!(replaced.is_none());

        let (second, replaced) = popups.open(
            WorldPoint::new(1.0, 1.0),
            PopupContent::Text("b".into()),
            PopupOptions::default(),
            PopupOwner::Map,
        );
        assert_ne!(first, second);
        assert_eq!(replaced.map(|p| p.owner), Some(owner));
        assert!(popups.is_open(&second));

        // stale close is ignored
        assert!(popups.close_if(&first).is_none());
        assert!(popups.close_if(&second).is_some());
        assert!(popups.current().is_none());
    }

    #[test]
    fn test_preset_options() {
        let marker = PopupOptions::marker();
        assert!(!marker.close_button);
        assert_eq!(marker.min_width, 223.0);
        assert_eq!(marker.offset, Point::new(0.0, 0.0));

        let menu = PopupOptions::context_menu();
        assert_eq!(menu.class_name.as_deref(), Some("no-arrow"));
        assert_eq!(menu.offset, Point::new(112.0, 226.0));
        assert_eq!(menu.container_size, Some((172.0, 172.0)));
    }
}
