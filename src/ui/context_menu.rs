//! Right-click menu and the commands it dispatches.
//!
//! The menu is a two-state machine, `Closed` and `Open`. Opening while
//! already open replaces the menu rather than stacking a second one; route
//! changes, explicit closes and a picked command all return it to `Closed`.

use crate::{
    constants::CONTEXT_MENU_SIZE,
    core::{geo::WorldPoint, map::Map},
    ui::popup::{PopupContent, PopupOptions, PopupOwner},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCommand {
    Add,
    Refresh,
    Setting,
}

impl MenuCommand {
    pub const ALL: [MenuCommand; 3] = [MenuCommand::Add, MenuCommand::Refresh, MenuCommand::Setting];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "add" => Some(MenuCommand::Add),
            "refresh" => Some(MenuCommand::Refresh),
            "setting" => Some(MenuCommand::Setting),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MenuCommand::Add => "add",
            MenuCommand::Refresh => "refresh",
            MenuCommand::Setting => "setting",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuCommand::Add => "Add marker",
            MenuCommand::Refresh => "Refresh markers",
            MenuCommand::Setting => "Settings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationPanelRequest {
    pub title: String,
    pub position: WorldPoint,
    pub area: Option<AreaInfo>,
    pub has_punctuate_rights: bool,
}

/// What the host application should do in response to a menu pick
#[derive(Debug, Clone, PartialEq)]
pub enum DomainCommand {
    OpenCreationPanel(CreationPanelRequest),
    RefreshMarkers,
    OpenSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaInfo {
    pub code: String,
    pub name: String,
}

/// Global view state the menu reads when it opens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub area_code: String,
    pub areas: Vec<AreaInfo>,
    pub has_punctuate_rights: bool,
}

impl ViewState {
    pub fn selected_area(&self) -> Option<&AreaInfo> {
        self.areas.iter().find(|area| area.code == self.area_code)
    }
}

/// Data rendered inside the menu popup
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenuView {
    pub position: WorldPoint,
    pub has_punctuate_rights: bool,
    pub selected_area: Option<AreaInfo>,
    pub container: (f32, f32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuState {
    Closed,
    Open {
        position: WorldPoint,
        popup_id: String,
        view: ContextMenuView,
    },
}

pub type CloseCallback = Box<dyn FnOnce(&mut Map) + Send>;

pub struct InteractionController {
    state: MenuState,
    teardown: Vec<CloseCallback>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            state: MenuState::Closed,
            teardown: Vec::new(),
        }
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, MenuState::Open { .. })
    }

    /// Opens the menu at `position`, replacing any menu already shown
    pub fn open_context_menu(
        &mut self,
        map: &mut Map,
        position: WorldPoint,
        view_state: &ViewState,
    ) -> String {
        let view = ContextMenuView {
            position,
            has_punctuate_rights: view_state.has_punctuate_rights,
            selected_area: view_state.selected_area().cloned(),
            container: CONTEXT_MENU_SIZE,
        };

        let popup_id = map.open_popup(
            position,
            PopupContent::ContextMenu(view.clone()),
            PopupOptions::context_menu(),
            PopupOwner::ContextMenu,
        );
        log::debug!("context menu {popup_id} opened at {position}");

        self.state = MenuState::Open {
            position,
            popup_id: popup_id.clone(),
            view,
        };
        popup_id
    }

    /// Runs a menu command by name. Unknown names and commands arriving while
    /// the menu is closed are ignored.
    pub fn dispatch(&mut self, map: &mut Map, name: &str) -> Option<DomainCommand> {
        let Some(command) = MenuCommand::parse(name) else {
            log::debug!("ignoring unknown menu command {name:?}");
            return None;
        };
        let MenuState::Open { view, .. } = &self.state else {
            log::debug!("menu command {name:?} while closed");
            return None;
        };

        let result = match command {
            // the panel itself enforces rights
            MenuCommand::Add => DomainCommand::OpenCreationPanel(CreationPanelRequest {
                title: creation_title(view.selected_area.as_ref(), &view.position),
                position: view.position,
                area: view.selected_area.clone(),
                has_punctuate_rights: view.has_punctuate_rights,
            }),
            MenuCommand::Refresh => DomainCommand::RefreshMarkers,
            MenuCommand::Setting => DomainCommand::OpenSettings,
        };

        self.close(map);
        Some(result)
    }

    /// Closes the menu if it is still the map's open popup
    pub fn close(&mut self, map: &mut Map) {
        if let MenuState::Open { popup_id, .. } = &self.state {
            map.close_popup_if(popup_id);
        }
        self.state = MenuState::Closed;
    }

    /// Registers work to run when the hosting view goes away
    pub fn on_teardown(&mut self, callback: CloseCallback) {
        self.teardown.push(callback);
    }

    /// Navigation away: force-close any popup and run teardown callbacks
    pub fn on_route_leave(&mut self, map: &mut Map) {
        self.close(map);
        map.close_popup();
        for callback in self.teardown.drain(..) {
            callback(map);
        }
    }

    /// Notices a menu that was replaced by another popup
    pub fn sync_with(&mut self, map: &Map) {
        if let MenuState::Open { popup_id, .. } = &self.state {
            if !map.popups().is_open(popup_id) {
                self.state = MenuState::Closed;
            }
        }
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

/// Round up to two decimals
fn ceil2(value: f64) -> f64 {
    (value * 100.0).ceil() / 100.0
}

fn creation_title(area: Option<&AreaInfo>, position: &WorldPoint) -> String {
    let name = area.map(|a| a.name.as_str()).unwrap_or("unknown");
    format!(
        "New marker: {name} - ({}, {})",
        ceil2(position.x),
        ceil2(position.y)
    )
}
