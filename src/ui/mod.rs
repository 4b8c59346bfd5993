pub mod context_menu;
pub mod popup;

pub use context_menu::{
    AreaInfo, CreationPanelRequest, DomainCommand, InteractionController, MenuCommand, ViewState,
};
pub use popup::{Popup, PopupContent, PopupManager, PopupOptions, PopupOwner};
