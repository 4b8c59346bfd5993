//! Remote marker data and the controller that turns it into map layers.

pub mod controller;
pub mod icon;
pub mod record;
pub mod service;

pub use controller::{MarkerLayerController, RefreshOutcome, RefreshTicket};
pub use icon::{LegacyIconOptions, PinVariant};
pub use record::{MarkerQuery, MarkerRecord};
pub use service::{HttpMarkerService, IconTable, LogNotifier, MarkerService, Notifier};
