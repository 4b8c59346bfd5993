//! Pin-style icon options for the older DOM marker layer.

use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

const PIN_SHADOW_BASE: &str = "https://assets.yuanshen.site/icons/loc_02_";

/// Pin background
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinVariant {
    #[default]
    Off,
    /// Selected
    On,
    /// Bare icon without a pin
    None,
}

impl PinVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinVariant::Off => "off",
            PinVariant::On => "on",
            PinVariant::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyIconOptions {
    pub class_name: String,
    pub icon_url: Option<String>,
    pub shadow_url: Option<String>,
    pub icon_size: Point,
    pub shadow_size: Point,
    /// Icon pixel that sits on the marker position
    pub icon_anchor: Point,
    pub shadow_anchor: Point,
    /// Where popups open, relative to the icon anchor
    pub popup_anchor: Point,
}

impl LegacyIconOptions {
    pub fn new(marker_id: u64, icon_url: Option<String>, variant: PinVariant) -> Self {
        let pinned = Self {
            class_name: format!("mark-{marker_id}"),
            icon_url,
            shadow_url: Some(format!("{PIN_SHADOW_BASE}{}.png", variant.as_str())),
            icon_size: Point::new(22.0, 22.0),
            shadow_size: Point::new(32.0, 36.0),
            icon_anchor: Point::new(11.0, 30.0),
            shadow_anchor: Point::new(16.0, 35.0),
            popup_anchor: Point::new(0.0, -35.0),
        };

        match variant {
            PinVariant::Off | PinVariant::On => pinned,
            PinVariant::None => Self {
                shadow_url: None,
                icon_anchor: Point::new(11.0, 11.0),
                popup_anchor: Point::new(0.0, -22.0),
                ..pinned
            },
        }
    }

    /// Screen rectangle of the icon for a marker drawn at `anchor`
    pub fn icon_rect(&self, anchor: Point) -> (Point, Point) {
        let min = anchor.subtract(&self.icon_anchor);
        (min, min.add(&self.icon_size))
    }

    /// Screen point a popup for this icon opens at
    pub fn popup_point(&self, anchor: Point) -> Point {
        anchor.add(&self.popup_anchor)
    }
}
