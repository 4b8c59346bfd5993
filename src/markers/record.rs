use crate::{core::geo::WorldPoint, Result};
use serde::{Deserialize, Serialize};

/// Position used for records that arrive without one
pub const DEFAULT_POSITION: &str = "0,0";

/// One marker as returned by the marker service. Read-only once fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRecord {
    pub id: u64,
    /// Serialized `"x,y"` world position
    #[serde(default)]
    pub position: Option<String>,
    /// Key into the icon table
    #[serde(default)]
    pub icon_tag: Option<String>,
    /// Direct icon URL, used when no tag resolves
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, alias = "markerTitle")]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub hidden_flag: Option<i32>,
}

impl MarkerRecord {
    /// Parsed world position; a missing position means the origin
    pub fn world_position(&self) -> Result<WorldPoint> {
        WorldPoint::parse(self.position.as_deref().unwrap_or(DEFAULT_POSITION))
    }

    pub fn marker_id(&self) -> String {
        self.id.to_string()
    }
}

/// Search parameters for the marker service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerQuery {
    #[serde(default)]
    pub item_id_list: Vec<u64>,
    /// Remaining filters, passed through untouched
    #[serde(flatten)]
    pub filters: serde_json::Map<String, serde_json::Value>,
}

impl MarkerQuery {
    pub fn for_items(item_id_list: Vec<u64>) -> Self {
        Self {
            item_id_list,
            filters: serde_json::Map::new(),
        }
    }

    /// A query without item ids matches nothing and needs no request
    pub fn is_empty(&self) -> bool {
        self.item_id_list.is_empty()
    }
}
