//! Configuration for the engine and the per-area tile registry.
//!
//! Area entries may declare `extends` to inherit from another entry. Resolution
//! is a pure function over an immutable [`AreaRegistry`]: the registry is built
//! once at startup and never mutated afterwards.

use crate::{
    constants::{
        DEFAULT_AREA, DEFAULT_AREA_CENTER, DEFAULT_AREA_SIZE, DEFAULT_TILE_EXTENSION,
        DEFAULT_TILE_URL_PREFIX,
    },
    prelude::{HashMap, HashSet},
    Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-area viewport overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    /// Any further viewport keys, carried through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AreaSettings {
    /// Key-wise merge: fields set on `self` win, everything else comes from `base`.
    pub fn merged_over(&self, base: &AreaSettings) -> AreaSettings {
        let mut extra = base.extra.clone();
        for (key, value) in &self.extra {
            let merged = match (extra.get(key), value) {
                (Some(base_value), serde_json::Value::Object(_)) => {
                    merge_json(value, base_value)
                }
                _ => value.clone(),
            };
            extra.insert(key.clone(), merged);
        }

        AreaSettings {
            center: self.center.or(base.center),
            zoom: self.zoom.or(base.zoom),
            extra,
        }
    }
}

/// Deep-merges JSON objects; `over` wins on conflicting leaves.
fn merge_json(over: &serde_json::Value, base: &serde_json::Value) -> serde_json::Value {
    match (over, base) {
        (serde_json::Value::Object(over_map), serde_json::Value::Object(base_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in over_map {
                let next = match base_map.get(key) {
                    Some(base_value) => merge_json(value, base_value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            serde_json::Value::Object(merged)
        }
        _ => over.clone(),
    }
}

/// One registry entry as authored. Every field is optional so that an entry can
/// inherit the rest from its `extends` base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles_offset: Option<[f64; 2]>,
    #[serde(default, alias = "extend", skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<AreaSettings>,
}

impl AreaConfig {
    /// Returns this entry layered over `base`.
    pub fn merged_over(&self, base: &AreaConfig) -> AreaConfig {
        let settings = match (&self.settings, &base.settings) {
            (Some(own), Some(inherited)) => Some(own.merged_over(inherited)),
            (own, inherited) => own.clone().or_else(|| inherited.clone()),
        };

        AreaConfig {
            code: self.code.clone().or_else(|| base.code.clone()),
            extension: self.extension.clone().or_else(|| base.extension.clone()),
            size: self.size.or(base.size),
            center: self.center.or(base.center),
            tiles_offset: self.tiles_offset.or(base.tiles_offset),
            extends: self.extends.clone(),
            settings,
        }
    }
}

/// A fully resolved area: inheritance applied and defaults filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedArea {
    pub name: String,
    pub code: String,
    pub extension: String,
    pub size: [f64; 2],
    pub center: [f64; 2],
    pub tiles_offset: [f64; 2],
    pub settings: AreaSettings,
}

/// Immutable table of area configurations
#[derive(Debug, Clone, PartialEq)]
pub struct AreaRegistry {
    areas: HashMap<String, AreaConfig>,
    default_area: String,
}

impl AreaRegistry {
    pub fn new(areas: HashMap<String, AreaConfig>, default_area: impl Into<String>) -> Self {
        Self {
            areas,
            default_area: default_area.into(),
        }
    }

    /// Loads a registry from a JSON object keyed by area name
    pub fn from_json_str(json: &str, default_area: impl Into<String>) -> Result<Self> {
        let areas: HashMap<String, AreaConfig> = serde_json::from_str(json)?;
        Ok(Self::new(areas, default_area))
    }

    /// The production area table
    pub fn builtin() -> Self {
        let mut areas = HashMap::default();

        areas.insert(
            "提瓦特-base0".to_string(),
            AreaConfig {
                code: Some("twt31".to_string()),
                extension: Some("png".to_string()),
                size: Some([16384.0, 15360.0]),
                center: Some([3568.0, 6286.0]),
                tiles_offset: Some([-4864.0, 0.0]),
                settings: Some(AreaSettings {
                    center: Some([0.0, 1742.0]),
                    ..AreaSettings::default()
                }),
                ..AreaConfig::default()
            },
        );
        areas.insert(
            "提瓦特-base1".to_string(),
            AreaConfig {
                extension: Some("png".to_string()),
                size: Some([12288.0, 15360.0]),
                center: Some([3568.0, 6286.0]),
                ..AreaConfig::default()
            },
        );
        areas.insert(
            "金苹果群岛".to_string(),
            AreaConfig {
                code: Some("qd28".to_string()),
                extension: Some("png".to_string()),
                size: Some([8192.0, 8192.0]),
                center: Some([3568.0, 6286.0]),
                settings: Some(AreaSettings {
                    center: Some([600.0, -2190.0]),
                    zoom: Some(-2.0),
                    ..AreaSettings::default()
                }),
                ..AreaConfig::default()
            },
        );

        let derived = [
            ("地下矿区", "cyjy", [1800.0, -500.0], -3.0),
            ("渊下宫", "yxg", [2000.0, 300.0], -4.0),
            ("三界路飨祭", "yxg", [2000.0, 300.0], -4.0),
        ];
        for (name, code, center, zoom) in derived {
            areas.insert(
                name.to_string(),
                AreaConfig {
                    extends: Some("提瓦特-base1".to_string()),
                    code: Some(code.to_string()),
                    settings: Some(AreaSettings {
                        center: Some(center),
                        zoom: Some(zoom),
                        ..AreaSettings::default()
                    }),
                    ..AreaConfig::default()
                },
            );
        }

        Self::new(areas, DEFAULT_AREA)
    }

    pub fn default_area(&self) -> &str {
        &self.default_area
    }

    pub fn get(&self, name: &str) -> Option<&AreaConfig> {
        self.areas.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.areas.keys().map(String::as_str).collect()
    }

    /// Resolves an area by name.
    ///
    /// Unknown names fall back to the default area. The `extends` chain is
    /// followed until it ends, names a missing entry, or loops. Returns `None`
    /// when the merged entry carries no `code`.
    pub fn resolve(&self, name: &str) -> Option<ResolvedArea> {
        let (resolved_name, entry) = match self.areas.get(name) {
            Some(entry) => (name, entry),
            None => {
                log::debug!(
                    "area {:?} not found, falling back to {:?}",
                    name,
                    self.default_area
                );
                (
                    self.default_area.as_str(),
                    self.areas.get(&self.default_area)?,
                )
            }
        };

        let mut merged = entry.clone();
        let mut visited: HashSet<&str> = HashSet::default();
        visited.insert(resolved_name);
        let mut next = entry.extends.as_deref();

        while let Some(base_name) = next {
            if !visited.insert(base_name) {
                log::warn!("area {:?} has a cyclic extends chain", resolved_name);
                break;
            }
            match self.areas.get(base_name) {
                Some(base) => {
                    merged = merged.merged_over(base);
                    next = base.extends.as_deref();
                }
                None => {
                    log::warn!(
                        "area {:?} extends unknown area {:?}",
                        resolved_name,
                        base_name
                    );
                    break;
                }
            }
        }

        let Some(code) = merged.code.clone() else {
            log::warn!("area {:?} has no code after inheritance", resolved_name);
            return None;
        };

        Some(ResolvedArea {
            name: resolved_name.to_string(),
            code,
            extension: merged
                .extension
                .clone()
                .unwrap_or_else(|| DEFAULT_TILE_EXTENSION.to_string()),
            size: merged.size.unwrap_or(DEFAULT_AREA_SIZE),
            center: merged.center.unwrap_or(DEFAULT_AREA_CENTER),
            tiles_offset: merged.tiles_offset.unwrap_or([0.0, 0.0]),
            settings: merged.settings.unwrap_or_default(),
        })
    }
}

impl Default for AreaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Retry and caching behaviour for marker icon downloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageLoadingConfig {
    /// Extra attempts after the first failure. Zero keeps failures silent and final.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub exponential_backoff: bool,
    /// Number of decoded icons kept in memory
    pub icon_cache_size: usize,
}

impl ImageLoadingConfig {
    /// Delay before the given retry attempt (1-based)
    pub fn retry_delay(&self, attempt: u32) -> std::time::Duration {
        let multiplier = if self.exponential_backoff {
            2_u64.saturating_pow(attempt.saturating_sub(1))
        } else {
            1
        };
        std::time::Duration::from_millis(self.retry_delay_ms.saturating_mul(multiplier))
    }
}

impl Default for ImageLoadingConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay_ms: 500,
            exponential_backoff: true,
            icon_cache_size: 512,
        }
    }
}

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tile and overlay URLs start with this prefix followed by the area code
    pub tile_url_prefix: String,
    pub default_area: String,
    pub api_base_url: Option<String>,
    pub image_loading: ImageLoadingConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tile_url_prefix: DEFAULT_TILE_URL_PREFIX.to_string(),
            default_area: DEFAULT_AREA.to_string(),
            api_base_url: None,
            image_loading: ImageLoadingConfig::default(),
        }
    }
}
