//! Core constants shared by the tile pipeline, the marker renderer and the
//! default viewport. Keeping them in a single place makes it easier to tweak
//! engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Added to every tile zoom before it is embedded in a tile URL.
/// The remote tile store is laid out with this shift, so it must never change.
pub const TILE_ZOOM_OFFSET: i32 = 13;

/// Prefix every tile and overlay URL starts with; the area code follows directly.
pub const DEFAULT_TILE_URL_PREFIX: &str = "https://assets.yuanshen.site/tiles_";

/// Image extension used when an area does not declare one.
pub const DEFAULT_TILE_EXTENSION: &str = "png";

/// Area used when a lookup misses.
pub const DEFAULT_AREA: &str = "提瓦特-base0";

/// World-space origin offset used when an area does not declare `center`.
pub const DEFAULT_AREA_CENTER: [f64; 2] = [3568.0, 6286.0];

/// Pixel size used when an area does not declare `size`.
pub const DEFAULT_AREA_SIZE: [f64; 2] = [12288.0, 15360.0];

/// How far `max_bounds` extends past the tile bounds on every side.
pub const MAX_BOUNDS_PADDING: f64 = 10_000.0;

/// Zoom range of the tile source.
pub const TILE_MIN_ZOOM: f64 = -6.0;
pub const TILE_MAX_ZOOM: f64 = 10.0;

/// Zoom range for which tile imagery actually exists.
pub const TILE_MIN_NATIVE_ZOOM: i32 = -3;
pub const TILE_MAX_NATIVE_ZOOM: i32 = 0;

/// Default viewport.
pub const DEFAULT_VIEW_CENTER: [f64; 2] = [2576.0, 1742.0];
pub const DEFAULT_ZOOM: f64 = -4.0;
pub const DEFAULT_MIN_ZOOM: f64 = -4.0;
pub const DEFAULT_MAX_ZOOM: f64 = 2.0;

/// Snap zoom levels to these quanta.
pub const DEFAULT_ZOOM_SNAP: f64 = 0.5;

/// Programmatic +/- zoom step when calling `zoom_in/zoom_out`.
pub const DEFAULT_ZOOM_DELTA: f64 = 0.0;

/// Marker icon size used by the marker layer controller.
pub const MARKER_ICON_SIZE: (f64, f64) = (32.0, 32.0);

/// Marker icon size when the options leave it out.
pub const MARKER_FALLBACK_SIZE: (f64, f64) = (40.0, 40.0);

/// Base rotation handed to every marker built from a record, in degrees.
pub const MARKER_BASE_ROTATION: f64 = 90.0;

/// Correction applied to the bearing derived from two projected points.
pub const MARKER_BEARING_CORRECTION: f64 = -90.0;

/// Visual size deltas for the pressed and popup-open states.
pub const MARKER_ACTIVE_SHRINK: f64 = 2.0;
pub const MARKER_POPPER_GROW: f64 = 4.0;

/// Marker popup width (both min and max).
pub const MARKER_POPUP_WIDTH: f32 = 223.0;

/// Context menu container, pre-sized because content cannot be measured before paint.
pub const CONTEXT_MENU_SIZE: (f32, f32) = (172.0, 172.0);

/// Context menu popup offset from the click point.
pub const CONTEXT_MENU_OFFSET: (f32, f32) = (112.0, 226.0);
