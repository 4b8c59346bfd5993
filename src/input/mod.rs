pub mod events;
pub mod handler;
pub mod pointer;

// Re-export the essential types
pub use events::{InputEvent, MapEvent, MarkerEventKind, MouseButton};
pub use handler::{EventCallback, EventManager};
pub use pointer::{MarkerKey, PointerTracker};
