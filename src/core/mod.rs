pub mod bounds;
pub mod builder;
pub mod config;
pub mod constants;
pub mod crs;
pub mod geo;
pub mod map;
pub mod viewport;
