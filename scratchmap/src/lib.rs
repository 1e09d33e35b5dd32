//! Scratchmap - composited maps of the countries you have visited
//!
//! This library turns a list of country names into a PNG that highlights
//! those countries on a rendered base map. Overlays are injected into the
//! render backend's style file for the duration of one generation, the
//! backend is reloaded, and the rendered tiles are fetched and composited.

pub mod backend;
pub mod composite;
pub mod config;
pub mod coord;
pub mod country;
pub mod fetch;
pub mod gate;
pub mod generator;
pub mod handler;
pub mod logging;
pub mod style;

/// Crate version, shown by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
