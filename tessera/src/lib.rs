//! Tessera - tile rendering orchestration for declarative map configurations
//!
//! This library turns a map configuration (an ordered list of layers with
//! their queries and widgets) into rendered tiles. Per-request filter
//! parameters can rewrite the layer queries without touching the original
//! configuration, and a multi-layer request fans out across per-layer
//! renderers whose outputs are composited into a single tile.
//!
//! # Modules
//!
//! - [`mapconfig`] - Map configuration model, widgets and content identity
//! - [`filter`] - Category and range filters compiled from widget parameters
//! - [`coord`] / [`geometry`] - Tile addressing and projected tile extents
//! - [`tokens`] - Placeholder substitution for SQL templates
//! - [`aggregation`] - Time-bucketed aggregation tiles
//! - [`renderer`] - Renderer contracts, per-layer dispatch and compositing
//! - [`compositor`] - PNG compositing and the blank substitution tile
//! - [`config`] / [`logging`] - Runtime configuration and tracing setup

pub mod aggregation;
pub mod compositor;
pub mod config;
pub mod coord;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod logging;
pub mod mapconfig;
pub mod renderer;
pub mod tokens;

pub use error::TesseraError;
