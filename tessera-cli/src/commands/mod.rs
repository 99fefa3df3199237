//! CLI command implementations.
//!
//! Each submodule handles one command:
//! - `filter`: apply widget filters to a map configuration
//! - `geometry`: print the projected geometry of a tile
//! - `aggregation`: build the aggregation query for a tile

pub mod aggregation;
pub mod common;
pub mod filter;
pub mod geometry;
