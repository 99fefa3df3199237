//! Time-bucketed aggregation tiles.
//!
//! An aggregation layer renders to rows instead of pixels: each tile is a
//! grid of cells with per-step counts, computed by a single SQL query built
//! from the layer query, the tile geometry and the layer's
//! [`AggregationAttributes`].
//!
//! - [`AggregationQueryBuilder`] - builds the per-tile query
//! - [`AggregationRenderer`] - runs it through a [`QueryExecutor`]

mod attributes;
mod query;
mod renderer;

pub use attributes::{AggregationAttributes, AggregationMetadata, ColumnType};
pub use query::{
    AggregationQueryBuilder, DEFAULT_GEOM_COLUMN, DEFAULT_SRID, DEFAULT_TILE_TEMPLATE,
};
pub use renderer::{AggregationRenderer, QueryError, QueryExecutor, QueryRows, QUERY_ERROR_PREFIX};
