//! Aggregation command: build the tile query of an aggregation layer.

use std::path::PathBuf;

use clap::Args;
use serde_json::{json, Value};
use tessera::aggregation::{AggregationAttributes, AggregationQueryBuilder};
use tessera::config::ConfigFile;
use tessera::coord::TileCoord;
use tessera::mapconfig::MapConfig;
use tracing::debug;

use super::common::{load_map_config, read_json, tile};
use crate::error::CliError;

/// Arguments for the aggregation-sql command.
#[derive(Debug, Args)]
pub struct AggregationArgs {
    /// Map configuration document (JSON)
    #[arg(long)]
    pub map: PathBuf,

    /// Index of the aggregation layer
    #[arg(long, default_value = "0")]
    pub layer: usize,

    /// Aggregation attributes (JSON)
    #[arg(long)]
    pub attrs: PathBuf,

    /// Zoom level
    #[arg(short, long)]
    pub z: u8,

    /// Tile column
    #[arg(short, long)]
    pub x: u32,

    /// Tile row (0 at the top)
    #[arg(short, long)]
    pub y: u32,
}

/// Run the aggregation-sql command.
pub fn run(args: AggregationArgs, settings: &ConfigFile) -> Result<(), CliError> {
    let config = load_map_config(&args.map)?;
    let attrs: AggregationAttributes = serde_json::from_value(read_json(&args.attrs)?)
        .map_err(|error| CliError::Json {
            path: args.attrs.clone(),
            error,
        })?;
    let coord = tile(args.z, args.x, args.y)?;

    let report = aggregation_report(&config, args.layer, attrs, &coord, settings)?;
    println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    Ok(())
}

/// Builds the query and metadata of one tile.
///
/// Layer options take precedence over the configured geometry column and
/// SRID.
fn aggregation_report(
    config: &MapConfig,
    layer: usize,
    attrs: AggregationAttributes,
    coord: &TileCoord,
    settings: &ConfigFile,
) -> Result<Value, CliError> {
    let options = config.layer(layer).map(|l| &l.options);
    let geom_column = options
        .and_then(|o| o.geom_column.clone())
        .unwrap_or_else(|| settings.aggregation.geom_column.clone());
    let srid = options
        .and_then(|o| o.srid)
        .unwrap_or(settings.aggregation.srid);

    let builder = AggregationQueryBuilder::for_layer(config, layer, attrs)?
        .with_tiling(settings.tiling())
        .with_geom_column(geom_column)
        .with_srid(srid);

    let sql = builder.build(coord);
    debug!(tile = %coord, layer, "Built aggregation query");

    Ok(json!({
        "tile": coord.to_string(),
        "sql": sql,
        "metadata": builder.attributes().metadata(),
    }))
}
