//! Filter command: apply widget filters to a map configuration.

use std::path::PathBuf;

use clap::Args;
use serde_json::{json, Value};
use tessera::filter::FilterParams;
use tessera::mapconfig::MapConfig;
use tracing::info;

use super::common::{load_map_config, read_json};
use crate::error::CliError;

/// Arguments for the filter command.
#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Map configuration document (JSON)
    #[arg(long)]
    pub map: PathBuf,

    /// Filter parameters (JSON, `{"layers": [{"<widget>": {...}}]}`)
    #[arg(long)]
    pub params: PathBuf,

    /// Also print the query of this widget (requires --layer)
    #[arg(long, requires = "layer")]
    pub widget: Option<String>,

    /// Layer owning --widget
    #[arg(long)]
    pub layer: Option<usize>,
}

/// Run the filter command.
pub fn run(args: FilterArgs) -> Result<(), CliError> {
    let mut config = load_map_config(&args.map)?;
    let params: FilterParams = serde_json::from_value(read_json(&args.params)?).map_err(
        |error| CliError::Json {
            path: args.params.clone(),
            error,
        },
    )?;

    let report = filter_report(&mut config, &params, args.layer.zip(args.widget.as_deref()))?;
    println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    Ok(())
}

/// Applies `params` and describes the result.
///
/// The report holds the identity before and after filtering, the query of
/// every layer and, when requested, the query of one widget.
fn filter_report(
    config: &mut MapConfig,
    params: &FilterParams,
    widget: Option<(usize, &str)>,
) -> Result<Value, CliError> {
    let original_id = config.id().to_string();
    config.set_filters_params(params)?;

    info!(
        original = %original_id,
        filtered = %config.id(),
        "Applied filters"
    );

    let layers: Vec<Value> = (0..config.layer_count())
        .map(|index| {
            json!({
                "index": index,
                "filtered": config.layer_filters(index).is_some(),
                "sql": config.layer_sql(index),
            })
        })
        .collect();

    let mut report = json!({
        "original_id": original_id,
        "id": config.id(),
        "layers": layers,
    });

    if let Some((layer, widget_id)) = widget {
        let widget = config.widget(layer, widget_id)?;
        report["widget"] = json!({
            "layer": layer,
            "id": widget.id(),
            "sql": widget.sql(config.layer_filters(layer)),
        });
    }

    Ok(report)
}
