//! Aggregation tile renderer.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::attributes::AggregationMetadata;
use super::query::AggregationQueryBuilder;
use crate::coord::TileCoord;
use crate::renderer::{BoxFuture, RenderError, RenderResult, RenderStats, Renderer};

/// Prefix added to query failures reported by this renderer.
pub const QUERY_ERROR_PREFIX: &str = "TorqueRenderer: ";

/// Rows returned by a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
    pub rows: Vec<Value>,
}

/// Failure reported by a query executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Runs SQL against the backing database.
pub trait QueryExecutor: Send + Sync {
    /// Executes a query and returns its rows.
    fn execute<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<QueryRows, QueryError>>;
}

/// Renders aggregation tiles as JSON rows.
///
/// Each tile issues exactly one query; failures are not retried.
pub struct AggregationRenderer {
    builder: AggregationQueryBuilder,
    executor: Arc<dyn QueryExecutor>,
}

impl AggregationRenderer {
    pub fn new(builder: AggregationQueryBuilder, executor: Arc<dyn QueryExecutor>) -> Self {
        Self { builder, executor }
    }

    /// The query builder of this renderer.
    pub fn builder(&self) -> &AggregationQueryBuilder {
        &self.builder
    }

    /// Layer metadata; no query involved.
    pub fn metadata(&self) -> AggregationMetadata {
        self.builder.attributes().metadata()
    }
}

impl Renderer for AggregationRenderer {
    fn get_tile(&self, coord: TileCoord) -> BoxFuture<'_, Result<RenderResult, RenderError>> {
        Box::pin(async move {
            let query = self.builder.build(&coord);

            let started = Instant::now();
            let result = self.executor.execute(&query).await;
            let elapsed = started.elapsed();

            match result {
                Ok(data) => {
                    let mut stats = RenderStats::new();
                    stats.record_duration("query", elapsed);
                    Ok(RenderResult::rows(data.rows).with_stats(stats))
                }
                Err(e) => {
                    debug!(tile = %coord, query = %query, error = %e, "Aggregation query failed");
                    Err(RenderError::UpstreamQuery(format!(
                        "{}{}",
                        QUERY_ERROR_PREFIX, e
                    )))
                }
            }
        })
    }
}
