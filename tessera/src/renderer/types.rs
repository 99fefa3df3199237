//! Render request and result types.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use super::policy::TileErrorPolicy;

/// Header carrying the payload media type.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Media type of PNG tiles.
pub const CONTENT_TYPE_PNG: &str = "image/png";

/// Media type of row data tiles.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Response headers, ordered by name.
pub type Headers = BTreeMap<String, String>;

/// Payload of a rendered tile.
#[derive(Debug, Clone, PartialEq)]
pub enum TileBody {
    /// Encoded image bytes.
    Image(Bytes),
    /// Structured rows (aggregation tiles).
    Rows(Vec<Value>),
    /// Nothing to draw.
    Empty,
}

/// Timing and statistics collected while rendering, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    values: BTreeMap<String, f64>,
}

impl RenderStats {
    /// Creates empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a statistic.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Records a duration in milliseconds.
    pub fn record_duration(&mut self, name: impl Into<String>, elapsed: Duration) {
        self.insert(name, elapsed.as_secs_f64() * 1000.0);
    }

    /// Value of a statistic.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Adds every statistic of `other` into this one, summing shared names.
    pub fn merge(&mut self, other: &RenderStats) {
        for (name, value) in &other.values {
            *self.values.entry(name.clone()).or_insert(0.0) += value;
        }
    }

    /// Iterates `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of a single render call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub body: TileBody,
    pub headers: Headers,
    pub stats: RenderStats,
}

impl RenderResult {
    /// PNG image result.
    pub fn image(bytes: Bytes) -> Self {
        Self::with_content_type(TileBody::Image(bytes), CONTENT_TYPE_PNG)
    }

    /// Row data result.
    pub fn rows(rows: Vec<Value>) -> Self {
        Self::with_content_type(TileBody::Rows(rows), CONTENT_TYPE_JSON)
    }

    /// Result contributing nothing to a composite.
    pub fn empty() -> Self {
        Self {
            body: TileBody::Empty,
            headers: Headers::new(),
            stats: RenderStats::new(),
        }
    }

    fn with_content_type(body: TileBody, content_type: &str) -> Self {
        let mut headers = Headers::new();
        headers.insert(CONTENT_TYPE.to_string(), content_type.to_string());
        Self {
            body,
            headers,
            stats: RenderStats::new(),
        }
    }

    /// Replaces the statistics.
    pub fn with_stats(mut self, stats: RenderStats) -> Self {
        self.stats = stats;
        self
    }

    /// The `Content-Type` header, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).map(String::as_str)
    }
}

/// Request parameters passed to renderer providers.
///
/// Opaque to this crate apart from the `layer` entry, which selects the
/// layer (or comma-joined layers) a renderer draws.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderParams {
    values: BTreeMap<String, String>,
}

impl RenderParams {
    /// Creates empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a parameter.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Value of a parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// The `layer` parameter.
    pub fn layer(&self) -> Option<&str> {
        self.get("layer")
    }
}

/// Resource limits forwarded to renderer providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderLimits {
    /// Maximum time a single layer render may take.
    pub render_timeout: Option<Duration>,
}

/// Per-layer options handed to the renderer provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RendererOptions {
    pub limits: RenderLimits,
    pub policy: TileErrorPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_result_has_png_content_type() {
        let result = RenderResult::image(Bytes::from_static(b"png"));
        assert_eq!(result.content_type(), Some(CONTENT_TYPE_PNG));
        assert!(result.stats.is_empty());
    }

    #[test]
    fn test_rows_result_has_json_content_type() {
        let result = RenderResult::rows(vec![json!({"x__uint8": 1})]);
        assert_eq!(result.content_type(), Some(CONTENT_TYPE_JSON));
        assert!(matches!(result.body, TileBody::Rows(ref rows) if rows.len() == 1));
    }

    #[test]
    fn test_empty_result() {
        let result = RenderResult::empty();
        assert_eq!(result.body, TileBody::Empty);
        assert_eq!(result.content_type(), None);
    }

    #[test]
    fn test_stats_merge_sums_shared_names() {
        let mut a = RenderStats::new();
        a.insert("render", 10.0);
        a.insert("encode", 2.0);

        let mut b = RenderStats::new();
        b.insert("render", 5.0);
        b.insert("query", 1.5);

        a.merge(&b);
        assert_eq!(a.get("render"), Some(15.0));
        assert_eq!(a.get("encode"), Some(2.0));
        assert_eq!(a.get("query"), Some(1.5));
    }

    #[test]
    fn test_record_duration_in_ms() {
        let mut stats = RenderStats::new();
        stats.record_duration("query", Duration::from_millis(250));
        assert_eq!(stats.get("query"), Some(250.0));
    }

    #[test]
    fn test_render_params() {
        let params = RenderParams::new().with("layer", "0,2").with("format", "png");
        assert_eq!(params.layer(), Some("0,2"));
        assert_eq!(params.get("format"), Some("png"));
        assert_eq!(params.get("missing"), None);
    }
}
