//! Aggregation tile query construction.

use crate::coord::TileCoord;
use crate::geometry::{compute_geometry, TileGeometry, TilingParams};
use crate::mapconfig::MapConfig;
use crate::renderer::RenderError;
use crate::tokens::{format_template, replace_tokens, SubstitutionTokens, TemplateValues};

use super::attributes::AggregationAttributes;

/// Geometry column used when a layer does not name one.
pub const DEFAULT_GEOM_COLUMN: &str = "the_geom_webmercator";

/// SRID used when a layer does not name one.
pub const DEFAULT_SRID: u32 = 3857;

/// Meters per pixel of the standard rendering pixel (0.28 mm).
const STANDARD_PIXEL_SIZE: f64 = 0.00028;

/// Step window condition appended when a step is selected.
const STEP_FILTER: &str = "AND floor(({column_conv} - {start})/{step}) \
                           BETWEEN {stepSelect} - {stepOffset} + 1 AND {stepSelect} ";

/// Default tile query.
///
/// Bins the layer rows into a `resolution`-pixel grid over the buffered
/// tile extent and collects per-cell counts per time step.
pub const DEFAULT_TILE_TEMPLATE: &str = r#"
        WITH par AS (
            WITH innerpar AS (
                SELECT
                    1.0/(({xyz_resolution})*{resolution}) as resinv,
                    ST_MakeEnvelope({b_xmin}, {b_ymin}, {b_xmax}, {b_ymax}, {srid}) as b_ext,
                    ST_MakeEnvelope({xmin}, {ymin}, {xmax}, {ymax}, {srid}) as ext
            )
            SELECT
                ({xyz_resolution})*{resolution} as res,
                innerpar.resinv as resinv,
                innerpar.b_ext as b_ext,
                st_xmin(innerpar.ext) as xmin,
                st_ymin(innerpar.ext) as ymin,
                round((st_xmax(innerpar.ext) - st_xmin(innerpar.ext))*innerpar.resinv) - 1 as maxx,
                round((st_ymax(innerpar.ext) - st_ymin(innerpar.ext))*innerpar.resinv) - 1 as maxy
            FROM innerpar
        )
        SELECT xx x__uint8,
            yy y__uint8,
            array_agg(c) vals__uint8,
            array_agg(d) dates__uint16
        FROM (
            select
                GREATEST(0 - {b_size}, LEAST(p.maxx + {b_size}, round((st_x(i.{gcol}) - p.xmin)*resinv))) as xx,
                GREATEST(0 - {b_size}, LEAST(p.maxy + {b_size}, round((st_y(i.{gcol}) - p.ymin)*resinv))) as yy,
                {countby} c,
                floor(({column_conv} - {start})/{step}) d
            FROM ({_sql}) i, par p
            WHERE i.{gcol} && p.b_ext {_stepFilter}
            GROUP BY xx, yy, d
        ) cte, par
        GROUP BY x__uint8, y__uint8
    "#;

/// Builds per-tile aggregation queries for one layer.
///
/// # Example
///
/// ```
/// use tessera::aggregation::{AggregationAttributes, AggregationQueryBuilder};
/// use tessera::coord::TileCoord;
///
/// let attrs = AggregationAttributes::new("price", 0.0, 100.0, 10.0);
/// let builder = AggregationQueryBuilder::new("select * from sales", attrs);
/// let sql = builder.build(&TileCoord::new(0, 0, 0).unwrap());
/// assert!(sql.contains("FROM (select * from sales) i, par p"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationQueryBuilder {
    layer_sql: String,
    attrs: AggregationAttributes,
    tiling: TilingParams,
    geom_column: String,
    srid: u32,
    template: String,
}

impl AggregationQueryBuilder {
    /// Creates a builder with default tiling, geometry column and template.
    pub fn new(layer_sql: impl Into<String>, attrs: AggregationAttributes) -> Self {
        Self {
            layer_sql: layer_sql.into(),
            attrs,
            tiling: TilingParams::default(),
            geom_column: DEFAULT_GEOM_COLUMN.to_string(),
            srid: DEFAULT_SRID,
            template: DEFAULT_TILE_TEMPLATE.to_string(),
        }
    }

    /// Creates a builder for a layer of a map configuration.
    ///
    /// Uses the layer's current query (filters applied) and its
    /// `geom_column` / `srid` options when present.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::UnknownLayer` if the layer does not exist or
    /// has no query.
    pub fn for_layer(
        config: &MapConfig,
        index: usize,
        attrs: AggregationAttributes,
    ) -> Result<Self, RenderError> {
        let layer = config
            .layer(index)
            .ok_or_else(|| RenderError::UnknownLayer(index.to_string()))?;
        let sql = config
            .layer_sql(index)
            .ok_or_else(|| RenderError::UnknownLayer(format!("layer {} has no sql", index)))?;

        let mut builder = Self::new(sql, attrs);
        if let Some(geom_column) = &layer.options.geom_column {
            builder.geom_column = geom_column.clone();
        }
        if let Some(srid) = layer.options.srid {
            builder.srid = srid;
        }
        Ok(builder)
    }

    pub fn with_tiling(mut self, tiling: TilingParams) -> Self {
        self.tiling = tiling;
        self
    }

    pub fn with_geom_column(mut self, geom_column: impl Into<String>) -> Self {
        self.geom_column = geom_column.into();
        self
    }

    pub fn with_srid(mut self, srid: u32) -> Self {
        self.srid = srid;
        self
    }

    /// Replaces the tile query template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn attributes(&self) -> &AggregationAttributes {
        &self.attrs
    }

    pub fn geom_column(&self) -> &str {
        &self.geom_column
    }

    pub fn srid(&self) -> u32 {
        self.srid
    }

    /// Geometry of a tile using the layer's aggregation resolution.
    pub fn geometry(&self, coord: &TileCoord) -> TileGeometry {
        compute_geometry(coord, &self.tiling, self.attrs.resolution)
    }

    /// Step window condition, empty unless a step is selected.
    pub fn step_filter(&self) -> &'static str {
        if self.attrs.step_select.is_some() {
            STEP_FILTER
        } else {
            ""
        }
    }

    /// Builds the query for a tile.
    ///
    /// Layer tokens (`!bbox!`...) in the layer query are substituted first,
    /// then the template placeholders are expanded in order: `_sql`,
    /// `_stepFilter`, attributes, tile values and extent values. Later
    /// values also expand placeholders introduced by earlier ones. When an
    /// extra attribute shares a name with a tile or extent value (`srid`,
    /// `gcol`, `xmin`...), the attribute is used.
    pub fn build(&self, coord: &TileCoord) -> String {
        let geometry = self.geometry(coord);
        let xyz_resolution = geometry.resolution;
        let extent = &geometry.extent;

        let layer_sql = replace_tokens(
            &self.layer_sql,
            &SubstitutionTokens {
                bbox: format!(
                    "ST_MakeEnvelope({},{},{},{},{})",
                    extent.xmin, extent.ymin, extent.xmax, extent.ymax, self.srid
                ),
                scale_denominator: xyz_resolution / STANDARD_PIXEL_SIZE,
                pixel_width: xyz_resolution,
                pixel_height: xyz_resolution,
            },
        );

        let mut values = TemplateValues::new();
        values.insert("_sql", layer_sql);
        values.insert("_stepFilter", self.step_filter());
        values.extend(self.attrs.template_values());
        values.extend([
            ("zoom", coord.z.to_string()),
            ("x", coord.x.to_string()),
            ("y", coord.y.to_string()),
            ("column_conv", self.attrs.column_conv()),
            ("xyz_resolution", xyz_resolution.to_string()),
            ("srid", self.srid.to_string()),
            ("gcol", self.geom_column.clone()),
        ]);
        values.extend(geometry.template_values());

        format_template(&self.template, &values)
    }
}
