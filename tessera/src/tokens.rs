//! Placeholder substitution for SQL templates.
//!
//! Two placeholder styles are handled:
//!
//! - **Layer tokens** (`!bbox!`, `!scale_denominator!`, `!pixel_width!`,
//!   `!pixel_height!`) are embedded by map authors in a layer's query and
//!   replaced per tile by [`replace_tokens`].
//! - **Template placeholders** (`{name}`) are used by renderer templates and
//!   expanded by [`format_template`].
//!
//! In both cases unknown names are left untouched, so a query can carry
//! placeholders meant for a later stage.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Per-tile values for the layer tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionTokens {
    /// SQL expression producing the tile envelope.
    pub bbox: String,
    /// Mapnik-style scale denominator for the tile.
    pub scale_denominator: f64,
    /// Width of a pixel in geometry units.
    pub pixel_width: f64,
    /// Height of a pixel in geometry units.
    pub pixel_height: f64,
}

impl SubstitutionTokens {
    fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "bbox" => Some(self.bbox.clone()),
            "scale_denominator" => Some(self.scale_denominator.to_string()),
            "pixel_width" => Some(self.pixel_width.to_string()),
            "pixel_height" => Some(self.pixel_height.to_string()),
            _ => None,
        }
    }
}

fn layer_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // !name! where name is a plain identifier
    PATTERN.get_or_init(|| Regex::new(r"!([A-Za-z_][A-Za-z0-9_]*)!").unwrap())
}

/// Replaces `!token!` occurrences in a layer query.
///
/// Unrecognized tokens are kept verbatim.
///
/// # Example
///
/// ```
/// use tessera::tokens::{replace_tokens, SubstitutionTokens};
///
/// let tokens = SubstitutionTokens {
///     bbox: "ST_MakeEnvelope(0,0,1,1,3857)".to_string(),
///     scale_denominator: 500.0,
///     pixel_width: 0.14,
///     pixel_height: 0.14,
/// };
/// let sql = replace_tokens("SELECT * FROM t WHERE geom && !bbox! AND !other!", &tokens);
/// assert_eq!(sql, "SELECT * FROM t WHERE geom && ST_MakeEnvelope(0,0,1,1,3857) AND !other!");
/// ```
pub fn replace_tokens(sql: &str, tokens: &SubstitutionTokens) -> String {
    layer_token_pattern()
        .replace_all(sql, |caps: &Captures<'_>| {
            tokens
                .lookup(&caps[1])
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Ordered set of `{name}` placeholder values.
///
/// Values are applied in insertion order, and the first value set for a name
/// wins: later inserts of the same name are ignored. A value may
/// itself contain placeholders that later entries expand, which is how the
/// aggregation step filter picks up `{column_conv}` and friends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateValues {
    order: Vec<String>,
    values: BTreeMap<String, String>,
}

impl TemplateValues {
    /// Creates an empty value set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a placeholder value unless the name is already set.
    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        if self.values.contains_key(&name) {
            return;
        }
        self.order.push(name.clone());
        self.values.insert(name, value.to_string());
    }

    /// Sets every `(name, value)` pair from an iterator, keeping values that
    /// are already set.
    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (name, value) in entries {
            self.insert(name, value);
        }
    }

    /// Returns the value for a placeholder, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Number of placeholder values.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no values are set.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order.iter().filter_map(|name| {
            self.values
                .get(name)
                .map(|value| (name.as_str(), value.as_str()))
        })
    }
}

/// Expands `{name}` placeholders in a template.
///
/// # Example
///
/// ```
/// use tessera::tokens::{format_template, TemplateValues};
///
/// let mut values = TemplateValues::new();
/// values.insert("column", "price");
/// assert_eq!(
///     format_template("SELECT {column} FROM {table}", &values),
///     "SELECT price FROM {table}"
/// );
/// ```
pub fn format_template(template: &str, values: &TemplateValues) -> String {
    let mut output = template.to_string();
    for (name, value) in values.iter() {
        let placeholder = format!("{{{}}}", name);
        if output.contains(&placeholder) {
            output = output.replace(&placeholder, value);
        }
    }
    output
}
