#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    /// Fetch only the columns a selection needs. When disabled, every declared column is fetched.
    pub select_optimization: bool,
    /// Treat arguments resolving to no value as not given, instead of handing them to the filter.
    pub skip_undefined: bool,
    /// Prefix schema-declared columns with their table name in projections.
    pub qualify_columns: bool,
    pub filter_prefixes: FilterPrefixes,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            select_optimization: true,
            skip_undefined: false,
            qualify_columns: true,
            filter_prefixes: FilterPrefixes::default(),
        }
    }
}

/// Prefixes of the filter references generated while compiling eager expressions.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterPrefixes {
    pub projection: String,
    pub argument: String,
}

impl Default for FilterPrefixes {
    fn default() -> Self {
        Self {
            projection: String::from("s"),
            argument: String::from("f"),
        }
    }
}

pub(crate) fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && !prefix
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | ',' | '.'))
}
