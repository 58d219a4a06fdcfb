mod cache;
mod query;

use std::path::Path;

pub use cache::CacheConfig;
pub use query::{FilterPrefixes, QueryConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read the configuration file: {0}")]
    Read(#[from] std::io::Error),
    #[error("could not parse the configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid filter prefix `{0}`, prefixes must be non-empty and must not contain `[`, `]`, `(`, `)`, `,`, `.` or whitespace")]
    InvalidFilterPrefix(String),
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Configuration of the query engine.
pub struct Config {
    /// How selection trees are translated into read queries
    pub query: QueryConfig,
    /// Result cache settings
    pub cache: CacheConfig,
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(input)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let FilterPrefixes { projection, argument } = &self.query.filter_prefixes;

        for prefix in [projection, argument] {
            if !query::is_valid_prefix(prefix) {
                return Err(ConfigError::InvalidFilterPrefix(prefix.clone()));
            }
        }

        // "f" and "f1" could both produce "f11"
        if projection.starts_with(argument.as_str()) || argument.starts_with(projection.as_str()) {
            return Err(ConfigError::InvalidFilterPrefix(argument.clone()));
        }

        Ok(())
    }
}
