use std::time::Duration;

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    /// The ttl to store results with. Without one, entries live until evicted by the backend.
    #[serde(deserialize_with = "duration_str::deserialize_option_duration")]
    pub ttl: Option<Duration>,
    /// Name of the request payload field that disables caching for one call when `true`.
    pub bypass_field: String,
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: None,
            bypass_field: String::from("skipCache"),
            key_prefix: String::from("eager"),
        }
    }
}
