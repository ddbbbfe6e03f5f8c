use std::time::Duration;

use serde::Deserialize;

/// Deserializable settings for a cache.
///
/// Durations are written in humantime notation, for example `ttl: 5m`.
///
/// ```
/// # use std::time::Duration;
/// let config: stalecache::CacheConfig = serde_yaml::from_str("ttl: 30s").unwrap();
/// assert_eq!(config.ttl, Some(Duration::from_secs(30)));
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a loaded value stays fresh.
    ///
    /// `None` or zero means the value never expires by time.
    #[serde(with = "humantime_serde")]
    pub ttl: Option<Duration>,

    /// A name identifying the cache in log output.
    pub name: Option<String>,
}
