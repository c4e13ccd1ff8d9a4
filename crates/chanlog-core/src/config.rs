use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// In-flight payload fetches allowed per cache population.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Buffered notifications per channel before slow subscribers lag.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Tunables for a [`ChannelRegistry`](crate::ChannelRegistry).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Maximum concurrent store fetches while populating the payload cache.
    pub fetch_concurrency: usize,
    /// Capacity of each channel's notification buffer.
    pub event_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CoreConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.fetch_concurrency == 0 {
            return Err(CoreError::Config("fetch_concurrency must be at least 1".into()));
        }
        if self.event_capacity == 0 {
            return Err(CoreError::Config("event_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = CoreConfig::default();
        assert_eq!(c.fetch_concurrency, 4);
        assert_eq!(c.event_capacity, 1024);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = CoreConfig::from_toml_str("event_capacity = 16").unwrap();
        assert_eq!(c.event_capacity, 16);
        assert_eq!(c.fetch_concurrency, DEFAULT_FETCH_CONCURRENCY);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(CoreConfig::from_toml_str("").unwrap(), CoreConfig::default());
    }

    #[test]
    fn zero_concurrency_rejected() {
        assert!(matches!(
            CoreConfig::from_toml_str("fetch_concurrency = 0"),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(CoreConfig::from_toml_str("fetch_concurrency = \"four\"").is_err());
    }
}
