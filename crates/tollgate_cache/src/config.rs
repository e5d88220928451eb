//! Response cache configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tollgate_core::CacheKind;
use tollgate_error::ConfigError;

/// Longest lifetime any entry can have (100 years, in seconds).
pub const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Configuration for [`ResponseCache`](crate::ResponseCache).
///
/// Each [`CacheKind`] has its own default TTL; a per-request TTL override
/// takes precedence over all of them.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct CacheConfig {
    /// Whether responses are cached
    #[serde(default = "default_enabled")]
    enabled: bool,

    /// Maximum number of stored entries
    #[serde(default = "default_max_size")]
    max_size: usize,

    /// TTL for `Standard` entries (seconds)
    #[serde(default = "default_ttl_secs")]
    default_ttl_secs: u64,

    /// TTL for `Perishable` entries (seconds)
    #[serde(default = "default_perishable_ttl_secs")]
    perishable_ttl_secs: u64,

    /// TTL for `Static` entries (seconds)
    #[serde(default = "default_static_ttl_secs")]
    static_ttl_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_max_size() -> usize {
    1000
}

fn default_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_perishable_ttl_secs() -> u64 {
    60
}

fn default_static_ttl_secs() -> u64 {
    86_400 // 1 day
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_size: default_max_size(),
            default_ttl_secs: default_ttl_secs(),
            perishable_ttl_secs: default_perishable_ttl_secs(),
            static_ttl_secs: default_static_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// Large cache with long lifetimes.
    pub fn aggressive() -> Self {
        Self {
            enabled: true,
            max_size: 5_000,
            default_ttl_secs: 3_600,
            perishable_ttl_secs: 300,
            static_ttl_secs: 604_800,
        }
    }

    /// Small cache with short lifetimes.
    pub fn conservative() -> Self {
        Self {
            enabled: true,
            max_size: 200,
            default_ttl_secs: 60,
            perishable_ttl_secs: 15,
            static_ttl_secs: 3_600,
        }
    }

    /// No caching.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Default TTL for a cache kind.
    pub fn ttl_for(&self, kind: CacheKind) -> Duration {
        let secs = match kind {
            CacheKind::Perishable => self.perishable_ttl_secs,
            CacheKind::Standard => self.default_ttl_secs,
            CacheKind::Static => self.static_ttl_secs,
        };
        Duration::from_secs(secs)
    }

    /// Default TTL for entries stored without an override.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// When enabled, `max_size` must be positive and every TTL must lie in
    /// `1..=MAX_TTL_SECS`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.max_size == 0 {
            return Err(ConfigError::new("cache.max_size must be positive"));
        }
        for (name, secs) in [
            ("default_ttl_secs", self.default_ttl_secs),
            ("perishable_ttl_secs", self.perishable_ttl_secs),
            ("static_ttl_secs", self.static_ttl_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::new(format!("cache.{} must be positive", name)));
            }
            if secs > MAX_TTL_SECS {
                return Err(ConfigError::new(format!(
                    "cache.{} must be at most {}, got {}",
                    name, MAX_TTL_SECS, secs
                )));
            }
        }
        Ok(())
    }
}
