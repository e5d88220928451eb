//! Cache statistics.

use serde::{Deserialize, Serialize};

/// Point-in-time view of a response cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Whether caching is active
    pub enabled: bool,
    /// Stored entries, including expired ones not yet swept
    pub total_items: usize,
    /// Entries that would still be served
    pub valid_items: usize,
    /// Entries past their expiry
    pub expired_items: usize,
    /// Capacity
    pub max_size: usize,
    /// `total_items / max_size`, 0–100
    pub usage_percentage: f64,
}
