//! Per-call request descriptors.

use crate::Operation;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Logical cache kind, selecting which default TTL applies.
///
/// Perishable data (statuses, balances) expires quickly; static lookups
/// (reference data) can live much longer.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CacheKind {
    /// Short-lived data
    #[display("perishable")]
    Perishable,
    /// Ordinary lookups
    #[default]
    #[display("standard")]
    Standard,
    /// Reference data that rarely changes
    #[display("static")]
    Static,
}

/// Everything the pipeline needs to run one logical request.
///
/// Callers validate and normalize their inputs before building a descriptor;
/// the pipeline never re-validates business identifiers.
///
/// # Examples
///
/// ```
/// use tollgate_core::{CacheKind, Operation, RequestDescriptor};
/// use serde_json::json;
/// use std::time::Duration;
///
/// let request = RequestDescriptor::new(
///     Operation::read("vat.verify").with_param("number", json!("GB123456789")),
/// )
/// .with_cache_kind(CacheKind::Perishable)
/// .with_ttl(Duration::from_secs(30));
///
/// assert_eq!(*request.ttl(), Some(Duration::from_secs(30)));
/// assert!(request.cache_key().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RequestDescriptor {
    /// The call to guard
    #[setters(skip)]
    operation: Operation,
    /// Explicit cache key; derived from the operation when absent
    #[setters(strip_option, into)]
    cache_key: Option<String>,
    /// Which default TTL applies
    cache_kind: CacheKind,
    /// TTL override for this call
    #[setters(strip_option)]
    ttl: Option<Duration>,
}

impl RequestDescriptor {
    /// Describe a request with default caching behavior.
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            cache_key: None,
            cache_kind: CacheKind::default(),
            ttl: None,
        }
    }

    /// Endpoint identity, used in logs and error context.
    pub fn endpoint(&self) -> &str {
        self.operation.name()
    }

    /// True if the cache must be bypassed.
    pub fn bypasses_cache(&self) -> bool {
        self.operation.is_write()
    }
}

impl From<Operation> for RequestDescriptor {
    fn from(operation: Operation) -> Self {
        Self::new(operation)
    }
}
