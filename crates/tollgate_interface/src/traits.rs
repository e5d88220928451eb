//! Trait definitions for the transports the pipeline guards.

use crate::RawResponse;
use async_trait::async_trait;
use std::sync::Arc;
use tollgate_core::Operation;
use tollgate_error::TransportError;

/// A collaborator that performs one network call.
///
/// Implementations own connection handling, TLS and per-call deadlines. They
/// report failures in wire terms (status code, timeout, connectivity); the
/// pipeline classifies them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the operation once.
    async fn send(&self, operation: &Operation) -> Result<RawResponse, TransportError>;

    /// Transport name (e.g. "https", "mock"), for logs.
    fn name(&self) -> &str {
        "transport"
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, operation: &Operation) -> Result<RawResponse, TransportError> {
        (**self).send(operation).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
