//! The request pipeline: cache, rate limit, retry, transport.

use crate::TollgateConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tollgate_cache::{CacheStats, ResponseCache, cache_key};
use tollgate_core::{Operation, RequestDescriptor};
use tollgate_error::{RequestError, RequestErrorKind, TollgateResult};
use tollgate_interface::Transport;
use tollgate_rate_limit::{RateLimitStats, RateLimiter};
use tollgate_retry::RetryExecutor;
use tracing::{debug, instrument, warn};

/// Runs logical requests through the cache, the rate limiter and the retry
/// executor around an injected [`Transport`].
///
/// Per request:
/// 1. Read operations are looked up in the cache; a hit returns immediately.
/// 2. One rate-limit token is acquired (blocking or failing per
///    `block_on_limit`).
/// 3. The transport is invoked under the retry policy. Non-2xx responses and
///    undecodable bodies are classified as failures.
/// 4. Successful read results are cached.
///
/// The limiter and cache are shared `Arc`s so several pipelines (or other
/// code) can draw on the same budget and store.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::{Value, json};
/// use tollgate::{
///     Operation, PresetName, RawResponse, RequestDescriptor, RequestPipeline,
///     TollgateConfig, Transport, TransportError,
/// };
///
/// struct Echo;
///
/// #[async_trait]
/// impl Transport for Echo {
///     async fn send(&self, operation: &Operation) -> Result<RawResponse, TransportError> {
///         Ok(RawResponse::json_body(&json!({"name": operation.name()})).unwrap())
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = RequestPipeline::from_config(Echo, &TollgateConfig::preset(PresetName::Lenient))?;
/// let request = RequestDescriptor::new(Operation::read("company.lookup"));
///
/// let body: Value = pipeline.execute(&request).await?;
/// assert_eq!(body["name"], "company.lookup");
/// assert_eq!(pipeline.cache_stats().total_items, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RequestPipeline<T: Transport> {
    transport: T,
    rate_limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
    retry: RetryExecutor,
}

impl<T: Transport> RequestPipeline<T> {
    /// Assemble a pipeline from existing components.
    pub fn new(
        transport: T,
        rate_limiter: Arc<RateLimiter>,
        cache: Arc<ResponseCache>,
        retry: RetryExecutor,
    ) -> Self {
        Self {
            transport,
            rate_limiter,
            cache,
            retry,
        }
    }

    /// Build fresh components from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any component configuration is invalid.
    pub fn from_config(transport: T, config: &TollgateConfig) -> TollgateResult<Self> {
        let rate_limiter = RateLimiter::new(config.rate_limit().clone())?;
        let cache = ResponseCache::new(config.cache().clone())?;
        let retry = RetryExecutor::new(config.retry().clone())?;
        debug!(transport = transport.name(), "Creating request pipeline");
        Ok(Self::new(
            transport,
            Arc::new(rate_limiter),
            Arc::new(cache),
            retry,
        ))
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the shared rate limiter.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Get the shared response cache.
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Get the retry executor.
    pub fn retry(&self) -> &RetryExecutor {
        &self.retry
    }

    /// Cache key for a request: the explicit key, or one derived from the
    /// operation name and parameters.
    pub fn cache_key_for(&self, request: &RequestDescriptor) -> String {
        match request.cache_key() {
            Some(key) => key.clone(),
            None => {
                let operation = request.operation();
                cache_key(operation.name(), operation.params())
            }
        }
    }

    /// TTL for a request: the override, or the default for its cache kind.
    pub fn ttl_for(&self, request: &RequestDescriptor) -> Duration {
        request
            .ttl()
            .unwrap_or_else(|| self.cache.config().ttl_for(*request.cache_kind()))
    }

    /// Run one logical request and decode its JSON body.
    ///
    /// # Errors
    ///
    /// Returns the classified failure, annotated with the endpoint and the
    /// number of transport attempts. A denied non-blocking rate-limit check
    /// fails with `RateLimited` after zero attempts.
    #[instrument(
        skip(self, request),
        fields(endpoint = request.endpoint(), kind = %request.operation().kind())
    )]
    pub async fn execute<R>(&self, request: &RequestDescriptor) -> Result<R, RequestError>
    where
        R: Serialize + DeserializeOwned,
    {
        let endpoint = request.endpoint();
        let key = (!request.bypasses_cache() && self.cache.is_enabled())
            .then(|| self.cache_key_for(request));

        if let Some(key) = &key {
            match self.cache.get_as::<R>(key) {
                Ok(Some(value)) => {
                    debug!("Served from cache");
                    return Ok(value);
                }
                Ok(None) => debug!("Cache miss"),
                Err(e) => {
                    let err = RequestError::from(e).with_endpoint(endpoint);
                    warn!(
                        error = %err,
                        error_kind = err.kind().name(),
                        "Discarding unreadable cache entry"
                    );
                    self.cache.delete(key);
                }
            }
        }

        let block = *self.rate_limiter.config().block_on_limit();
        self.rate_limiter
            .acquire(1, block)
            .await
            .map_err(|e| RequestError::from(e).with_endpoint(endpoint))?;

        let value: R = self
            .retry
            .execute(|| self.send_once::<R>(request.operation()))
            .await
            .map_err(|e| {
                warn!(
                    error_kind = e.kind().name(),
                    attempts = e.attempts(),
                    "Request failed"
                );
                e.with_endpoint(endpoint)
            })?;

        if let Some(key) = key {
            let ttl = self.ttl_for(request);
            if let Err(e) = self.cache.set_as(key, &value, Some(ttl)) {
                let err = RequestError::from(e).with_endpoint(endpoint);
                warn!(
                    error = %err,
                    error_kind = err.kind().name(),
                    "Failed to cache response"
                );
            }
        }

        Ok(value)
    }

    /// Run each request in order, independently.
    ///
    /// One failure does not stop the batch; results line up with `requests`.
    #[instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn execute_batch<R>(
        &self,
        requests: &[RequestDescriptor],
    ) -> Vec<Result<R, RequestError>>
    where
        R: Serialize + DeserializeOwned,
    {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.execute(request).await);
        }
        results
    }

    /// One transport call, with non-2xx statuses and bad bodies classified.
    async fn send_once<R: DeserializeOwned>(&self, operation: &Operation) -> Result<R, RequestError> {
        let response = self.transport.send(operation).await?;
        if !response.is_success() {
            return Err(RequestError::new(RequestErrorKind::from_status(
                response.status,
                response.text(),
                response.retry_after_secs,
            )));
        }
        response
            .json()
            .map_err(|e| RequestError::new(RequestErrorKind::MalformedResponse(e.to_string())))
    }

    /// Drop the cached result for a request. Returns whether one existed.
    pub fn invalidate(&self, request: &RequestDescriptor) -> bool {
        self.cache.delete(&self.cache_key_for(request))
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Refill the rate-limit bucket.
    pub fn reset_rate_limit(&self) {
        self.rate_limiter.reset();
    }

    /// Cache occupancy.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Rate limiter state.
    pub fn rate_limit_stats(&self) -> RateLimitStats {
        self.rate_limiter.stats()
    }
}
