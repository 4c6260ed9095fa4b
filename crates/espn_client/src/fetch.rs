//! Cached, retried GET.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::{Error, SyncConfig};
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::cache::{cache_key, read_cached, CacheableContent};
use crate::query::QueryParams;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Quadratic backoff with jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never less than one.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Sleep before the attempt after the 0-indexed `attempt`:
    /// `base * (0.95 + 0.10 * U) * (attempt + 1)^2`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = 0.95 + 0.10 * rand::thread_rng().gen::<f64>();
        let step = f64::from(attempt + 1).powi(2);
        self.base_delay.mul_f64(jitter * step)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}

/// GET through the response cache, retrying transient failures.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn HttpTransport>,
    cache_dir: PathBuf,
    retry: RetryPolicy,
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("cache_dir", &self.cache_dir)
            .field("retry", &self.retry)
            .finish()
    }
}

impl FetchClient {
    /// Client with an explicit transport; `cache_dir` is the response
    /// cache directory itself (e.g. `<root>/web`).
    pub fn new(transport: Arc<dyn HttpTransport>, cache_dir: PathBuf, retry: RetryPolicy) -> Self {
        Self {
            transport,
            cache_dir,
            retry,
        }
    }

    /// Production client built from the sync config.
    pub fn from_config(config: &SyncConfig) -> Result<Self, Error> {
        let transport = ReqwestTransport::new(&config.fetch)?;
        let retry = RetryPolicy::new(
            config.fetch.max_attempts,
            Duration::from_millis(config.fetch.backoff_base_ms),
        );
        Ok(Self::new(Arc::new(transport), config.web_cache_dir(), retry))
    }

    /// Fetch `url` with optional query parameters.
    ///
    /// A cache hit returns the stored bytes without touching the network.
    /// The result is not cached until the caller saves it.
    pub async fn get(
        &self,
        url: &str,
        params: Option<&QueryParams>,
    ) -> Result<CacheableContent, Error> {
        let cache_file = self.cache_dir.join(cache_key(url, params));

        if let Some(data) = read_cached(&cache_file).await? {
            debug!("Cache hit: {}", cache_file.display());
            return Ok(CacheableContent::new(data, cache_file, true));
        }

        let empty = QueryParams::new();
        let params = params.unwrap_or(&empty);
        let data = self.get_with_retries(url, params).await?;
        Ok(CacheableContent::new(data, cache_file, false))
    }

    async fn get_with_retries(&self, url: &str, params: &QueryParams) -> Result<Vec<u8>, Error> {
        let mut attempt = 0;
        loop {
            match self.transport.get(url, params).await {
                Ok(data) => return Ok(data),
                Err(e) if e.is_transient() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Struggling to get {}. Error: {}. Attempt number {}. Sleeping for {:.2}s",
                        params.full_url(url),
                        e,
                        attempt + 1,
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
