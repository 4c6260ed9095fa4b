//! The network seam under [`crate::FetchClient`].

use std::error::Error as StdError;
use std::time::Duration;

use common::{Error, FetchConfig};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::query::QueryParams;

/// One HTTP GET, no caching or retries.
///
/// Implementations classify failures: [`Error::Transient`] for anything
/// worth another attempt, [`Error::Fatal`] otherwise.
pub trait HttpTransport: Send + Sync {
    fn get<'a>(&'a self, url: &'a str, params: &'a QueryParams)
        -> BoxFuture<'a, Result<Vec<u8>, Error>>;
}

fn format_reqwest_error(err: &reqwest::Error) -> String {
    // Keep chained causes so DNS/TLS/socket failures are visible.
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !cause_msg.is_empty() && !message.contains(&cause_msg) {
            message.push_str(": ");
            message.push_str(&cause_msg);
        }
        source = cause.source();
    }

    message
}

/// Whether a non-success status is worth retrying.
///
/// Server errors, request timeouts and rate limiting are; any other
/// client error will fail the same way again.
pub fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 408 || status == 429
}

/// Production transport over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(16)
            .tcp_keepalive(Duration::from_secs(30));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str, params: &QueryParams) -> Result<Vec<u8>, Error> {
        let full_url = params.full_url(url);

        let resp = self
            .client
            .get(url)
            .query(params.pairs())
            .send()
            .await
            .map_err(|e| Error::Transient {
                url: full_url.clone(),
                message: format_reqwest_error(&e),
            })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let message = format!("Status code: {}", status);
            return Err(if is_retryable_status(status) {
                Error::Transient {
                    url: full_url,
                    message,
                }
            } else {
                Error::Fatal {
                    url: full_url,
                    message,
                }
            });
        }

        let body = resp.bytes().await.map_err(|e| Error::Transient {
            url: full_url,
            message: format_reqwest_error(&e),
        })?;
        Ok(body.to_vec())
    }
}

impl HttpTransport for ReqwestTransport {
    fn get<'a>(
        &'a self,
        url: &'a str,
        params: &'a QueryParams,
    ) -> BoxFuture<'a, Result<Vec<u8>, Error>> {
        self.fetch(url, params).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(408));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(403));
    }

    #[test]
    fn test_build_with_and_without_timeout() {
        let mut config = FetchConfig::default();
        assert!(ReqwestTransport::new(&config).is_ok());
        config.request_timeout_secs = Some(10);
        assert!(ReqwestTransport::new(&config).is_ok());
    }
}
