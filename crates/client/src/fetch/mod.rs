//! Live robots.txt retrieval.
//!
//! ### Request
//! - `GET {scheme}://{host}/robots.txt`, port, path and query of the target discarded
//! - Configured `User-Agent`, exactly one attempt
//! - Redirects followed up to `max_redirects` by the transport
//!
//! ### Limits
//! - Overall, connect and idle timeouts from `http_client` config
//! - Global concurrency bounded by a semaphore
//! - Bodies truncated at `max_robots_bytes`
//!
//! The status is returned as-is; deciding what a 404 means is the resolver's job.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tokio::sync::Semaphore;

use crawlgate_core::config::HttpClientConfig;
use crawlgate_core::{Error, TargetUrl};

/// Raw outcome of a robots.txt request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub status_code: u16,
    pub body: Bytes,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Retrieves a site's robots.txt.
#[async_trait]
pub trait RobotsFetcher: Send + Sync {
    /// Fails only at the transport level; any HTTP status is a result.
    async fn fetch(&self, target: &TargetUrl) -> Result<FetchResult, Error>;
}

/// reqwest-backed [`RobotsFetcher`].
#[derive(Clone)]
pub struct FetchClient {
    http: Client,
    permits: Arc<Semaphore>,
    max_bytes: usize,
}

impl FetchClient {
    /// Build the shared HTTP client from the `http_client` settings.
    pub fn new(config: &HttpClientConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(config.idle_timeout())
            .pool_max_idle_per_host(config.max_idle_per_host)
            .tcp_keepalive(config.keep_alive())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Store(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, permits: Arc::new(Semaphore::new(config.max_connections)), max_bytes: config.max_robots_bytes })
    }

    /// GET `robots_url` once under a concurrency permit.
    pub async fn fetch_url(&self, robots_url: &str) -> Result<FetchResult, Error> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::Upstream(format!("fetcher shut down: {e}")))?;

        let response = self.http.get(robots_url).send().await.map_err(|e| {
            tracing::error!(%robots_url, error = %e, "robots.txt request failed");
            Error::Upstream(format!("failed to fetch {robots_url}: {e}"))
        })?;

        let status_code = response.status().as_u16();
        let body = self.read_body(response, robots_url).await?;

        tracing::debug!(%robots_url, status_code, bytes = body.len(), "fetched robots.txt");

        Ok(FetchResult { status_code, body })
    }

    async fn read_body(&self, mut response: reqwest::Response, robots_url: &str) -> Result<Bytes, Error> {
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Upstream(format!("failed to read {robots_url}: {e}")))?
        {
            let remaining = self.max_bytes - body.len();
            if chunk.len() > remaining {
                body.extend_from_slice(&chunk[..remaining]);
                tracing::warn!(%robots_url, max_bytes = self.max_bytes, "robots.txt truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(body))
    }
}

#[async_trait]
impl RobotsFetcher for FetchClient {
    async fn fetch(&self, target: &TargetUrl) -> Result<FetchResult, Error> {
        self.fetch_url(&target.robots_url()).await
    }
}
