use super::{in_scope, UrlData};
use crate::error::{CrawlError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::redirect::{Attempt, Policy};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;

/// Anything that can turn a url into a page body.
///
/// Non-success statuses are returned as data, not errors; the crawler treats
/// them as dead ends.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<UrlData>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Redirects are only followed while they stay inside `allowed_domain`.
    /// A stopped redirect comes back as its 3xx response.
    pub fn new(timeout: Duration, per_host: usize, allowed_domain: &str) -> Result<Self> {
        let domain = allowed_domain.to_string();
        let policy = Policy::custom(move |attempt: Attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS || !in_scope(attempt.url(), &domain) {
                attempt.stop()
            } else {
                attempt.follow()
            }
        });
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(policy)
            .pool_max_idle_per_host(per_host) // keep as many warm connections as we may use at once
            .build()
            .map_err(|e| CrawlError::Config(format!("cannot build http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<UrlData> {
        let to_fetch_error = |source| CrawlError::Fetch {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(to_fetch_error)?;
        let status = response.status().as_u16();
        let final_url = Arc::new(response.url().clone());
        let body = response.text().await.map_err(to_fetch_error)?;
        Ok(UrlData {
            status,
            body,
            final_url,
        })
    }
}

/// Two-level concurrency bound: one semaphore for all requests plus one per
/// host, created lazily.
pub struct FetchLimiter {
    total: Arc<Semaphore>,
    per_host: usize,
    hosts: DashMap<String, Arc<Semaphore>>,
}

/// Holds a slot in both the host and the global budget.
pub struct FetchPermit {
    _host: OwnedSemaphorePermit,
    _total: OwnedSemaphorePermit,
}

impl FetchLimiter {
    pub fn new(total: usize, per_host: usize) -> Self {
        Self {
            total: Arc::new(Semaphore::new(total)),
            per_host,
            hosts: DashMap::new(),
        }
    }

    /// Waits for a host slot first, so a busy host never sits on global slots
    /// other hosts could use.
    pub async fn acquire(&self, url: &Url) -> FetchPermit {
        let host = url.host_str().unwrap_or_default().to_string();
        let host_semaphore = self
            .hosts
            .entry(host)
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host)))
            .clone();
        let host_permit = host_semaphore
            .acquire_owned()
            .await
            .expect("limiter semaphores are never closed");
        let total_permit = self
            .total
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphores are never closed");
        FetchPermit {
            _host: host_permit,
            _total: total_permit,
        }
    }
}
