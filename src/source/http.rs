use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ETAG;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::sync::{FeedKind, FetchResult, RemoteFeedSource};

/// Fetches feeds over HTTP; the `ETag` header is the revision tag.
pub struct HttpFeedSource {
    client: Client,
    base: Url,
    fetches: AtomicUsize,
}

impl HttpFeedSource {
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self { client, base, fetches: AtomicUsize::new(0) })
    }

    pub fn endpoint(&self, kind: FeedKind) -> Result<Url> {
        self.base
            .join(kind.default_path())
            .with_context(|| format!("endpoint for {kind}"))
    }

    /// Requests issued so far, including the second step of the bloom filter chain.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn request(&self, kind: FeedKind) -> Result<FetchResult> {
        let url = self.endpoint(kind)?;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(feed = %kind, status = %status, "fetch rejected");
            return Ok(FetchResult::Failure);
        }
        let tag = resp
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let payload = resp.bytes().await?;
        debug!(feed = %kind, bytes = payload.len(), tag = ?tag, "fetched");
        Ok(FetchResult::Success { tag, payload })
    }
}

#[async_trait]
impl RemoteFeedSource for HttpFeedSource {
    async fn fetch(&self, kind: FeedKind) -> FetchResult {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.request(kind).await {
            Ok(result) => result,
            Err(e) => {
                warn!(feed = %kind, error = %e, "fetch failed");
                FetchResult::Failure
            }
        }
    }
}
