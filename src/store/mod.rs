//! Persistence for revision tags and the domain stores fed by each feed.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::sync::{BloomFilterSpec, FeedKind};

pub mod cache;
pub mod entity;
pub mod https;
pub mod pg;
pub mod surrogates;

#[cfg(test)]
pub mod memory;

pub use cache::{HealthSnapshot, StorageCache};
pub use pg::PgStore;

/// Blob keys written by releases that predate the tracker whitelist feed.
pub const LEGACY_LISTS: [&str; 2] = ["easylist", "easylist_privacy"];

#[async_trait]
pub trait FeedPersistence: Send + Sync {
    async fn blob(&self, kind: FeedKind) -> Result<Option<Bytes>>;
    async fn put_blob(&self, kind: FeedKind, data: &[u8]) -> Result<()>;

    async fn has_blob(&self, kind: FeedKind) -> Result<bool> {
        Ok(self.blob(kind).await?.is_some_and(|b| !b.is_empty()))
    }

    async fn https_whitelist(&self) -> Result<Vec<String>>;
    async fn put_https_whitelist(&self, hosts: &[String]) -> Result<()>;

    async fn bloom_filter(&self) -> Result<Option<(BloomFilterSpec, Bytes)>>;
    async fn bloom_filter_spec(&self) -> Result<Option<BloomFilterSpec>>;
    async fn put_bloom_filter(&self, spec: &BloomFilterSpec, data: &[u8]) -> Result<()>;

    /// Drop blobs stored under legacy keys; returns how many were removed.
    async fn remove_legacy(&self, names: &[&str]) -> Result<u64>;
}
