use anyhow::Result;
use async_trait::async_trait;

use super::decode::BloomFilterSpec;
use super::kind::FeedKind;
use super::payload::{FetchResult, StagedUpdate};

/// Number of independent top-level fetch chains in one run.
pub const CHAIN_COUNT: usize = 6;

#[async_trait]
pub trait RemoteFeedSource: Send + Sync {
    async fn fetch(&self, kind: FeedKind) -> FetchResult;

    /// Completion signals the coordinator should wait for.
    fn chain_count(&self) -> usize { CHAIN_COUNT }
}

#[async_trait]
pub trait RevisionTagStore: Send + Sync {
    async fn tag(&self, kind: FeedKind) -> Result<Option<String>>;
    async fn set_tag(&self, kind: FeedKind, tag: &str) -> Result<()>;
}

/// Read-only view of whether the two self-healing stores hold data.
pub trait LocalHealthCheck {
    fn has_disconnect_me_data(&self) -> bool;
    fn has_easylist_data(&self) -> bool;
}

/// Local state the coordinator consults before fetching.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn bloom_filter_spec(&self) -> Option<BloomFilterSpec>;

    async fn remove_legacy_lists(&self) {}
}

/// Decodes and persists one staged feed; `true` means persisted.
#[async_trait]
pub trait FeedApplier: Send + Sync {
    async fn update(&self, update: &StagedUpdate) -> bool;
}
