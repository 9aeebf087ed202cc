use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::sync::{
    BloomFilterSpec, FeedApplier, FeedKind, FeedPayload, LocalHealthCheck, LocalStore, StagedUpdate,
};

use super::entity::EntityMapping;
use super::https::{self, HttpsUpgrade};
use super::{surrogates, FeedPersistence, LEGACY_LISTS};

/// Whether the two self-healing stores held data when the snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub has_disconnect_me_data: bool,
    pub has_easylist_data: bool,
}

impl HealthSnapshot {
    pub fn has_data(&self) -> bool {
        self.has_disconnect_me_data && self.has_easylist_data
    }
}

impl LocalHealthCheck for HealthSnapshot {
    fn has_disconnect_me_data(&self) -> bool { self.has_disconnect_me_data }
    fn has_easylist_data(&self) -> bool { self.has_easylist_data }
}

/// Domain stores behind the update applier, plus the derived views readers hold.
///
/// Readers get `Arc` snapshots; a successful update swaps in a freshly built
/// value instead of mutating the one already handed out.
pub struct StorageCache<P> {
    store: Arc<P>,
    entity_mapping: RwLock<Arc<EntityMapping>>,
    https_upgrade: RwLock<Arc<HttpsUpgrade>>,
}

impl<P: FeedPersistence> StorageCache<P> {
    pub async fn load(store: Arc<P>) -> Self {
        let cache = Self {
            store,
            entity_mapping: RwLock::new(Arc::new(EntityMapping::default())),
            https_upgrade: RwLock::new(Arc::new(HttpsUpgrade::default())),
        };
        cache.rebuild_entity_mapping().await;
        cache.reload_https_upgrade().await;
        cache
    }

    pub fn entity_mapping(&self) -> Arc<EntityMapping> {
        Arc::clone(&self.entity_mapping.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn https_upgrade(&self) -> Arc<HttpsUpgrade> {
        Arc::clone(&self.https_upgrade.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub async fn health(&self) -> Result<HealthSnapshot> {
        Ok(HealthSnapshot {
            has_disconnect_me_data: self.store.has_blob(FeedKind::DisconnectList).await?,
            has_easylist_data: self.store.has_blob(FeedKind::TrackerWhitelist).await?,
        })
    }

    async fn rebuild_entity_mapping(&self) {
        let mapping = match self.store.blob(FeedKind::EntityList).await {
            Ok(Some(data)) => EntityMapping::parse(&data).unwrap_or_else(|e| {
                warn!(error = %e, "stored entity list unreadable");
                EntityMapping::default()
            }),
            Ok(None) => EntityMapping::default(),
            Err(e) => {
                warn!(error = %e, "could not load entity list");
                return;
            }
        };
        debug!(domains = mapping.len(), "entity mapping rebuilt");
        *self.entity_mapping.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(mapping);
    }

    async fn reload_https_upgrade(&self) {
        let loaded = async {
            let filter = self.store.bloom_filter().await?;
            let whitelist = self.store.https_whitelist().await?;
            anyhow::Ok(HttpsUpgrade::new(filter, whitelist))
        };
        match loaded.await {
            Ok(state) => {
                debug!(filter_bytes = state.filter_len(), "https upgrade data reloaded");
                *self.https_upgrade.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(state);
            }
            Err(e) => warn!(error = %e, "could not reload https upgrade data"),
        }
    }

    async fn persist(&self, update: &StagedUpdate) -> Result<()> {
        let kind = update.kind();
        match (kind, update.payload()) {
            (FeedKind::EntityList, FeedPayload::Raw(data)) => {
                EntityMapping::parse(data)?;
                self.store.put_blob(kind, data).await
            }
            (FeedKind::DisconnectList, FeedPayload::Raw(data)) => {
                serde_json::from_slice::<serde_json::Value>(data).context("invalid disconnect list")?;
                self.store.put_blob(kind, data).await
            }
            (FeedKind::TrackerWhitelist, FeedPayload::Raw(data)) => {
                std::str::from_utf8(data).context("tracker whitelist is not utf-8")?;
                self.store.put_blob(kind, data).await
            }
            (FeedKind::Surrogates, FeedPayload::Raw(data)) => {
                let rules = surrogates::parse(data)?;
                debug!(rules = rules.len(), "surrogates parsed");
                self.store.put_blob(kind, data).await
            }
            (FeedKind::HttpsWhitelist, FeedPayload::HttpsWhitelist(hosts)) => {
                self.store.put_https_whitelist(hosts).await
            }
            (FeedKind::BloomFilter, FeedPayload::BloomFilter { spec, data }) => {
                https::verify_bloom_filter(spec, data)?;
                self.store.put_bloom_filter(spec, data).await
            }
            (kind, _) => anyhow::bail!("no store accepts {kind}"),
        }
    }
}

#[async_trait]
impl<P: FeedPersistence> FeedApplier for StorageCache<P> {
    async fn update(&self, update: &StagedUpdate) -> bool {
        let kind = update.kind();
        if let Err(e) = self.persist(update).await {
            warn!(feed = %kind, error = %e, "update rejected");
            return false;
        }

        match kind {
            FeedKind::EntityList => self.rebuild_entity_mapping().await,
            FeedKind::BloomFilter | FeedKind::HttpsWhitelist => self.reload_https_upgrade().await,
            _ => {}
        }
        true
    }
}

#[async_trait]
impl<P: FeedPersistence> LocalStore for StorageCache<P> {
    async fn bloom_filter_spec(&self) -> Option<BloomFilterSpec> {
        match self.store.bloom_filter_spec().await {
            Ok(spec) => spec,
            Err(e) => {
                warn!(error = %e, "could not read stored bloom filter spec");
                None
            }
        }
    }

    async fn remove_legacy_lists(&self) {
        match self.store.remove_legacy(&LEGACY_LISTS).await {
            Ok(0) => {}
            Ok(n) => info!(removed = n, "legacy lists removed"),
            Err(e) => warn!(error = %e, "could not remove legacy lists"),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use sha2::{Digest, Sha256};

    use super::*;
    use crate::store::memory::MemoryStore;

    fn raw(kind: FeedKind, data: &'static [u8]) -> StagedUpdate {
        StagedUpdate::new(kind, FeedPayload::Raw(Bytes::from_static(data))).unwrap()
    }

    #[tokio::test]
    async fn entity_update_swaps_in_a_new_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let cache = StorageCache::load(Arc::clone(&store)).await;
        let before = cache.entity_mapping();
        assert!(before.is_empty());

        let ok = cache.update(&raw(FeedKind::EntityList, br#"{"Acme": {"properties": ["acme.com"]}}"#)).await;
        assert!(ok);

        let after = cache.entity_mapping();
        assert_eq!(after.entity_for_host("www.acme.com"), Some("Acme"));
        // the snapshot handed out earlier is untouched
        assert!(before.is_empty());
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn invalid_payloads_are_rejected_without_persisting() {
        let store = Arc::new(MemoryStore::new());
        let cache = StorageCache::load(Arc::clone(&store)).await;

        assert!(!cache.update(&raw(FeedKind::EntityList, b"not json")).await);
        assert!(!cache.update(&raw(FeedKind::DisconnectList, b"{")).await);
        assert!(!cache.update(&raw(FeedKind::Surrogates, b"\n\n")).await);
        assert!(!store.has_named_blob("entitylist"));
        assert!(!store.has_named_blob("disconnectme"));

        let health = cache.health().await.unwrap();
        assert!(!health.has_data());
    }

    #[tokio::test]
    async fn health_reflects_persisted_lists() {
        let store = Arc::new(MemoryStore::new());
        let cache = StorageCache::load(Arc::clone(&store)).await;

        assert!(cache.update(&raw(FeedKind::DisconnectList, br#"{"categories": {}}"#)).await);
        let health = cache.health().await.unwrap();
        assert!(health.has_disconnect_me_data);
        assert!(!health.has_easylist_data);

        assert!(cache.update(&raw(FeedKind::TrackerWhitelist, b"@@||example.com^")).await);
        assert!(cache.health().await.unwrap().has_data());
    }

    #[tokio::test]
    async fn bloom_filter_update_reloads_runtime_state() {
        let store = Arc::new(MemoryStore::new());
        let cache = StorageCache::load(Arc::clone(&store)).await;
        assert!(cache.https_upgrade().spec().is_none());

        let data = Bytes::from_static(&[0xAB; 16]);
        let spec = BloomFilterSpec {
            bit_count: 128,
            error_rate: 0.001,
            total_entries: 10,
            sha256: format!("{:x}", Sha256::digest(&data)),
        };
        let update = StagedUpdate::new(
            FeedKind::BloomFilter,
            FeedPayload::BloomFilter { spec: spec.clone(), data },
        )
        .unwrap();

        assert!(cache.update(&update).await);
        let state = cache.https_upgrade();
        assert_eq!(state.spec(), Some(&spec));
        assert_eq!(state.filter_len(), 16);
        assert_eq!(LocalStore::bloom_filter_spec(&cache).await, Some(spec));
    }

    #[tokio::test]
    async fn corrupt_bloom_filter_is_not_persisted() {
        let store = Arc::new(MemoryStore::new());
        let cache = StorageCache::load(Arc::clone(&store)).await;
        let spec = BloomFilterSpec { bit_count: 8, error_rate: 0.1, total_entries: 1, sha256: "00".into() };
        let update = StagedUpdate::new(
            FeedKind::BloomFilter,
            FeedPayload::BloomFilter { spec, data: Bytes::from_static(b"x") },
        )
        .unwrap();

        assert!(!cache.update(&update).await);
        assert!(LocalStore::bloom_filter_spec(&cache).await.is_none());
    }

    #[tokio::test]
    async fn legacy_lists_are_removed() {
        let store = Arc::new(
            MemoryStore::new()
                .with_blob("easylist", b"old")
                .with_blob("easylist_privacy", b"old")
                .with_blob("surrogates", b"keep"),
        );
        let cache = StorageCache::load(Arc::clone(&store)).await;
        cache.remove_legacy_lists().await;
        assert!(!store.has_named_blob("easylist"));
        assert!(!store.has_named_blob("easylist_privacy"));
        assert!(store.has_named_blob("surrogates"));
    }
}
