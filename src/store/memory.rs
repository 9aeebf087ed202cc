use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;

use crate::sync::{BloomFilterSpec, FeedKind, RevisionTagStore};

use super::FeedPersistence;

/// In-process stand-in for [`super::PgStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tags: Mutex<HashMap<FeedKind, String>>,
    tag_writes: Mutex<Vec<(FeedKind, String)>>,
    blobs: Mutex<HashMap<String, Bytes>>,
    whitelist: Mutex<Vec<String>>,
    bloom: Mutex<Option<(BloomFilterSpec, Bytes)>>,
    failing: Mutex<Vec<FeedKind>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(self, kind: FeedKind, tag: &str) -> Self {
        self.tags.lock().unwrap().insert(kind, tag.to_string());
        self
    }

    pub fn with_blob(self, name: &str, data: &'static [u8]) -> Self {
        self.blobs.lock().unwrap().insert(name.to_string(), Bytes::from_static(data));
        self
    }

    pub fn with_bloom_filter(self, spec: BloomFilterSpec, data: &'static [u8]) -> Self {
        *self.bloom.lock().unwrap() = Some((spec, Bytes::from_static(data)));
        self
    }

    /// Make every write for `kind` fail.
    pub fn failing(self, kind: FeedKind) -> Self {
        self.failing.lock().unwrap().push(kind);
        self
    }

    pub fn stored_tag(&self, kind: FeedKind) -> Option<String> {
        self.tags.lock().unwrap().get(&kind).cloned()
    }

    pub fn tag_writes(&self) -> Vec<(FeedKind, String)> {
        self.tag_writes.lock().unwrap().clone()
    }

    pub fn has_named_blob(&self, name: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(name)
    }

    fn check_writable(&self, kind: FeedKind) -> Result<()> {
        if self.failing.lock().unwrap().contains(&kind) {
            bail!("write rejected for {kind}");
        }
        Ok(())
    }
}

#[async_trait]
impl RevisionTagStore for MemoryStore {
    async fn tag(&self, kind: FeedKind) -> Result<Option<String>> {
        Ok(self.stored_tag(kind))
    }

    async fn set_tag(&self, kind: FeedKind, tag: &str) -> Result<()> {
        self.tags.lock().unwrap().insert(kind, tag.to_string());
        self.tag_writes.lock().unwrap().push((kind, tag.to_string()));
        Ok(())
    }
}

#[async_trait]
impl FeedPersistence for MemoryStore {
    async fn blob(&self, kind: FeedKind) -> Result<Option<Bytes>> {
        Ok(self.blobs.lock().unwrap().get(kind.name()).cloned())
    }

    async fn put_blob(&self, kind: FeedKind, data: &[u8]) -> Result<()> {
        self.check_writable(kind)?;
        self.blobs.lock().unwrap().insert(kind.name().to_string(), Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn https_whitelist(&self) -> Result<Vec<String>> {
        Ok(self.whitelist.lock().unwrap().clone())
    }

    async fn put_https_whitelist(&self, hosts: &[String]) -> Result<()> {
        self.check_writable(FeedKind::HttpsWhitelist)?;
        *self.whitelist.lock().unwrap() = hosts.to_vec();
        Ok(())
    }

    async fn bloom_filter(&self) -> Result<Option<(BloomFilterSpec, Bytes)>> {
        Ok(self.bloom.lock().unwrap().clone())
    }

    async fn bloom_filter_spec(&self) -> Result<Option<BloomFilterSpec>> {
        Ok(self.bloom.lock().unwrap().as_ref().map(|(spec, _)| spec.clone()))
    }

    async fn put_bloom_filter(&self, spec: &BloomFilterSpec, data: &[u8]) -> Result<()> {
        self.check_writable(FeedKind::BloomFilter)?;
        *self.bloom.lock().unwrap() = Some((spec.clone(), Bytes::copy_from_slice(data)));
        Ok(())
    }

    async fn remove_legacy(&self, names: &[&str]) -> Result<u64> {
        let mut blobs = self.blobs.lock().unwrap();
        let before = blobs.len();
        blobs.retain(|name, _| !names.contains(&name.as_str()));
        Ok((before - blobs.len()) as u64)
    }
}
