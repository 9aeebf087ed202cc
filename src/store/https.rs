use std::collections::HashSet;

use anyhow::{bail, Result};
use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::sync::BloomFilterSpec;

/// Live HTTPS-upgrade data: the current bloom filter and the hosts never to upgrade.
#[derive(Debug, Default, Clone)]
pub struct HttpsUpgrade {
    filter: Option<(BloomFilterSpec, Bytes)>,
    whitelist: HashSet<String>,
}

impl HttpsUpgrade {
    pub fn new(filter: Option<(BloomFilterSpec, Bytes)>, whitelist: Vec<String>) -> Self {
        Self { filter, whitelist: whitelist.into_iter().collect() }
    }

    pub fn spec(&self) -> Option<&BloomFilterSpec> {
        self.filter.as_ref().map(|(spec, _)| spec)
    }

    pub fn filter_len(&self) -> usize {
        self.filter.as_ref().map_or(0, |(_, bits)| bits.len())
    }

    pub fn is_whitelisted(&self, host: &str) -> bool {
        self.whitelist.contains(&host.to_ascii_lowercase())
    }
}

/// Check a downloaded bloom filter body against the spec it was announced with.
pub fn verify_bloom_filter(spec: &BloomFilterSpec, data: &[u8]) -> Result<()> {
    if (data.len() as u64).saturating_mul(8) < spec.bit_count {
        bail!("bloom filter holds {} bytes, spec needs {} bits", data.len(), spec.bit_count);
    }
    let digest = format!("{:x}", Sha256::digest(data));
    if !digest.eq_ignore_ascii_case(spec.sha256.trim()) {
        bail!("bloom filter sha256 mismatch: got {digest}, expected {}", spec.sha256);
    }
    Ok(())
}
