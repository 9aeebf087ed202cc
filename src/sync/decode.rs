use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Parameters the bloom filter body was generated with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloomFilterSpec {
    pub bit_count: u64,
    pub error_rate: f64,
    pub total_entries: u64,
    pub sha256: String,
}

#[derive(Deserialize)]
struct WhitelistDoc {
    data: Vec<String>,
}

pub fn bloom_filter_spec(json: &[u8]) -> Result<BloomFilterSpec> {
    serde_json::from_slice(json).context("invalid bloom filter specification")
}

pub fn https_whitelist(json: &[u8]) -> Result<Vec<String>> {
    let doc: WhitelistDoc = serde_json::from_slice(json).context("invalid https whitelist")?;
    let hosts = doc
        .data
        .into_iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect();
    Ok(hosts)
}
