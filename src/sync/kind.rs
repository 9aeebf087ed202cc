use std::fmt;

use serde::Serialize;

/// One independently-versioned remote feed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    EntityList,
    DisconnectList,
    TrackerWhitelist,
    Surrogates,
    BloomFilterSpec,
    BloomFilter,
    HttpsWhitelist,
}

impl FeedKind {
    #[cfg(test)]
    pub const ALL: [FeedKind; 7] = [
        FeedKind::EntityList,
        FeedKind::DisconnectList,
        FeedKind::TrackerWhitelist,
        FeedKind::Surrogates,
        FeedKind::BloomFilterSpec,
        FeedKind::BloomFilter,
        FeedKind::HttpsWhitelist,
    ];

    /// Feeds fetched by a single request and staged as raw bytes.
    pub const SIMPLE: [FeedKind; 4] = [
        FeedKind::EntityList,
        FeedKind::DisconnectList,
        FeedKind::TrackerWhitelist,
        FeedKind::Surrogates,
    ];

    /// Stable wire name; also the key for revision tags and stored blobs.
    pub fn name(&self) -> &'static str {
        match self {
            FeedKind::EntityList => "entitylist",
            FeedKind::DisconnectList => "disconnectme",
            FeedKind::TrackerWhitelist => "trackers_whitelist",
            FeedKind::Surrogates => "surrogates",
            FeedKind::BloomFilterSpec => "https_bloom_spec",
            FeedKind::BloomFilter => "https_bloom",
            FeedKind::HttpsWhitelist => "https_whitelist",
        }
    }

    #[cfg(test)]
    pub fn from_name(name: &str) -> Option<FeedKind> {
        FeedKind::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Endpoint path relative to the configured base URL.
    pub fn default_path(&self) -> &'static str {
        match self {
            FeedKind::EntityList => "contentblocking.js?l=entitylist2",
            FeedKind::DisconnectList => "contentblocking.js?l=disconnect",
            FeedKind::TrackerWhitelist => "contentblocking/trackers-whitelist.txt",
            FeedKind::Surrogates => "contentblocking.js?l=surrogates",
            FeedKind::BloomFilterSpec => "https/https-mobile-bloom-spec.json",
            FeedKind::BloomFilter => "https/https-mobile-bloom.bin",
            FeedKind::HttpsWhitelist => "https/https-mobile-whitelist.json",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
