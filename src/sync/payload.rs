use std::fmt;

use bytes::Bytes;

use super::decode::BloomFilterSpec;
use super::kind::FeedKind;

/// Outcome of a single fetch attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchResult {
    Success { tag: Option<String>, payload: Bytes },
    Failure,
}

#[cfg(test)]
impl FetchResult {
    pub fn success(tag: Option<&str>, payload: impl Into<Bytes>) -> Self {
        FetchResult::Success { tag: tag.map(str::to_string), payload: payload.into() }
    }
}

/// Payload shapes a feed can be staged with.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedPayload {
    Raw(Bytes),
    HttpsWhitelist(Vec<String>),
    BloomFilter { spec: BloomFilterSpec, data: Bytes },
}

impl FeedPayload {
    fn shape(&self) -> &'static str {
        match self {
            FeedPayload::Raw(_) => "raw",
            FeedPayload::HttpsWhitelist(_) => "https_whitelist",
            FeedPayload::BloomFilter { .. } => "bloom_filter",
        }
    }

    fn fits(&self, kind: FeedKind) -> bool {
        match (kind, self) {
            (FeedKind::EntityList
            | FeedKind::DisconnectList
            | FeedKind::TrackerWhitelist
            | FeedKind::Surrogates, FeedPayload::Raw(_)) => true,
            (FeedKind::HttpsWhitelist, FeedPayload::HttpsWhitelist(_)) => true,
            (FeedKind::BloomFilter, FeedPayload::BloomFilter { .. }) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub kind: FeedKind,
    pub shape: &'static str,
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} payload cannot be staged for feed {}", self.shape, self.kind)
    }
}

impl std::error::Error for ShapeMismatch {}

/// A payload whose shape has been checked against its feed kind.
#[derive(Clone, Debug, PartialEq)]
pub struct StagedUpdate {
    kind: FeedKind,
    payload: FeedPayload,
}

impl StagedUpdate {
    pub fn new(kind: FeedKind, payload: FeedPayload) -> Result<Self, ShapeMismatch> {
        if !payload.fits(kind) {
            return Err(ShapeMismatch { kind, shape: payload.shape() });
        }
        Ok(Self { kind, payload })
    }

    pub fn kind(&self) -> FeedKind { self.kind }

    pub fn payload(&self) -> &FeedPayload { &self.payload }
}
