use std::collections::BTreeMap;

use serde::Serialize;

use super::kind::FeedKind;
use super::payload::StagedUpdate;

/// Local store found empty even though its revision tag matched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    DisconnectMeFix,
    EasylistFix,
}

impl Recovery {
    pub fn signal(&self) -> &'static str {
        match self {
            Recovery::DisconnectMeFix => "etag_store_oos_with_disconnectme_fix",
            Recovery::EasylistFix => "etag_store_oos_with_easylist_fix",
        }
    }

    pub fn for_kind(kind: FeedKind) -> Option<Recovery> {
        match kind {
            FeedKind::DisconnectList => Some(Recovery::DisconnectMeFix),
            FeedKind::TrackerWhitelist => Some(Recovery::EasylistFix),
            _ => None,
        }
    }
}

/// What one chain hands back when it completes.
#[derive(Debug, Default)]
pub struct Contribution {
    pub staged: Vec<StagedUpdate>,
    pub tags: Vec<(FeedKind, String)>,
    pub recoveries: Vec<Recovery>,
}

impl Contribution {
    pub fn nothing() -> Self { Self::default() }

    pub fn stage(&mut self, update: StagedUpdate) { self.staged.push(update); }

    pub fn tag(&mut self, kind: FeedKind, tag: Option<String>) {
        if let Some(tag) = tag { self.tags.push((kind, tag)); }
    }
}

/// Run-scoped accumulation of staged payloads and observed tags.
#[derive(Debug, Default)]
pub struct PendingUpdates {
    updates: BTreeMap<FeedKind, StagedUpdate>,
    tags: BTreeMap<FeedKind, String>,
    recoveries: Vec<Recovery>,
}

impl PendingUpdates {
    pub fn clear(&mut self) {
        self.updates.clear();
        self.tags.clear();
        self.recoveries.clear();
    }

    pub fn absorb(&mut self, contribution: Contribution) {
        for update in contribution.staged {
            let prev = self.updates.insert(update.kind(), update);
            debug_assert!(prev.is_none(), "two chains staged the same feed");
        }
        for (kind, tag) in contribution.tags {
            self.tags.insert(kind, tag);
        }
        self.recoveries.extend(contribution.recoveries);
    }

    pub fn is_empty(&self) -> bool { self.updates.is_empty() }

    pub fn len(&self) -> usize { self.updates.len() }

    #[cfg(test)]
    pub fn contains(&self, kind: FeedKind) -> bool { self.updates.contains_key(&kind) }

    #[cfg(test)]
    pub fn get(&self, kind: FeedKind) -> Option<&StagedUpdate> { self.updates.get(&kind) }

    pub fn updates(&self) -> impl Iterator<Item = &StagedUpdate> { self.updates.values() }

    pub fn tag(&self, kind: FeedKind) -> Option<&str> { self.tags.get(&kind).map(String::as_str) }

    pub fn tags(&self) -> &BTreeMap<FeedKind, String> { &self.tags }

    pub fn recoveries(&self) -> &[Recovery] { &self.recoveries }
}
