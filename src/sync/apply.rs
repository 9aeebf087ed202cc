use serde::Serialize;
use tracing::{info, warn};

use super::kind::FeedKind;
use super::pending::PendingUpdates;
use super::traits::{FeedApplier, RevisionTagStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedOutcome {
    pub feed: FeedKind,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed_tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    pub feeds: Vec<FeedOutcome>,
}

impl ApplyReport {
    pub fn applied(&self) -> usize { self.feeds.iter().filter(|f| f.applied).count() }

    pub fn failed(&self) -> Vec<FeedKind> {
        self.feeds.iter().filter(|f| !f.applied).map(|f| f.feed).collect()
    }

    #[cfg(test)]
    pub fn outcome(&self, feed: FeedKind) -> Option<&FeedOutcome> {
        self.feeds.iter().find(|f| f.feed == feed)
    }
}

/// Apply each staged feed in turn. One feed failing never stops the others.
pub async fn apply_pending<A, T>(pending: &PendingUpdates, applier: &A, tags: &T) -> ApplyReport
where
    A: FeedApplier + ?Sized,
    T: RevisionTagStore + ?Sized,
{
    let mut report = ApplyReport::default();
    for update in pending.updates() {
        let feed = update.kind();
        if !applier.update(update).await {
            warn!(feed = %feed, "failed to apply update");
            report.feeds.push(FeedOutcome { feed, applied: false, committed_tag: None });
            continue;
        }

        let committed_tag = match pending.tag(feed) {
            Some(tag) => match tags.set_tag(feed, tag).await {
                Ok(()) => Some(tag.to_string()),
                Err(e) => {
                    warn!(feed = %feed, error = %e, "applied but revision tag not stored");
                    None
                }
            },
            None => None,
        };
        info!(feed = %feed, tag = ?committed_tag, "applied");
        report.feeds.push(FeedOutcome { feed, applied: true, committed_tag });
    }
    report
}
