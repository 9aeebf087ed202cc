//! Fan-out/fan-in update run.
//!
//! Six chains run as independent tasks: the four simple feeds, the bloom filter
//! (spec first, body only when the spec changed) and the HTTPS whitelist. Each
//! chain owns a [`CompletionSignal`] and hands its contribution back through it
//! exactly once, so the coordinator stays the only writer of the pending state.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::apply::{self, ApplyReport};
use super::decode;
use super::error::SyncError;
use super::kind::FeedKind;
use super::payload::{FeedPayload, FetchResult, StagedUpdate};
use super::pending::{Contribution, PendingUpdates, Recovery};
use super::signal::{ChainReport, CompletionLatch, CompletionSignal, SealedLatch};
use super::traits::{FeedApplier, LocalHealthCheck, LocalStore, RemoteFeedSource, RevisionTagStore};

pub struct UpdateCoordinator<T, L> {
    tags: Arc<T>,
    local: Arc<L>,
    run_timeout: Option<Duration>,
    pending: PendingUpdates,
}

/// Health flags captured once per run and copied into the chains.
#[derive(Copy, Clone, Debug)]
struct Healing {
    has_disconnect_me_data: bool,
    has_easylist_data: bool,
}

impl Healing {
    fn capture(health: &impl LocalHealthCheck) -> Self {
        Self {
            has_disconnect_me_data: health.has_disconnect_me_data(),
            has_easylist_data: health.has_easylist_data(),
        }
    }

    /// Recovery to take for a cached feed whose local store is empty.
    fn recovery_for(&self, kind: FeedKind) -> Option<Recovery> {
        let store_empty = match kind {
            FeedKind::DisconnectList => !self.has_disconnect_me_data,
            FeedKind::TrackerWhitelist => !self.has_easylist_data,
            _ => false,
        };
        if store_empty { Recovery::for_kind(kind) } else { None }
    }
}

impl<T, L> UpdateCoordinator<T, L>
where
    T: RevisionTagStore + 'static,
    L: LocalStore + 'static,
{
    pub fn new(tags: Arc<T>, local: Arc<L>) -> Self {
        Self { tags, local, run_timeout: None, pending: PendingUpdates::default() }
    }

    /// Bound the wait for all chains; `None` waits indefinitely.
    pub fn with_run_timeout(mut self, run_timeout: Option<Duration>) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    pub fn pending(&self) -> &PendingUpdates { &self.pending }

    /// Fetch every feed and stage the ones that changed. Returns whether anything was staged.
    pub async fn check_for_updates<H, S>(&mut self, health: &H, source: Arc<S>) -> Result<bool, SyncError>
    where
        H: LocalHealthCheck,
        S: RemoteFeedSource + 'static,
    {
        self.local.remove_legacy_lists().await;
        self.pending.clear();

        let healing = Healing::capture(health);
        let latch = CompletionLatch::new();
        let mut chains = JoinSet::new();

        for kind in FeedKind::SIMPLE {
            chains.spawn(simple_chain(
                kind,
                Arc::clone(&source),
                Arc::clone(&self.tags),
                healing,
                latch.signal(kind.name()),
            ));
        }
        chains.spawn(bloom_filter_chain(
            Arc::clone(&source),
            Arc::clone(&self.local),
            latch.signal(FeedKind::BloomFilter.name()),
        ));
        chains.spawn(https_whitelist_chain(
            Arc::clone(&source),
            Arc::clone(&self.tags),
            latch.signal(FeedKind::HttpsWhitelist.name()),
        ));
        let mut latch = latch.seal();

        let expected = source.chain_count();
        let collected = collect(&mut latch, &mut chains, expected, &mut self.pending);
        let waited = match self.run_timeout {
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, collected).await;
                outcome.unwrap_or_else(|_| {
                    Err(SyncError::TimedOut { after: limit, received: latch.received(), expected })
                })
            }
            None => collected.await,
        };

        // no-op unless a timeout or an early close left chains running
        chains.abort_all();

        waited?;
        let pending = &mut self.pending;
        let surplus = latch.drain_surplus(|report| absorb(pending, report));
        if surplus > 0 {
            return Err(SyncError::ExcessSignals { expected, surplus });
        }

        info!(staged = self.pending.len(), tags = self.pending.tags().len(), "update check completed");
        Ok(!self.pending.is_empty())
    }

    /// Hand every staged feed to `applier`, committing tags for the ones it persisted.
    pub async fn apply_update<A>(&self, applier: &A) -> ApplyReport
    where
        A: FeedApplier,
    {
        apply::apply_pending(&self.pending, applier, self.tags.as_ref()).await
    }
}

fn absorb(pending: &mut PendingUpdates, report: ChainReport) {
    debug!(chain = report.chain, staged = report.contribution.staged.len(), "chain complete");
    pending.absorb(report.contribution);
}

/// Wait for `expected` signals, then for every spawned chain to finish so a
/// chain signalling past the expected count is seen rather than cut off.
async fn collect(
    latch: &mut SealedLatch,
    chains: &mut JoinSet<()>,
    expected: usize,
    pending: &mut PendingUpdates,
) -> Result<(), SyncError> {
    latch.wait(expected, |report| absorb(pending, report)).await?;
    while let Some(joined) = chains.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "fetch chain ended abnormally");
        }
    }
    Ok(())
}

fn is_cached(returned: Option<&str>, stored: Option<&str>) -> bool {
    matches!((returned, stored), (Some(r), Some(s)) if r == s)
}

async fn stored_tag<T: RevisionTagStore>(tags: &T, kind: FeedKind) -> Option<String> {
    match tags.tag(kind).await {
        Ok(tag) => tag,
        Err(e) => {
            warn!(feed = %kind, error = %e, "could not read stored revision tag");
            None
        }
    }
}

fn stage(out: &mut Contribution, kind: FeedKind, payload: FeedPayload) {
    match StagedUpdate::new(kind, payload) {
        Ok(update) => out.stage(update),
        Err(e) => warn!(feed = %kind, error = %e, "payload not staged"),
    }
}

async fn simple_chain<S, T>(kind: FeedKind, source: Arc<S>, tags: Arc<T>, healing: Healing, done: CompletionSignal)
where
    S: RemoteFeedSource,
    T: RevisionTagStore,
{
    let mut out = Contribution::nothing();
    let FetchResult::Success { tag, payload } = source.fetch(kind).await else {
        return done.complete(out);
    };

    let stored = stored_tag(tags.as_ref(), kind).await;
    let cached = is_cached(tag.as_deref(), stored.as_deref());
    out.tag(kind, tag);

    if !cached {
        stage(&mut out, kind, FeedPayload::Raw(payload));
    } else if let Some(recovery) = healing.recovery_for(kind) {
        warn!(feed = %kind, signal = recovery.signal(), "store empty despite matching tag; refreshing");
        out.recoveries.push(recovery);
        stage(&mut out, kind, FeedPayload::Raw(payload));
    } else {
        debug!(feed = %kind, "up to date");
    }
    done.complete(out);
}

async fn bloom_filter_chain<S, L>(source: Arc<S>, local: Arc<L>, done: CompletionSignal)
where
    S: RemoteFeedSource,
    L: LocalStore,
{
    let mut out = Contribution::nothing();
    let FetchResult::Success { payload, .. } = source.fetch(FeedKind::BloomFilterSpec).await else {
        return done.complete(out);
    };
    let spec = match decode::bloom_filter_spec(&payload) {
        Ok(spec) => spec,
        Err(e) => {
            warn!(feed = %FeedKind::BloomFilterSpec, error = %e, "decode failed");
            return done.complete(out);
        }
    };

    if local.bloom_filter_spec().await.as_ref() == Some(&spec) {
        info!("bloom filter already downloaded");
        return done.complete(out);
    }

    if let FetchResult::Success { payload, .. } = source.fetch(FeedKind::BloomFilter).await {
        stage(&mut out, FeedKind::BloomFilter, FeedPayload::BloomFilter { spec, data: payload });
    }
    done.complete(out);
}

async fn https_whitelist_chain<S, T>(source: Arc<S>, tags: Arc<T>, done: CompletionSignal)
where
    S: RemoteFeedSource,
    T: RevisionTagStore,
{
    let kind = FeedKind::HttpsWhitelist;
    let mut out = Contribution::nothing();
    let FetchResult::Success { tag, payload } = source.fetch(kind).await else {
        return done.complete(out);
    };

    let stored = stored_tag(tags.as_ref(), kind).await;
    if is_cached(tag.as_deref(), stored.as_deref()) {
        debug!(feed = %kind, "up to date");
        return done.complete(out);
    }

    match decode::https_whitelist(&payload) {
        Ok(hosts) => {
            stage(&mut out, kind, FeedPayload::HttpsWhitelist(hosts));
            out.tag(kind, tag);
        }
        Err(e) => warn!(feed = %kind, error = %e, "decode failed"),
    }
    done.complete(out);
}
