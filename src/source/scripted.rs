use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::sync::traits::CHAIN_COUNT;
use crate::sync::{FeedKind, FetchResult, RemoteFeedSource};

#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Option<&'static str>, Bytes),
    Fail,
    /// Never completes.
    Hang,
    /// Sleep, then answer with the inner reply.
    After(Duration, Box<Reply>),
}

impl Reply {
    pub fn ok(tag: Option<&'static str>, body: &'static [u8]) -> Self {
        Reply::Ok(tag, Bytes::from_static(body))
    }

    pub fn after(self, delay: Duration) -> Self {
        Reply::After(delay, Box::new(self))
    }
}

/// Answers fetches from a per-feed script and records every call.
#[derive(Debug)]
pub struct ScriptedSource {
    replies: Mutex<HashMap<FeedKind, VecDeque<Reply>>>,
    calls: Mutex<Vec<FeedKind>>,
    chains: usize,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self { replies: Mutex::default(), calls: Mutex::default(), chains: CHAIN_COUNT }
    }
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, kind: FeedKind, reply: Reply) -> Self {
        self.replies.lock().unwrap().entry(kind).or_default().push_back(reply);
        self
    }

    pub fn claiming_chains(mut self, chains: usize) -> Self {
        self.chains = chains;
        self
    }

    pub fn calls(&self) -> Vec<FeedKind> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, kind: FeedKind) -> usize {
        self.calls().iter().filter(|k| **k == kind).count()
    }
}

#[async_trait]
impl RemoteFeedSource for ScriptedSource {
    async fn fetch(&self, kind: FeedKind) -> FetchResult {
        self.calls.lock().unwrap().push(kind);
        let mut reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Reply::Fail);
        while let Reply::After(delay, next) = reply {
            tokio::time::sleep(delay).await;
            reply = *next;
        }
        match reply {
            Reply::Ok(tag, body) => FetchResult::Success { tag: tag.map(str::to_string), payload: body },
            Reply::Fail => FetchResult::Failure,
            Reply::Hang | Reply::After(..) => std::future::pending().await,
        }
    }

    fn chain_count(&self) -> usize {
        self.chains
    }
}
