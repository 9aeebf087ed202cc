use anyhow::Result;
use serde::Serialize;
use std::marker::PhantomData;
use tracing::{info, warn, Span};

use super::{config, emit};
use crate::sync::{ApplyReport, FeedKind, Recovery};

pub trait PhaseSpan {
    fn name(&self) -> &'static str;
    fn span(&self) -> Span;
}

pub trait OpMarker {
    const NAME: &'static str;
    type Phase: PhaseSpan;
    fn root_span() -> Span;
}

pub struct LogCtx<O: OpMarker> {
    json: bool,
    _marker: PhantomData<O>,
}

impl<O: OpMarker> LogCtx<O> {
    pub fn new() -> Self { Self { json: config::logs_are_json(), _marker: PhantomData } }

    fn op_name(&self) -> &'static str { O::NAME }

    pub fn root_span_kv<'a, T>(&self, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = O::root_span();
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), "start");
        } else {
            info!(op = %self.op_name(), details = %details, "start");
        }
        span
    }

    pub fn span(&self, ph: &O::Phase) -> Span {
        if self.json { info!(op = %self.op_name(), phase = ph.name(), "span_start"); }
        ph.span()
    }

    pub fn info(&self, msg: impl AsRef<str>) { if self.json { info!(op = %self.op_name(), "{}", msg.as_ref()); } else { info!("{}", msg.as_ref()); } }
    pub fn warn(&self, msg: impl AsRef<str>) { if self.json { warn!(op = %self.op_name(), "{}", msg.as_ref()); } else { warn!("{}", msg.as_ref()); } }

    pub fn info_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); info!(op = %self.op_name(), details = %details, "{}", msg); }
        else { info!("{}", msg); }
    }

    pub fn plan<T: Serialize>(&self, plan: &T) -> Result<()> { emit::print_plan(O::NAME, plan, None) }
    pub fn result<T: Serialize>(&self, result: &T) -> Result<()> { emit::print_result(O::NAME, result, None) }
}

// Update-specific helpers
impl LogCtx<crate::telemetry::ops::update::Update> {
    pub fn staged(&self, feed: FeedKind, tag: Option<&str>) {
        if self.json { info!(op = %self.op_name(), feed = %feed, tag = ?tag, "staged"); }
        else { info!("📥 {} staged (tag={})", feed, tag.unwrap_or("-")); }
    }

    pub fn recovery(&self, recovery: Recovery) {
        if self.json { warn!(op = %self.op_name(), signal = recovery.signal(), "recovery"); }
        else { warn!("🩹 {}", recovery.signal()); }
    }

    pub fn totals(&self, report: &ApplyReport) {
        let applied = report.applied();
        let failed = report.failed().len();
        if self.json { info!(op = %self.op_name(), applied, failed, "apply_totals"); }
        else { info!("📊 Apply totals — applied={} failed={}", applied, failed); }
    }
}

fn kv_to_string<'a, T>(kv: T) -> String
where
    T: IntoIterator<Item = (&'a str, String)>,
{
    let mut parts: Vec<String> = Vec::new();
    for (k, v) in kv { parts.push(format!("{}={}", k, v)); }
    parts.join(" ")
}
