use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Update;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Health, Check, Apply }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Health => "health",
        Phase::Check => "check",
        Phase::Apply => "apply",
    }}
    fn span(&self) -> Span { match self {
        Phase::Health => info_span!("health"),
        Phase::Check => info_span!("check"),
        Phase::Apply => info_span!("apply"),
    }}
}

impl OpMarker for Update {
    const NAME: &'static str = "update";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("update") }
}
