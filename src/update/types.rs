use serde::Serialize;

use crate::store::HealthSnapshot;
use crate::sync::{ApplyReport, FeedKind, Recovery};

#[derive(Serialize)]
pub struct StagedFeed { pub feed: FeedKind, pub tag: Option<String> }

// Plan envelope
#[derive(Serialize)]
pub struct UpdatePlan {
    pub fetches: usize,
    pub health: HealthSnapshot,
    pub staged: Vec<StagedFeed>,
    pub recoveries: Vec<Recovery>,
}

// Apply/result envelope
#[derive(Serialize)]
pub struct UpdateApply { pub plan: UpdatePlan, pub report: ApplyReport }
