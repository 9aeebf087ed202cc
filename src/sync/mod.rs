//! Update reconciliation for the content-blocking feeds.

pub mod apply;
pub mod coordinator;
pub mod decode;
pub mod error;
pub mod kind;
pub mod payload;
pub mod pending;
pub mod signal;
pub mod traits;


pub use apply::ApplyReport;
pub use coordinator::UpdateCoordinator;
pub use decode::BloomFilterSpec;
pub use kind::FeedKind;
pub use payload::{FeedPayload, FetchResult, StagedUpdate};
pub use pending::Recovery;
pub use traits::{FeedApplier, LocalHealthCheck, LocalStore, RemoteFeedSource, RevisionTagStore};
