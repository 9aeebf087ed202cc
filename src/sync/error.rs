use std::time::Duration;

/// Violations of the chain-count contract between coordinator and source.
/// Fetch and decode failures never surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    ChainsIncomplete { expected: usize, received: usize },
    ExcessSignals { expected: usize, surplus: usize },
    TimedOut { after: Duration, received: usize, expected: usize },
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::ChainsIncomplete { expected, received } => {
                write!(f, "fetch chains ended without signalling: {received}/{expected} completed")
            }
            SyncError::ExcessSignals { expected, surplus } => {
                write!(f, "received {surplus} completion signal(s) beyond the expected {expected}")
            }
            SyncError::TimedOut { after, received, expected } => {
                write!(f, "update run timed out after {after:?} with {received}/{expected} chains complete")
            }
        }
    }
}

impl std::error::Error for SyncError {}
