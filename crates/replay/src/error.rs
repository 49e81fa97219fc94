use pitchroom_core::CallId;

use crate::store::StoreError;

/// Terminal replay-session initialization failures.
///
/// Once a session is running, degradation is handled in place (silent
/// segments, clamped inputs); only initialization surfaces an error.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to load call record: {0}")]
    Load(#[from] StoreError),
    #[error("call {0} has neither segments nor a transcript to derive them from")]
    NoReplayData(CallId),
}
