use tender_api::{BackendError, ChangeKind};

#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// Initial bulk fetch failed. The only error surfaced to the view owner.
    #[error("load: {0}")]
    Load(BackendError),

    #[error("malformed {kind} event (seq {seq}): {detail}")]
    MalformedEvent {
        seq: u64,
        kind: ChangeKind,
        detail: String,
    },

    #[error("subscription ({resource}): {detail}")]
    Subscription { resource: String, detail: String },
}
