//! Shared types and backend traits for the tender inventory client.
//!
//! The hosted backend (table storage with row ownership, object storage,
//! auth, realtime feed) is only ever reached through the traits in
//! [`backend`]. This crate has no runtime dependency.

pub mod auth;
pub mod backend;
pub mod error;
pub mod feed;
pub mod record;
pub mod util;

use serde::{Deserialize, Serialize};

pub use auth::{AuthUser, Session, UserMetadata, UserProfile};
pub use backend::{
    AuthProvider, BackendClient, ChangeFeed, FeedSubscription, ObjectStore, RecordReader,
    RecordWriter,
};
pub use error::{BackendError, ErrorKind};
pub use feed::{ChangeKind, RawChange};
pub use record::{InventoryRecord, MovementType, NewMovement, RecordId, RecordPatch};
pub use util::now_ms;

// ════════════════════════════════════════════════════════════════
//  Overflow Policy
// ════════════════════════════════════════════════════════════════

/// What a producer does when a subscriber's bounded channel is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// try_send(): drop the change and log it.
    Drop,
    /// .send().await: wait for room (back-pressure).
    #[serde(alias = "backpressure")]
    BackPressure,
}

// ════════════════════════════════════════════════════════════════
//  Queries
// ════════════════════════════════════════════════════════════════

/// Bulk read parameters. Rows always come back newest first by
/// `created_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Table name (e.g. "inventory_logs").
    pub resource: String,
    /// Maximum number of rows. None = all.
    pub limit: Option<usize>,
}

impl RecordQuery {
    /// The `limit` most recent rows of `resource`, newest first.
    pub fn recent(resource: impl Into<String>, limit: usize) -> Self {
        Self {
            resource: resource.into(),
            limit: Some(limit),
        }
    }
}
