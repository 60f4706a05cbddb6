use serde::{Deserialize, Serialize};

use crate::{BackendError, InventoryRecord, RecordId};

/// Kind of committed mutation announced on the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Insert => f.write_str("INSERT"),
            ChangeKind::Update => f.write_str("UPDATE"),
            ChangeKind::Delete => f.write_str("DELETE"),
        }
    }
}

/// A change as delivered by the realtime feed, before decoding.
///
/// Payloads stay as JSON rows: the feed makes no promise that `new`/`old`
/// carry every column, or any at all. Consumers decode and reject
/// unusable changes themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChange {
    /// Commit sequence of the mutation on the backend. Redelivered changes
    /// repeat their sequence.
    pub seq: u64,
    /// Table the change belongs to.
    pub resource: String,
    pub kind: ChangeKind,
    #[serde(default)]
    pub new: Option<serde_json::Value>,
    #[serde(default)]
    pub old: Option<serde_json::Value>,
}

impl RawChange {
    pub fn insert(seq: u64, resource: &str, record: &InventoryRecord) -> Result<Self, BackendError> {
        Ok(Self {
            seq,
            resource: resource.to_string(),
            kind: ChangeKind::Insert,
            new: Some(serde_json::to_value(record)?),
            old: None,
        })
    }

    pub fn update(seq: u64, resource: &str, record: &InventoryRecord) -> Result<Self, BackendError> {
        Ok(Self {
            seq,
            resource: resource.to_string(),
            kind: ChangeKind::Update,
            new: Some(serde_json::to_value(record)?),
            old: Some(serde_json::json!({ "id": record.id })),
        })
    }

    /// Deletes only carry the primary key in `old`.
    pub fn delete(seq: u64, resource: &str, id: RecordId) -> Self {
        Self {
            seq,
            resource: resource.to_string(),
            kind: ChangeKind::Delete,
            new: None,
            old: Some(serde_json::json!({ "id": id })),
        }
    }
}
