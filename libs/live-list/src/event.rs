use tender_api::{ChangeKind, InventoryRecord, RawChange, RecordId};

use crate::SyncError;

/// A decoded change, ready to apply to a [`LiveList`](crate::LiveList).
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Created(InventoryRecord),
    Updated(InventoryRecord),
    Deleted(RecordId),
}

impl FeedEvent {
    pub fn id(&self) -> RecordId {
        match self {
            FeedEvent::Created(r) | FeedEvent::Updated(r) => r.id,
            FeedEvent::Deleted(id) => *id,
        }
    }

    /// Decode a raw feed change.
    ///
    /// Inserts and updates need a full row in `new`. Deletes need only an
    /// id, read from `old` and then `new`. Anything without a usable id is
    /// `MalformedEvent`.
    pub fn decode(raw: RawChange) -> Result<Self, SyncError> {
        let RawChange { seq, kind, new, old, .. } = raw;
        match kind {
            ChangeKind::Insert => decode_row(seq, kind, new).map(FeedEvent::Created),
            ChangeKind::Update => decode_row(seq, kind, new).map(FeedEvent::Updated),
            ChangeKind::Delete => old
                .as_ref()
                .and_then(row_id)
                .or_else(|| new.as_ref().and_then(row_id))
                .map(FeedEvent::Deleted)
                .ok_or_else(|| malformed(seq, kind, "delete carries no usable id")),
        }
    }
}

fn decode_row(
    seq: u64,
    kind: ChangeKind,
    payload: Option<serde_json::Value>,
) -> Result<InventoryRecord, SyncError> {
    let value = payload.ok_or_else(|| malformed(seq, kind, "missing row payload"))?;
    if row_id(&value).is_none() {
        return Err(malformed(seq, kind, "row has no usable id"));
    }
    serde_json::from_value(value).map_err(|e| malformed(seq, kind, e.to_string()))
}

fn row_id(value: &serde_json::Value) -> Option<RecordId> {
    value.get("id")?.as_i64().map(RecordId)
}

fn malformed(seq: u64, kind: ChangeKind, detail: impl Into<String>) -> SyncError {
    SyncError::MalformedEvent {
        seq,
        kind,
        detail: detail.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(kind: ChangeKind, new: Option<serde_json::Value>, old: Option<serde_json::Value>) -> RawChange {
        RawChange {
            seq: 9,
            resource: "inventory_logs".into(),
            kind,
            new,
            old,
        }
    }

    #[test]
    fn insert_decodes_full_row() {
        let ev = FeedEvent::decode(raw(
            ChangeKind::Insert,
            Some(json!({ "id": 3, "created_at": "2026-01-05T08:00:00Z", "quantity": 40 })),
            None,
        ))
        .unwrap();

        match ev {
            FeedEvent::Created(r) => {
                assert_eq!(r.id, RecordId(3));
                assert_eq!(r.quantity, Some(40.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn row_without_id_is_malformed() {
        let err = FeedEvent::decode(raw(
            ChangeKind::Update,
            Some(json!({ "created_at": "2026-01-05T08:00:00Z" })),
            None,
        ))
        .unwrap_err();
        assert!(matches!(err, SyncError::MalformedEvent { seq: 9, kind: ChangeKind::Update, .. }));
    }

    #[test]
    fn row_with_bad_timestamp_is_malformed() {
        let err = FeedEvent::decode(raw(
            ChangeKind::Insert,
            Some(json!({ "id": 1, "created_at": "yesterday" })),
            None,
        ))
        .unwrap_err();
        assert!(matches!(err, SyncError::MalformedEvent { .. }));
    }

    #[test]
    fn delete_reads_old_then_new() {
        let ev = FeedEvent::decode(raw(ChangeKind::Delete, None, Some(json!({ "id": 12 })))).unwrap();
        assert_eq!(ev, FeedEvent::Deleted(RecordId(12)));

        let ev = FeedEvent::decode(raw(ChangeKind::Delete, Some(json!({ "id": 13 })), Some(json!({})))).unwrap();
        assert_eq!(ev, FeedEvent::Deleted(RecordId(13)));

        let err = FeedEvent::decode(raw(ChangeKind::Delete, None, Some(json!({ "id": "x" })))).unwrap_err();
        assert!(matches!(err, SyncError::MalformedEvent { kind: ChangeKind::Delete, .. }));
    }
}
