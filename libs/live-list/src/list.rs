use std::collections::VecDeque;

use tender_api::{BackendError, InventoryRecord, RecordId};

use crate::{FeedEvent, SyncError};

/// Lifecycle of a [`LiveList`]. `Uninitialized -> Ready` happens once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No bulk load yet. Feed events go to a holding list that the first
    /// `initialize` replaces.
    Uninitialized,
    Ready,
}

/// Capped, newest-first cache of records mirrored from a change feed.
///
/// Invariants: ids are unique, `len() <= limit`, order is the one set by
/// `initialize` plus prepend-on-create.
#[derive(Debug)]
pub struct LiveList {
    limit: usize,
    state: SyncState,
    records: VecDeque<InventoryRecord>,
}

impl LiveList {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            state: SyncState::Uninitialized,
            records: VecDeque::with_capacity(limit.min(1024)),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&InventoryRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Replace the cache wholesale with the result of a bulk fetch.
    ///
    /// `fetched` is expected newest first and is kept in the given order;
    /// repeated ids keep their first occurrence and the tail beyond `limit`
    /// is dropped. A failed fetch clears the cache and returns
    /// `SyncError::Load`: the caller shows an empty state, never stale rows.
    pub fn initialize(
        &mut self,
        fetched: Result<Vec<InventoryRecord>, BackendError>,
        limit: usize,
    ) -> Result<(), SyncError> {
        if self.state == SyncState::Uninitialized && !self.records.is_empty() {
            tracing::debug!(
                superseded = self.records.len(),
                "initial load replaces events buffered before it"
            );
        }
        self.limit = limit;
        self.state = SyncState::Ready;
        self.records.clear();

        let fetched = fetched.map_err(SyncError::Load)?;
        for record in fetched {
            if self.records.len() >= self.limit {
                break;
            }
            if self.position(record.id).is_some() {
                tracing::debug!(id = %record.id, "duplicate id in bulk load, keeping first");
                continue;
            }
            self.records.push_back(record);
        }
        Ok(())
    }

    /// Known id: replace in place (redelivery). New id: prepend, then drop
    /// the oldest entries beyond the limit.
    pub fn on_created(&mut self, record: InventoryRecord) {
        match self.position(record.id) {
            Some(i) => self.records[i] = record,
            None => {
                self.records.push_front(record);
                self.records.truncate(self.limit);
            }
        }
    }

    /// Replace the cached entry. Unknown ids are ignored: the record was
    /// evicted by the cap or never loaded.
    pub fn on_updated(&mut self, record: InventoryRecord) {
        match self.position(record.id) {
            Some(i) => self.records[i] = record,
            None => tracing::trace!(id = %record.id, "update for uncached record ignored"),
        }
    }

    pub fn on_deleted(&mut self, id: RecordId) {
        if let Some(i) = self.position(id) {
            self.records.remove(i);
        }
    }

    pub fn apply(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Created(r) => self.on_created(r),
            FeedEvent::Updated(r) => self.on_updated(r),
            FeedEvent::Deleted(id) => self.on_deleted(id),
        }
    }

    /// Ordered snapshot of the cache, newest first.
    pub fn current_view(&self) -> Vec<InventoryRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InventoryRecord> {
        self.records.iter()
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_770_000_000 + secs, 0).unwrap()
    }

    fn rec(id: i64) -> InventoryRecord {
        let mut r = InventoryRecord::new(RecordId(id), ts(id));
        r.material_name = Some(format!("material-{id}"));
        r
    }

    fn ids(list: &LiveList) -> Vec<i64> {
        list.iter().map(|r| r.id.0).collect()
    }

    /// r5 is the oldest, r1 the newest: sorted descending by created_at.
    fn r1_to_r5() -> Vec<InventoryRecord> {
        (1..=5).map(|i| rec(10 - i)).collect()
    }

    #[test]
    fn initialize_keeps_given_order() {
        let mut list = LiveList::new(5);
        list.initialize(Ok(r1_to_r5()), 5).unwrap();
        assert_eq!(list.state(), SyncState::Ready);
        assert_eq!(list.current_view(), r1_to_r5());
    }

    #[test]
    fn initialize_drops_duplicates_and_overflow() {
        let mut list = LiveList::new(3);
        list.initialize(Ok(vec![rec(9), rec(8), rec(9), rec(7), rec(6)]), 3).unwrap();
        assert_eq!(ids(&list), vec![9, 8, 7]);
    }

    #[test]
    fn failed_load_clears_cache() {
        let mut list = LiveList::new(5);
        list.on_created(rec(1));
        let err = list.initialize(Err(BackendError::io("connection reset")), 5).unwrap_err();
        assert!(matches!(err, SyncError::Load(_)));
        assert!(list.is_empty());
        assert_eq!(list.state(), SyncState::Ready);
    }

    #[test]
    fn create_past_capacity_evicts_oldest() {
        let mut list = LiveList::new(5);
        list.initialize(Ok(r1_to_r5()), 5).unwrap();
        list.on_created(rec(20));
        assert_eq!(ids(&list), vec![20, 9, 8, 7, 6]);
    }

    #[test]
    fn duplicate_create_is_update_in_place() {
        let mut list = LiveList::new(5);
        list.initialize(Ok(vec![rec(2), rec(1)]), 5).unwrap();

        let mut again = rec(1);
        again.remarks = Some("redelivered".into());
        list.on_created(again.clone());
        list.on_created(again);

        assert_eq!(ids(&list), vec![2, 1]);
        assert_eq!(list.get(RecordId(1)).unwrap().remarks.as_deref(), Some("redelivered"));
    }

    #[test]
    fn update_and_delete_misses_are_noops() {
        let mut list = LiveList::new(5);
        list.initialize(Ok(r1_to_r5()), 5).unwrap();
        let before = list.current_view();

        list.on_updated(rec(42));
        list.on_deleted(RecordId(42));

        assert_eq!(list.current_view(), before);
    }

    #[test]
    fn evicted_record_is_not_restored_by_update() {
        let mut list = LiveList::new(2);
        list.initialize(Ok(vec![rec(2), rec(1)]), 2).unwrap();
        list.on_created(rec(3));
        list.on_updated(rec(1));
        assert_eq!(ids(&list), vec![3, 2]);
    }

    #[test]
    fn create_then_delete_scenario() {
        let mut list = LiveList::new(5);
        list.initialize(Ok(vec![]), 5).unwrap();
        list.apply(FeedEvent::Created(rec(1)));
        list.apply(FeedEvent::Created(rec(2)));
        list.apply(FeedEvent::Deleted(RecordId(1)));
        assert_eq!(list.current_view(), vec![rec(2)]);
    }

    #[test]
    fn buffered_events_are_visible_then_superseded() {
        let mut list = LiveList::new(5);
        list.on_created(rec(30));
        assert_eq!(list.state(), SyncState::Uninitialized);
        assert_eq!(ids(&list), vec![30]);

        list.initialize(Ok(vec![rec(2), rec(1)]), 5).unwrap();
        assert_eq!(ids(&list), vec![2, 1]);
    }
}
