//! In-process stand-in for the hosted backend.
//!
//! One `MemoryBackend` provides every trait of `tender_api::backend`:
//! tables with row ownership checks, a realtime change feed, an object
//! bucket and password auth. Used by the CLI and by tests; fault knobs
//! let tests exercise failed loads and refused subscriptions.

mod auth;
mod bucket;
pub mod config;
mod feed;

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use tender_api::{
    BackendError, InventoryRecord, NewMovement, RawChange, RecordId, RecordPatch, RecordQuery,
    RecordReader, RecordWriter, Session,
};

pub use auth::MemoryUser;
pub use bucket::StoredObject;
pub use config::MemoryBackendConfig;
pub use feed::MpscSubscription;

use auth::AuthState;
use feed::Subscriber;

// ═══════════════════════════════════════════════════════════════
//  Table
// ═══════════════════════════════════════════════════════════════

#[derive(Default)]
struct Table {
    /// Insertion order.
    rows: VecDeque<InventoryRecord>,
    next_id: i64,
    last_created_at: Option<DateTime<Utc>>,
}

impl Table {
    fn new() -> Self {
        Self { next_id: 1, ..Default::default() }
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    /// Strictly increasing creation time, even within one clock tick.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created_at {
            Some(last) if now <= last => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(ts);
        ts
    }
}

#[derive(Default)]
struct Faults {
    fail_next_fetch: AtomicBool,
    fail_next_subscribe: AtomicBool,
    fetch_delay_ms: AtomicU64,
}

// ═══════════════════════════════════════════════════════════════
//  MemoryBackend
// ═══════════════════════════════════════════════════════════════

pub struct MemoryBackend {
    config: MemoryBackendConfig,
    tables: RwLock<HashMap<String, Table>>,
    subscribers: RwLock<Vec<Subscriber>>,
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    auth: RwLock<AuthState>,
    seq: AtomicU64,
    faults: Faults,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(MemoryBackendConfig::default())
    }
}

impl MemoryBackend {
    pub fn new(config: MemoryBackendConfig) -> Self {
        let tables = config
            .tables
            .iter()
            .map(|name| (name.clone(), Table::new()))
            .collect();
        Self {
            config,
            tables: RwLock::new(tables),
            subscribers: RwLock::new(Vec::new()),
            objects: RwLock::new(HashMap::new()),
            auth: RwLock::new(AuthState::default()),
            seq: AtomicU64::new(0),
            faults: Faults::default(),
        }
    }

    /// Sequence of the last change committed (and published).
    pub fn last_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Load rows as-is, without feed events. Ids are kept; the id sequence
    /// moves past the highest one.
    pub async fn seed(&self, table: &str, rows: Vec<InventoryRecord>) -> Result<(), BackendError> {
        let mut tables = self.tables.write().await;
        let t = tables
            .get_mut(table)
            .ok_or_else(|| missing_table(table))?;
        for row in rows {
            if t.position(row.id).is_some() {
                return Err(BackendError::new(format!("duplicate key value: id {}", row.id)));
            }
            t.next_id = t.next_id.max(row.id.0 + 1);
            t.last_created_at = Some(t.last_created_at.map_or(row.created_at, |l| l.max(row.created_at)));
            t.rows.push_back(row);
        }
        while t.rows.len() > self.config.max_records {
            t.rows.pop_front();
        }
        Ok(())
    }

    /// Make the next `fetch_recent` fail with an I/O error.
    pub fn fail_next_fetch(&self) {
        self.faults.fail_next_fetch.store(true, Ordering::SeqCst);
    }

    /// Make the next `subscribe` fail with an I/O error.
    pub fn fail_next_subscribe(&self) {
        self.faults.fail_next_subscribe.store(true, Ordering::SeqCst);
    }

    /// Delay every `fetch_recent` by `delay`.
    pub fn set_fetch_delay(&self, delay: Duration) {
        self.faults
            .fetch_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn take_fault(&self, flag: &AtomicBool) -> bool {
        flag.swap(false, Ordering::SeqCst)
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn insert_row(
        &self,
        table: &str,
        session: &Session,
        movement: NewMovement,
    ) -> Result<InventoryRecord, BackendError> {
        let user_id = self.authorize(session).await?;
        if movement.created_by != user_id {
            return Err(BackendError::denied(format!(
                "new row violates row-level security policy for table \"{table}\""
            )));
        }

        let (record, change) = {
            let mut tables = self.tables.write().await;
            let t = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
            let id = RecordId(t.next_id);
            t.next_id += 1;
            let created_at = t.next_created_at();
            let record = movement.into_record(id, created_at);
            t.rows.push_back(record.clone());
            if t.rows.len() > self.config.max_records {
                t.rows.pop_front();
            }
            let change = RawChange::insert(self.next_seq(), table, &record)?;
            (record, change)
        };

        tracing::debug!(%table, id = %record.id, seq = change.seq, "row inserted");
        self.publish(change).await;
        Ok(record)
    }

    async fn update_row(
        &self,
        table: &str,
        session: &Session,
        id: RecordId,
        patch: RecordPatch,
    ) -> Result<InventoryRecord, BackendError> {
        let user_id = self.authorize(session).await?;

        let (record, change) = {
            let mut tables = self.tables.write().await;
            let t = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
            let i = owned_position(t, table, id, &user_id)?;
            patch.apply_to(&mut t.rows[i]);
            let record = t.rows[i].clone();
            let change = RawChange::update(self.next_seq(), table, &record)?;
            (record, change)
        };

        tracing::debug!(%table, %id, seq = change.seq, "row updated");
        self.publish(change).await;
        Ok(record)
    }

    async fn delete_row(&self, table: &str, session: &Session, id: RecordId) -> Result<(), BackendError> {
        let user_id = self.authorize(session).await?;

        let change = {
            let mut tables = self.tables.write().await;
            let t = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
            let i = owned_position(t, table, id, &user_id)?;
            t.rows.remove(i);
            RawChange::delete(self.next_seq(), table, id)
        };

        tracing::debug!(%table, %id, seq = change.seq, "row deleted");
        self.publish(change).await;
        Ok(())
    }
}

fn missing_table(table: &str) -> BackendError {
    BackendError::not_found(format!("relation \"{table}\" does not exist"))
}

/// Row-level security: only the owner may touch a row.
fn owned_position(t: &Table, table: &str, id: RecordId, user_id: &str) -> Result<usize, BackendError> {
    let i = t
        .position(id)
        .ok_or_else(|| BackendError::not_found(format!("no row {id} in \"{table}\"")))?;
    if t.rows[i].created_by.as_deref() != Some(user_id) {
        return Err(BackendError::denied(format!(
            "row {id} in \"{table}\" is not owned by the current user"
        )));
    }
    Ok(i)
}

// ═══════════════════════════════════════════════════════════════
//  RecordReader / RecordWriter
// ═══════════════════════════════════════════════════════════════

impl RecordReader for MemoryBackend {
    fn fetch_recent(
        &self,
        query: &RecordQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<InventoryRecord>, BackendError>> + Send + '_>> {
        let query = query.clone();
        Box::pin(async move {
            let delay = self.faults.fetch_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if self.take_fault(&self.faults.fail_next_fetch) {
                return Err(BackendError::io(format!("fetch from \"{}\" failed: connection reset", query.resource)));
            }

            let tables = self.tables.read().await;
            let t = tables
                .get(&query.resource)
                .ok_or_else(|| missing_table(&query.resource))?;

            let mut rows: Vec<InventoryRecord> = t.rows.iter().cloned().collect();
            rows.sort_by_key(|r| std::cmp::Reverse(r.created_at));
            if let Some(limit) = query.limit {
                rows.truncate(limit);
            }
            Ok(rows)
        })
    }
}

impl RecordWriter for MemoryBackend {
    fn insert(
        &self,
        table: &str,
        session: &Session,
        movement: NewMovement,
    ) -> Pin<Box<dyn Future<Output = Result<InventoryRecord, BackendError>> + Send + '_>> {
        let table = table.to_string();
        let session = session.clone();
        Box::pin(async move { self.insert_row(&table, &session, movement).await })
    }

    fn update(
        &self,
        table: &str,
        session: &Session,
        id: RecordId,
        patch: RecordPatch,
    ) -> Pin<Box<dyn Future<Output = Result<InventoryRecord, BackendError>> + Send + '_>> {
        let table = table.to_string();
        let session = session.clone();
        Box::pin(async move { self.update_row(&table, &session, id, patch).await })
    }

    fn delete(
        &self,
        table: &str,
        session: &Session,
        id: RecordId,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let table = table.to_string();
        let session = session.clone();
        Box::pin(async move { self.delete_row(&table, &session, id).await })
    }
}
