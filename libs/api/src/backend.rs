use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{
    BackendError, InventoryRecord, NewMovement, OverflowPolicy, RawChange, RecordId,
    RecordPatch, RecordQuery, Session,
};

// ════════════════════════════════════════════════════════════════
//  Backend Traits
// ════════════════════════════════════════════════════════════════

/// Bulk read access to a table.
pub trait RecordReader: Send + Sync {
    /// Fetch rows per query, newest first. With a limit this is
    /// "the N most recent rows".
    fn fetch_recent(&self, query: &RecordQuery)
        -> Pin<Box<dyn Future<Output = Result<Vec<InventoryRecord>, BackendError>> + Send + '_>>;
}

/// Single-row mutations. Each call needs a session; the backend enforces
/// row ownership. A successful mutation is eventually announced on the
/// change feed.
pub trait RecordWriter: Send + Sync {
    fn insert(&self, table: &str, session: &Session, movement: NewMovement)
        -> Pin<Box<dyn Future<Output = Result<InventoryRecord, BackendError>> + Send + '_>>;

    fn update(&self, table: &str, session: &Session, id: RecordId, patch: RecordPatch)
        -> Pin<Box<dyn Future<Output = Result<InventoryRecord, BackendError>> + Send + '_>>;

    fn delete(&self, table: &str, session: &Session, id: RecordId)
        -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>>;
}

/// Live subscription to a table's changes.
///
/// Dropping the subscription unsubscribes. The API crate only defines the
/// trait; implementations pick their own channel.
pub trait FeedSubscription: Send {
    /// Next change. None = feed closed or connection dropped; the
    /// subscription does not restart.
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = Option<RawChange>> + Send + '_>>;
}

/// Source of realtime change subscriptions.
pub trait ChangeFeed: Send + Sync {
    /// Subscribe to `resource`.
    ///
    /// - `buffer`: channel capacity
    /// - `overflow`: what the backend does when the channel is full
    #[allow(clippy::type_complexity)]
    fn subscribe(
        &self,
        resource: &str,
        buffer: usize,
        overflow: OverflowPolicy,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn FeedSubscription>, BackendError>> + Send + '_>>;
}

/// Object storage bucket access for attachments.
pub trait ObjectStore: Send + Sync {
    /// Store an object. Never overwrites: an existing path is an error.
    fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>>;

    /// Public URL of a stored object.
    fn public_url(&self, bucket: &str, path: &str) -> Result<String, BackendError>;
}

/// Password authentication and session lookup.
pub trait AuthProvider: Send + Sync {
    fn sign_in_with_password(&self, email: &str, password: &str)
        -> Pin<Box<dyn Future<Output = Result<Session, BackendError>> + Send + '_>>;

    fn sign_out(&self) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>>;

    /// Current session, if any. Err only when the lookup itself failed.
    fn current_session(&self)
        -> Pin<Box<dyn Future<Output = Result<Option<Session>, BackendError>> + Send + '_>>;

    /// Send a password-reset mail pointing at `redirect_to`.
    fn request_password_reset(&self, email: &str, redirect_to: &str)
        -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>>;
}

// ════════════════════════════════════════════════════════════════
//  BackendClient
// ════════════════════════════════════════════════════════════════

/// Explicitly constructed handle to every backend capability.
///
/// Built once by the owner of a view and passed down; there is no
/// process-wide client.
#[derive(Clone)]
pub struct BackendClient {
    pub reader: Arc<dyn RecordReader>,
    pub writer: Arc<dyn RecordWriter>,
    pub feed: Arc<dyn ChangeFeed>,
    pub storage: Arc<dyn ObjectStore>,
    pub auth: Arc<dyn AuthProvider>,
}

impl BackendClient {
    /// Wire every capability to one backend implementation.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: RecordReader + RecordWriter + ChangeFeed + ObjectStore + AuthProvider + 'static,
    {
        Self {
            reader: backend.clone(),
            writer: backend.clone(),
            feed: backend.clone(),
            storage: backend.clone(),
            auth: backend,
        }
    }
}
