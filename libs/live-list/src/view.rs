use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use tender_api::{
    BackendError, ChangeFeed, FeedSubscription, InventoryRecord, OverflowPolicy, RawChange,
    RecordQuery, RecordReader,
};

use crate::{FeedEvent, LiveList, SyncError};

// ═══════════════════════════════════════════════════════════════
//  Config & snapshots
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct LiveViewConfig {
    /// Table to mirror (e.g. "inventory_logs").
    pub resource: String,
    /// Maximum number of records held by the view.
    pub limit: usize,
    /// Feed subscription buffer.
    pub buffer: usize,
    pub overflow: OverflowPolicy,
}

impl LiveViewConfig {
    pub fn new(resource: impl Into<String>, limit: usize) -> Self {
        Self {
            resource: resource.into(),
            limit,
            buffer: 256,
            overflow: OverflowPolicy::BackPressure,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewStatus {
    /// Bulk fetch still in flight.
    Loading,
    Ready,
    /// Bulk fetch failed; the view shows an empty state.
    LoadFailed(String),
}

/// What the view owner renders. Published after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub status: ViewStatus,
    pub records: Vec<InventoryRecord>,
    /// Highest feed sequence observed, applied or dropped.
    pub last_seq: u64,
    /// Feed events dropped as malformed.
    pub malformed: u64,
    /// The feed is gone; records may lag behind the backend until reconnect.
    pub stale: bool,
}

impl ViewSnapshot {
    fn loading(stale: bool) -> Self {
        Self {
            status: ViewStatus::Loading,
            records: Vec::new(),
            last_seq: 0,
            malformed: 0,
            stale,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  LiveView
// ═══════════════════════════════════════════════════════════════

/// A mounted live list: one dispatcher task owning a [`LiveList`],
/// fed by the initial bulk fetch and by the change feed.
///
/// Dropping or closing the view cancels the dispatcher, which releases the
/// feed subscription before the cache. Reconnecting means opening a new
/// view.
pub struct LiveView {
    token: CancellationToken,
    snapshots: watch::Receiver<ViewSnapshot>,
    handle: Option<JoinHandle<()>>,
}

impl LiveView {
    /// Subscribe to the feed, start the bulk fetch and spawn the dispatcher.
    ///
    /// Never fails: a failed subscription leaves a stale but valid view,
    /// a failed fetch surfaces as `ViewStatus::LoadFailed`.
    pub async fn open(
        reader: Arc<dyn RecordReader>,
        feed: Arc<dyn ChangeFeed>,
        config: LiveViewConfig,
    ) -> Self {
        let token = CancellationToken::new();

        // Subscribe before fetching so nothing committed during the fetch is missed.
        let subscription = match feed
            .subscribe(&config.resource, config.buffer, config.overflow)
            .await
        {
            Ok(sub) => Some(sub),
            Err(e) => {
                let err = SyncError::Subscription {
                    resource: config.resource.clone(),
                    detail: e.to_string(),
                };
                tracing::warn!(error = %err, "live updates unavailable, view may go stale");
                None
            }
        };

        let (snapshot_tx, snapshots) = watch::channel(ViewSnapshot::loading(subscription.is_none()));

        let (load_tx, load_rx) = oneshot::channel();
        let query = RecordQuery::recent(config.resource.clone(), config.limit);
        let alive = token.clone();
        tokio::spawn(async move {
            let fetched = reader.fetch_recent(&query).await;
            if alive.is_cancelled() {
                tracing::debug!(resource = %query.resource, "view closed before initial load resolved, ignoring");
                return;
            }
            let _ = load_tx.send(fetched);
        });

        let dispatcher = Dispatcher {
            list: LiveList::new(config.limit),
            limit: config.limit,
            resource: config.resource,
            snapshot_tx,
            last_seq: 0,
            malformed: 0,
            stale: subscription.is_none(),
            status: ViewStatus::Loading,
        };
        let handle = tokio::spawn(dispatcher.run(subscription, load_rx, token.clone()));

        Self {
            token,
            snapshots,
            handle: Some(handle),
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    pub fn watch(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `pred`, up to `timeout`.
    pub async fn wait_until<F>(&self, pred: F, timeout: Duration) -> Option<ViewSnapshot>
    where
        F: FnMut(&ViewSnapshot) -> bool,
    {
        let mut rx = self.snapshots.clone();
        match tokio::time::timeout(timeout, rx.wait_for(pred)).await {
            Ok(Ok(snapshot)) => Some(snapshot.clone()),
            _ => None,
        }
    }

    /// Wait until the initial load resolved and every feed change up to
    /// `seq` was observed.
    pub async fn wait_for_seq(&self, seq: u64, timeout: Duration) -> Option<ViewSnapshot> {
        self.wait_until(
            |s| s.status != ViewStatus::Loading && s.last_seq >= seq,
            timeout,
        )
        .await
    }

    /// Tear down: stop the dispatcher and wait for it to release the
    /// subscription and the cache.
    pub async fn close(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

// ═══════════════════════════════════════════════════════════════
//  Dispatcher
// ═══════════════════════════════════════════════════════════════

struct Dispatcher {
    list: LiveList,
    limit: usize,
    resource: String,
    snapshot_tx: watch::Sender<ViewSnapshot>,
    last_seq: u64,
    malformed: u64,
    stale: bool,
    status: ViewStatus,
}

impl Dispatcher {
    async fn run(
        mut self,
        mut subscription: Option<Box<dyn FeedSubscription>>,
        mut load_rx: oneshot::Receiver<Result<Vec<InventoryRecord>, BackendError>>,
        token: CancellationToken,
    ) {
        let mut loaded = false;

        loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => break,

                fetched = &mut load_rx, if !loaded => {
                    loaded = true;
                    let fetched = fetched
                        .unwrap_or_else(|_| Err(BackendError::io("initial load task aborted")));
                    self.initialize(fetched);
                }

                change = next_change(&mut subscription) => match change {
                    Some(raw) => self.on_change(raw),
                    None => {
                        let err = SyncError::Subscription {
                            resource: self.resource.clone(),
                            detail: "feed closed".into(),
                        };
                        tracing::warn!(error = %err, "live updates stopped, view may go stale");
                        subscription = None;
                        self.stale = true;
                        self.publish();
                    }
                },
            }
        }

        // Unsubscribe strictly before the cache goes away.
        drop(subscription);
        tracing::debug!(resource = %self.resource, "live view closed");
    }

    fn initialize(&mut self, fetched: Result<Vec<InventoryRecord>, BackendError>) {
        match self.list.initialize(fetched, self.limit) {
            Ok(()) => {
                tracing::info!(resource = %self.resource, count = self.list.len(), "initial load applied");
                self.status = ViewStatus::Ready;
            }
            Err(e) => {
                tracing::error!(resource = %self.resource, error = %e, "initial load failed");
                self.status = ViewStatus::LoadFailed(e.to_string());
            }
        }
        self.publish();
    }

    fn on_change(&mut self, raw: RawChange) {
        if raw.resource != self.resource {
            tracing::debug!(resource = %raw.resource, seq = raw.seq, "change for another table ignored");
            return;
        }
        self.last_seq = self.last_seq.max(raw.seq);

        match FeedEvent::decode(raw) {
            Ok(event) => {
                tracing::trace!(resource = %self.resource, id = %event.id(), "applying feed event");
                self.list.apply(event);
            }
            Err(e) => {
                self.malformed += 1;
                tracing::warn!(resource = %self.resource, error = %e, "dropping malformed feed event");
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(ViewSnapshot {
            status: self.status.clone(),
            records: self.list.current_view(),
            last_seq: self.last_seq,
            malformed: self.malformed,
            stale: self.stale,
        });
    }
}

async fn next_change(subscription: &mut Option<Box<dyn FeedSubscription>>) -> Option<RawChange> {
    match subscription {
        Some(sub) => sub.recv().await,
        None => std::future::pending().await,
    }
}
