use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use tender_api::{
    BackendError, ChangeFeed, FeedSubscription, OverflowPolicy, RawChange,
};

use crate::MemoryBackend;

// ═══════════════════════════════════════════════════════════════
//  Subscriber
// ═══════════════════════════════════════════════════════════════

pub(crate) struct Subscriber {
    resource: String,
    tx: mpsc::Sender<RawChange>,
    overflow: OverflowPolicy,
}

// ═══════════════════════════════════════════════════════════════
//  MpscSubscription
// ═══════════════════════════════════════════════════════════════

/// Receiving end of a feed subscription. Dropping it unsubscribes: the
/// next publish prunes the closed sender.
pub struct MpscSubscription {
    rx: mpsc::Receiver<RawChange>,
}

impl FeedSubscription for MpscSubscription {
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = Option<RawChange>> + Send + '_>> {
        Box::pin(async { self.rx.recv().await })
    }
}

// ═══════════════════════════════════════════════════════════════
//  Fan-out
// ═══════════════════════════════════════════════════════════════

impl MemoryBackend {
    /// Send a committed change to every subscriber of its table.
    ///
    /// Back-pressure sends are awaited in place rather than spawned, so a
    /// subscriber sees the changes of one row in commit order.
    pub(crate) async fn publish(&self, change: RawChange) {
        let copies = if self.config.duplicate_delivery { 2 } else { 1 };
        let mut subs = self.subscribers.write().await;
        let mut i = 0;
        while i < subs.len() {
            let sub = &subs[i];
            if sub.tx.is_closed() {
                subs.swap_remove(i);
                continue;
            }
            if sub.resource != change.resource {
                i += 1;
                continue;
            }

            let mut closed = false;
            for _ in 0..copies {
                match sub.overflow {
                    OverflowPolicy::Drop => match sub.tx.try_send(change.clone()) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            tracing::warn!(resource = %change.resource, seq = change.seq, "subscriber channel full, dropping");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => closed = true,
                    },
                    OverflowPolicy::BackPressure => {
                        if sub.tx.send(change.clone()).await.is_err() {
                            closed = true;
                        }
                    }
                }
                if closed {
                    break;
                }
            }

            if closed {
                subs.swap_remove(i);
                continue;
            }
            i += 1;
        }
    }

    /// Push an arbitrary change to subscribers, bypassing the table.
    /// Simulates a misbehaving feed.
    pub async fn inject_change(&self, change: RawChange) {
        self.publish(change).await;
    }

    /// Drop every subscription, as if the realtime connection went away.
    pub async fn disconnect_feed(&self) {
        let mut subs = self.subscribers.write().await;
        tracing::info!(subscribers = subs.len(), "disconnecting change feed");
        subs.clear();
    }

    /// Number of live subscriptions (closed ones are counted until the
    /// next publish prunes them).
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .await
            .iter()
            .filter(|s| !s.tx.is_closed())
            .count()
    }
}

impl ChangeFeed for MemoryBackend {
    fn subscribe(
        &self,
        resource: &str,
        buffer: usize,
        overflow: OverflowPolicy,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn FeedSubscription>, BackendError>> + Send + '_>> {
        let resource = resource.to_string();
        Box::pin(async move {
            if self.take_fault(&self.faults.fail_next_subscribe) {
                return Err(BackendError::io(format!("realtime channel for '{resource}' refused")));
            }
            if !self.config.tables.contains(&resource) {
                return Err(BackendError::not_found(format!("relation \"{resource}\" does not exist")));
            }
            let (tx, rx) = mpsc::channel(buffer.max(1));
            self.subscribers.write().await.push(Subscriber { resource: resource.clone(), tx, overflow });
            tracing::debug!(%resource, buffer, ?overflow, "feed subscriber added");
            Ok(Box::new(MpscSubscription { rx }) as Box<dyn FeedSubscription>)
        })
    }
}
