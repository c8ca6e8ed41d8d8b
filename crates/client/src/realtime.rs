//! Change-feed subscription manager.
//!
//! Wraps the backend's feed primitive behind a callback API and keeps a
//! registry of open channels so the composition root can tear everything
//! down at shutdown. One `subscribe` call opens one channel; subscribing
//! twice with the same table and predicate opens two independent channels
//! (no reference counting) - each caller closes its own.
//!
//! # Lifecycle
//!
//! Every [`Subscription`] must be closed exactly once via
//! [`Subscription::unsubscribe`]; calling it again is harmless. Dropping a
//! `Subscription` does NOT close the channel - teardown is deliberate, never
//! a side effect of scope. [`SubscriptionManager::unsubscribe_all`] is for
//! process shutdown only: it also closes channels shared by consumers that
//! are still alive.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::backend::{Backend, ChangeEvent, FeedChannel, FeedFilter, RowPredicate};

/// Handle to one live subscription.
///
/// A no-op subscription (returned when the backend is unconfigured or the
/// channel failed to open) is safe to unsubscribe; its callback is never
/// invoked.
#[derive(Debug)]
pub struct Subscription {
    handle: Option<ChannelHandle>,
}

impl Subscription {
    /// Close the underlying channel. Idempotent; safe on no-op
    /// subscriptions.
    pub fn unsubscribe(&self) {
        if let Some(handle) = &self.handle {
            handle.close();
        }
    }

    const fn noop() -> Self {
        Self { handle: None }
    }
}

/// Shared close-once state for a channel.
#[derive(Debug, Clone)]
struct ChannelHandle {
    closed: Arc<AtomicBool>,
    dispatcher: AbortHandle,
}

impl ChannelHandle {
    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.dispatcher.abort();
        }
    }
}

/// Tracks open change-feed channels by name.
///
/// Cheaply cloneable; all clones share one registry.
#[derive(Clone)]
pub struct SubscriptionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    backend: Backend,
    channels: Mutex<HashMap<String, ChannelHandle>>,
}

impl SubscriptionManager {
    /// Create a manager over the given backend handle.
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                backend,
                channels: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Subscribe to changes on `table`, optionally narrowed by `predicate`.
    ///
    /// The callback receives every INSERT/UPDATE/DELETE the backend pushes,
    /// in arrival order, interleaved with whatever else the task scheduler
    /// is running. On an unconfigured backend, or when the channel cannot
    /// be opened, the returned subscription is a no-op and the callback is
    /// never invoked.
    pub async fn subscribe<F>(
        &self,
        table: &str,
        predicate: Option<RowPredicate>,
        callback: F,
    ) -> Subscription
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        if !self.inner.backend.is_configured() {
            return Subscription::noop();
        }

        let mut filter = FeedFilter::table(table);
        if let Some(predicate) = predicate {
            filter = filter.with_predicate(predicate);
        }
        let name = filter.channel_name();

        let channel = match self.inner.backend.open_feed(&filter).await {
            Ok(channel) => channel,
            Err(error) => {
                warn!(channel = %name, %error, "failed to open change feed");
                return Subscription::noop();
            }
        };

        self.attach(name, channel, callback)
    }

    /// Wire an open channel to a callback and register it by name.
    ///
    /// Split from [`Self::subscribe`] so tests can drive fabricated
    /// channels through the same dispatch path.
    pub(crate) fn attach<F>(&self, name: String, channel: FeedChannel, callback: F) -> Subscription
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        let dispatcher = tokio::spawn(dispatch(channel, callback));
        let handle = ChannelHandle {
            closed: Arc::new(AtomicBool::new(false)),
            dispatcher: dispatcher.abort_handle(),
        };

        // A later subscribe under the same name displaces the registry
        // entry, not the channel: the displaced channel stays open and its
        // own Subscription remains the way to close it.
        let displaced = {
            let mut channels = self
                .inner
                .channels
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            channels.insert(name.clone(), handle.clone())
        };
        if displaced.is_some() {
            debug!(channel = %name, "replaced registry entry for already-open channel");
        }

        Subscription {
            handle: Some(handle),
        }
    }

    /// Close every registered channel and clear the registry.
    ///
    /// Intended for process shutdown. Channels displaced from the registry
    /// by a same-name subscribe are not reachable from here and stay open.
    pub fn unsubscribe_all(&self) {
        let channels = {
            let mut channels = self
                .inner
                .channels
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            std::mem::take(&mut *channels)
        };

        for (name, handle) in channels {
            debug!(channel = %name, "closing change feed");
            handle.close();
        }
    }

    /// How many channels the registry currently tracks.
    #[must_use]
    pub fn open_channels(&self) -> usize {
        self.inner
            .channels
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("open_channels", &self.open_channels())
            .finish_non_exhaustive()
    }
}

/// Pull events off the channel and hand them to the callback until the
/// channel runs dry or the subscription is closed.
async fn dispatch<F>(mut channel: FeedChannel, callback: F)
where
    F: Fn(ChangeEvent) + Send + Sync + 'static,
{
    while let Some(event) = channel.next_event().await {
        callback(event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::ChangeKind;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn insert(table: &str, row: Value) -> ChangeEvent {
        ChangeEvent {
            kind: ChangeKind::Insert,
            table: table.to_string(),
            new: Some(row),
            old: None,
        }
    }

    fn delete(table: &str, row: Value) -> ChangeEvent {
        ChangeEvent {
            kind: ChangeKind::Delete,
            table: table.to_string(),
            new: None,
            old: Some(row),
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_unconfigured_subscribe_is_noop() {
        let manager = SubscriptionManager::new(Backend::unconfigured());
        let invoked = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&invoked);
        let subscription = manager
            .subscribe("products", None, move |_| {
                flag.store(true, Ordering::SeqCst);
            })
            .await;

        // Callable with no effect, twice.
        subscription.unsubscribe();
        subscription.unsubscribe();

        settle().await;
        assert!(!invoked.load(Ordering::SeqCst));
        assert_eq!(manager.open_channels(), 0);
    }

    #[tokio::test]
    async fn test_insert_then_delete_leaves_no_trace() {
        let manager = SubscriptionManager::new(Backend::unconfigured());
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = FeedChannel::from_parts(rx, None);

        // A consumer keeping a projected list of product rows keyed by id,
        // the way the product list screen does.
        let projection: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let view = Arc::clone(&projection);
        let subscription = manager.attach("products:*".to_string(), channel, move |event| {
            let mut rows = view.lock().unwrap();
            match event.kind {
                ChangeKind::Insert => {
                    if let Some(new) = event.new {
                        rows.push(new);
                    }
                }
                ChangeKind::Update => {
                    if let Some(new) = event.new {
                        let id = new.get("id").cloned();
                        if let Some(row) = rows.iter_mut().find(|r| r.get("id").cloned() == id) {
                            *row = new;
                        }
                    }
                }
                ChangeKind::Delete => {
                    if let Some(old) = event.old {
                        let id = old.get("id").cloned();
                        rows.retain(|r| r.get("id").cloned() != id);
                    }
                }
            }
        });

        tx.send(insert("products", json!({"id": "p1", "name": "Wire"})))
            .unwrap();
        tx.send(delete("products", json!({"id": "p1"}))).unwrap();
        settle().await;

        assert!(projection.lock().unwrap().is_empty());
        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let manager = SubscriptionManager::new(Backend::unconfigured());
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = FeedChannel::from_parts(rx, None);

        let seen = Arc::new(Mutex::new(0_u32));
        let counter = Arc::clone(&seen);
        let subscription = manager.attach("orders:*".to_string(), channel, move |_| {
            *counter.lock().unwrap() += 1;
        });

        tx.send(insert("orders", json!({"id": "o1"}))).unwrap();
        settle().await;
        assert_eq!(*seen.lock().unwrap(), 1);

        subscription.unsubscribe();
        settle().await;
        let _ = tx.send(insert("orders", json!({"id": "o2"})));
        settle().await;
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_all_clears_registry() {
        let manager = SubscriptionManager::new(Backend::unconfigured());

        for name in ["products:*", "orders:*"] {
            let (_tx, rx) = mpsc::unbounded_channel();
            let channel = FeedChannel::from_parts(rx, None);
            let _subscription = manager.attach(name.to_string(), channel, |_| {});
        }
        assert_eq!(manager.open_channels(), 2);

        manager.unsubscribe_all();
        assert_eq!(manager.open_channels(), 0);
    }

    #[tokio::test]
    async fn test_same_name_replaces_registry_entry_only() {
        let manager = SubscriptionManager::new(Backend::unconfigured());

        let (tx1, rx1) = mpsc::unbounded_channel();
        let first_seen = Arc::new(Mutex::new(0_u32));
        let counter = Arc::clone(&first_seen);
        let first = manager.attach(
            "products:*".to_string(),
            FeedChannel::from_parts(rx1, None),
            move |_| {
                *counter.lock().unwrap() += 1;
            },
        );

        let (_tx2, rx2) = mpsc::unbounded_channel();
        let _second = manager.attach(
            "products:*".to_string(),
            FeedChannel::from_parts(rx2, None),
            |_| {},
        );

        // One registry slot, but the displaced channel still delivers.
        assert_eq!(manager.open_channels(), 1);
        tx1.send(insert("products", json!({"id": "p1"}))).unwrap();
        settle().await;
        assert_eq!(*first_seen.lock().unwrap(), 1);

        first.unsubscribe();
    }
}
