//! Change notification between writers and readers.
//!
//! Every successful write publishes a [`ChangeEvent`] scoped to the locator
//! it was issued against. Readers hold a [`ChangeSubscription`] for the
//! locator they queried and re-query when it fires.
//!
//! # Delivery
//!
//! - **Fire-and-forget**: publishing never blocks and succeeds with no
//!   subscribers
//! - **After commit**: events are published only once the write is durable
//! - **Lagging subscribers**: if a subscriber falls more than the buffer size
//!   behind, it receives a single [`ChangeKind::Missed`] event instead of the
//!   dropped ones; treat it like any other change and re-query

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

use forecast_types::Locator;

/// Default number of buffered events per subscriber.
pub const DEFAULT_NOTIFY_BUFFER: usize = 100;

/// What happened at a locator.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new kinds
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ChangeKind {
    /// Rows were inserted or replaced.
    Inserted { count: usize },
    /// Rows were deleted.
    Deleted { count: usize },
    /// Rows were deleted and others inserted in the same commit.
    Replaced { inserted: usize, deleted: usize },
    /// Events were dropped because the subscriber lagged.
    Missed { skipped: u64 },
}

/// A change published after a committed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Locator the write was issued against.
    pub locator: Locator,
    /// What changed.
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Rows inserted at `locator`.
    pub fn inserted(locator: Locator, count: usize) -> Self {
        Self {
            locator,
            kind: ChangeKind::Inserted { count },
        }
    }

    /// Rows deleted at `locator`.
    pub fn deleted(locator: Locator, count: usize) -> Self {
        Self {
            locator,
            kind: ChangeKind::Deleted { count },
        }
    }
}

/// Publishes change events to every subscription.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeNotifier {
    /// Create a notifier buffering up to `capacity` events per subscriber.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Observe changes related to `locator`.
    pub fn subscribe(&self, locator: Locator) -> ChangeSubscription {
        ChangeSubscription {
            locator,
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish an event.
    pub fn notify(&self, event: ChangeEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of live subscriptions.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFY_BUFFER)
    }
}

/// A reader's registration for changes to one locator.
///
/// Only events whose locator is the subscribed one, an ancestor of it, or a
/// descendant of it are delivered: a bulk insert at `.../weather` wakes a
/// subscriber of `.../weather/<date>` and vice versa.
#[derive(Debug)]
pub struct ChangeSubscription {
    locator: Locator,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    /// The locator this subscription observes.
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Wait for the next relevant change.
    ///
    /// Returns `None` once the provider has been dropped.
    pub async fn changed(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.locator.is_related_to(&self.locator) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => return Some(self.missed(skipped)),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Return the next relevant change if one is already queued.
    pub fn try_changed(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.locator.is_related_to(&self.locator) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => return Some(self.missed(skipped)),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Block the current thread until the next relevant change.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context; use
    /// [`Self::changed`] there.
    pub fn blocking_changed(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.blocking_recv() {
                Ok(event) if event.locator.is_related_to(&self.locator) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => return Some(self.missed(skipped)),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn missed(&self, skipped: u64) -> ChangeEvent {
        warn!(
            "Subscriber for {} lagged, {} change events dropped",
            self.locator, skipped
        );
        ChangeEvent {
            locator: self.locator.clone(),
            kind: ChangeKind::Missed { skipped },
        }
    }
}
