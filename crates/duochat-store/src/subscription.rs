//! Live query subscriptions.
//!
//! A subscription is the receiving half of an unbounded tokio channel. Every
//! item is either the full current result set of the query or the error that
//! ended it. Dropping (or [`Subscription::close`]-ing) the receiver detaches
//! it; the producer notices on its next delivery and stops.

use tokio::sync::mpsc;

use crate::error::StoreError;

/// One delivery: the full result set, or the error that ended the query.
pub type Snapshot<T> = Result<Vec<T>, StoreError>;

/// Consumer side of a live query.
///
/// The channel is unbounded: a consumer that is slow to drain (for example
/// one still enriching the previous snapshot) sees every superseded snapshot
/// in turn. Snapshots are small per-user result sets, and each one is
/// consumed in commit order, so the backlog is accepted rather than collapsed.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<Snapshot<T>>,
}

/// Producer side of a live query, held by the store.
#[derive(Debug)]
pub struct SnapshotSender<T> {
    tx: mpsc::UnboundedSender<Snapshot<T>>,
}

impl<T> Clone for SnapshotSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Subscription<T> {
    /// Create a connected producer/consumer pair.
    pub fn channel() -> (SnapshotSender<T>, Subscription<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SnapshotSender { tx }, Subscription { rx })
    }

    /// A subscription that fails immediately with `err` and then ends.
    pub fn failed(err: StoreError) -> Self {
        let (tx, sub) = Self::channel();
        tx.fail(err);
        sub
    }

    /// Wait for the next delivery. `None` once the producer is gone.
    pub async fn next(&mut self) -> Option<Snapshot<T>> {
        self.rx.recv().await
    }

    /// Detach from the producer. Pending deliveries are discarded.
    pub fn close(mut self) {
        self.rx.close();
    }
}

impl<T> SnapshotSender<T> {
    /// Push a full snapshot. Returns `false` when the consumer has detached.
    pub fn deliver(&self, rows: Vec<T>) -> bool {
        self.tx.send(Ok(rows)).is_ok()
    }

    /// Push a terminal error and drop this producer handle.
    pub fn fail(self, err: StoreError) {
        let _ = self.tx.send(Err(err));
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
