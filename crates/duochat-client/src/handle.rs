//! Disposer for a running sync task.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

/// Shared flag a sync task checks before every callback.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// The single disposer of a live sync. Disposing (or dropping) it closes
/// whichever subscription the task currently holds and guarantees no
/// callback runs afterwards.
#[derive(Debug)]
pub struct SyncHandle {
    cancel: CancelFlag,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Spawn `run` on the current tokio runtime.
    pub fn spawn<F, Fut>(run: F) -> Self
    where
        F: FnOnce(CancelFlag) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancelFlag::default();
        let task = tokio::spawn(run(cancel.clone()));
        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Stop the sync. Idempotent.
    pub fn dispose(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// `false` once disposed or once the task ended on its own (terminal
    /// error, store gone).
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}
