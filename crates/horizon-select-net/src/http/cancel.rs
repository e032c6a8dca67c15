//! Cancellable in-flight requests.
//!
//! A [`RequestHandle`] is the caller's side of a cancellation pair; the
//! matching [`Cancellation`] wraps the request future and aborts it (by
//! dropping it) as soon as the handle is cancelled. Dropping the handle
//! without cancelling leaves the request running.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use horizon_select_core::logging::targets;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{NetworkError, Result};

/// Unique identifier for a cancellable request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A handle to a pending request that can be cancelled.
#[derive(Clone, Debug)]
pub struct RequestHandle {
    /// The unique ID of this request.
    pub id: RequestId,
    cancel_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl RequestHandle {
    /// Cancel the pending request.
    ///
    /// Returns `true` if the cancellation signal was delivered, `false` if the
    /// request already completed or was already cancelled.
    pub fn cancel(&self) -> bool {
        if let Some(tx) = self.cancel_tx.lock().take() {
            let delivered = tx.send(()).is_ok();
            tracing::debug!(target: targets::NET, id = ?self.id, delivered, "request cancelled");
            delivered
        } else {
            false
        }
    }

    /// Check if the request is still pending.
    pub fn is_pending(&self) -> bool {
        self.cancel_tx.lock().is_some()
    }
}

/// The request side of a cancellation pair.
#[derive(Debug)]
pub struct Cancellation {
    id: RequestId,
    cancel_rx: oneshot::Receiver<()>,
    cancel_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl Cancellation {
    /// The ID shared with the paired [`RequestHandle`].
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Drive `request` to completion unless the paired handle cancels first.
    ///
    /// A cancelled request resolves to [`NetworkError::Cancelled`].
    pub async fn run<T, F>(self, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let Self {
            id,
            cancel_rx,
            cancel_tx,
        } = self;

        let result = tokio::select! {
            result = request => result,
            // A dropped handle closes the channel; only an explicit cancel aborts.
            Ok(()) = cancel_rx => Err(NetworkError::Cancelled),
        };

        // Mark the handle as completed
        cancel_tx.lock().take();
        if result.is_ok() {
            tracing::trace!(target: targets::NET, ?id, "request completed");
        }
        result
    }
}

/// Create a linked handle/cancellation pair for one request.
pub fn cancellation_pair() -> (RequestHandle, Cancellation) {
    let id = RequestId::new();
    let (tx, rx) = oneshot::channel();
    let cancel_tx = Arc::new(Mutex::new(Some(tx)));
    (
        RequestHandle {
            id,
            cancel_tx: cancel_tx.clone(),
        },
        Cancellation {
            id,
            cancel_rx: rx,
            cancel_tx,
        },
    )
}
