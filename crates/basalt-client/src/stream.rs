//! Cancellable lazy row streaming
//!
//! `stream_rows` produces a [`RowStream`]: a pull-based sequence of rows
//! fetched one server page at a time. The stream terminates exactly once,
//! either at end-of-rows, on a terminal error, or when the caller cancels.
//! Cancellation releases the pooled connection and stops page fetching; rows
//! already buffered are discarded, not delivered.

use crate::error::{Error, Result};
use crate::events::Emitter;
use crate::pool::PooledConnection;
use crate::transport::{StatementRequest, TransportError, TransportResponse};
use crate::types::Row;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::debug;

/// Shared cancellation flag for an in-flight operation
///
/// Cloneable; cancelling any clone cancels the operation. Once observed, the
/// operation releases its pool resources and is never retried.
#[derive(Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation has been requested.
    pub(crate) async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// A lazy sequence of rows delivered as server pages arrive
pub struct RowStream {
    rx: mpsc::Receiver<Result<Row>>,
    cancel: CancelHandle,
    finished: bool,
}

impl RowStream {
    /// Next row, `None` at end of stream (or after cancellation).
    ///
    /// A terminal error is yielded once as `Some(Err(_))`; every call after
    /// that returns `None`.
    pub async fn next(&mut self) -> Option<Result<Row>> {
        if self.finished || self.cancel.is_cancelled() {
            self.finished = true;
            return None;
        }
        match self.rx.recv().await {
            Some(Ok(row)) => {
                if self.cancel.is_cancelled() {
                    self.finished = true;
                    return None;
                }
                Some(Ok(row))
            }
            Some(Err(err)) => {
                self.finished = true;
                Some(Err(err))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    /// Stop the stream early, releasing the held connection.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Handle for cancelling this stream from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the background task that walks server pages and feeds the stream.
///
/// The task owns the pooled connection guard; every exit path drops it,
/// returning the in-flight slot to the pool. Page fetches after the first
/// are not retried: the paging state is only valid on the coordinator that
/// produced it, so a failed fetch ends the stream with a terminal error.
pub(crate) fn spawn_pump(
    conn: PooledConnection,
    mut request: StatementRequest,
    initial: TransportResponse,
    cancel: CancelHandle,
    emitter: Emitter,
) -> RowStream {
    let capacity = request.options.page_size.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    let stream = RowStream {
        rx,
        cancel: cancel.clone(),
        finished: false,
    };

    tokio::spawn(async move {
        let query = request.describe();
        let mut response = initial;
        let mut delivered = 0usize;

        loop {
            let (rows, paging_state) = match response {
                TransportResponse::Rows { rows, paging_state, .. } => (rows, paging_state),
                TransportResponse::Affected { .. } => (Vec::new(), None),
            };

            for row in rows {
                if cancel.is_cancelled() {
                    debug!(query = %query, delivered, "row stream cancelled");
                    return;
                }
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(query = %query, delivered, "row stream cancelled");
                        return;
                    }
                    sent = tx.send(Ok(row)) => {
                        if sent.is_err() {
                            // receiver dropped
                            return;
                        }
                        delivered += 1;
                    }
                }
            }

            let Some(state) = paging_state else {
                debug!(query = %query, delivered, "row stream complete");
                emitter.success(
                    "row stream complete",
                    json!({ "query": query, "rows": delivered }),
                );
                return;
            };
            request.paging_state = Some(state);

            let page = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(query = %query, delivered, "row stream cancelled");
                    return;
                }
                result = tokio::time::timeout(request.options.timeout, conn.channel().send(&request)) => result,
            };

            let transport_err = match page {
                Ok(Ok(next)) => {
                    response = next;
                    continue;
                }
                Ok(Err(err)) => err,
                Err(_) => TransportError::Timeout,
            };

            match transport_err {
                TransportError::ConnectionLost(_) => conn.mark_down(),
                TransportError::Timeout
                | TransportError::Unavailable
                | TransportError::Overloaded => conn.mark_degraded(),
                TransportError::Invalid(_) => {}
            }
            let err = Error::from_transport(transport_err, conn.node_addr(), &query, 1);
            emitter.error(
                "row stream failed",
                json!({
                    "query": query,
                    "node": conn.node_addr(),
                    "rows_delivered": delivered,
                    "error": err.to_string(),
                }),
            );
            let _ = tx.send(Err(err)).await;
            return;
        }
    });

    stream
}
