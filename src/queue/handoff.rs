//! # Hand-off channel between the token source and the counters.
//!
//! [`Handoff`] is an unbounded FIFO built on [`tokio::sync::mpsc::unbounded_channel`].
//! The receiving half sits behind a [`tokio::sync::Mutex`] so any number of
//! counters can wait on it; exactly one waiter receives each token.
//!
//! ## Architecture
//! ```text
//! TokenSource ── put(token) ──► [ unbounded mpsc ] ──► Mutex<Receiver>
//!                                                        ├──► counter 1: take(ctx)
//!                                                        ├──► counter 2: take(ctx)
//!                                                        └──► counter N: take(ctx)
//! ```
//!
//! ## Rules
//! - `put` never blocks; it only fails once the channel has been closed.
//! - `take` removes the earliest inserted token not yet removed.
//! - Which of several blocked takers wins a token is unspecified (the mutex queue decides).
//! - `take` is cancel-safe: a cancelled wait never removes a token.
//! - `put` / `take` counters are exposed for run reports and tests.
//! - A requeued token goes to the back and counts as not taken.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::error::HandoffError;
use crate::queue::Token;

struct Inner {
    tx: mpsc::UnboundedSender<Token>,
    rx: Mutex<mpsc::UnboundedReceiver<Token>>,
    put: AtomicU64,
    taken: AtomicU64,
}

/// Shared, cloneable handle to the hand-off queue.
///
/// Owned by the run controller and injected into the source and every counter.
#[derive(Clone)]
pub struct Handoff {
    inner: Arc<Inner>,
}

impl Handoff {
    /// Creates an empty, open channel.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                tx,
                rx: Mutex::new(rx),
                put: AtomicU64::new(0),
                taken: AtomicU64::new(0),
            }),
        }
    }

    /// Appends a token to the back of the queue.
    ///
    /// Never blocks. Returns [`HandoffError::Closed`] with the rejected token
    /// once [`close_and_drain`](Self::close_and_drain) has run.
    pub fn put(&self, token: Token) -> Result<(), HandoffError> {
        self.inner.put.fetch_add(1, Ordering::AcqRel);
        if let Err(mpsc::error::SendError(token)) = self.inner.tx.send(token) {
            self.inner.put.fetch_sub(1, Ordering::AcqRel);
            return Err(HandoffError::Closed(token));
        }
        Ok(())
    }

    /// Waits for the next token or for `ctx` to be cancelled.
    ///
    /// Returns `None` when cancelled or when the channel is closed and empty.
    /// Cancellation wins over a token that is ready at the same instant.
    pub async fn take(&self, ctx: &CancellationToken) -> Option<Token> {
        let received = tokio::select! {
            biased;
            _ = ctx.cancelled() => None,
            t = async {
                let mut rx = self.inner.rx.lock().await;
                rx.recv().await
            } => t,
        };
        if received.is_some() {
            self.inner.taken.fetch_add(1, Ordering::AcqRel);
        }
        received
    }

    /// Total tokens accepted by [`put`](Self::put).
    pub fn put_count(&self) -> u64 {
        self.inner.put.load(Ordering::Acquire)
    }

    /// Total tokens handed out by [`take`](Self::take).
    pub fn taken_count(&self) -> u64 {
        self.inner.taken.load(Ordering::Acquire)
    }

    /// `true` once [`close_and_drain`](Self::close_and_drain) has run.
    pub fn is_closed(&self) -> bool {
        self.inner.tx.is_closed()
    }

    /// Hands a taken token back to the queue, at the back.
    ///
    /// For a taker that cannot serve what it took. The token counts as not
    /// taken again, so it is either taken later or reported as pending.
    pub fn requeue(&self, token: Token) -> Result<(), HandoffError> {
        self.inner
            .tx
            .send(token)
            .map_err(|mpsc::error::SendError(token)| HandoffError::Closed(token))?;
        self.inner.taken.fetch_sub(1, Ordering::AcqRel);
        Ok(())
    }

    /// Closes the channel and returns every token still waiting, in FIFO order.
    ///
    /// Call only after all takers have stopped; it waits for the receiver lock.
    pub async fn close_and_drain(&self) -> Vec<Token> {
        let mut rx = self.inner.rx.lock().await;
        rx.close();
        let mut left = Vec::new();
        while let Ok(t) = rx.try_recv() {
            left.push(t);
        }
        left
    }
}

impl Default for Handoff {
    fn default() -> Self {
        Self::new()
    }
}
