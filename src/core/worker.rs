//! # CounterWorker: one service counter.
//!
//! Takes tokens from the shared [`Handoff`], holds each one in its private
//! [`CounterSlot`] for the service duration, then frees the slot and loops.
//!
//! ## Event flow
//! For each token, the counter publishes:
//! ```text
//! TokenAssigned → ServiceStarted → [sleep service_time] → ServiceCompleted → CounterFree
//! ```
//!
//! ## Architecture
//! ```text
//! loop {
//!   ├─► cancelled? → exit
//!   ├─► handoff.take(ctx)          (cancellable wait)
//!   ├─► slot.occupy(token)         (never waits; occupied slot = defect → requeue, exit)
//!   ├─► occupancy.begin, publish TokenAssigned, ServiceStarted
//!   ├─► sleep(service_time)        (not preempted by cancellation)
//!   ├─► occupancy.complete, publish ServiceCompleted, CounterFree
//!   └─► slot.release()
//! }
//! ```
//!
//! ## Rules
//! - Tokens are served **sequentially** (never two at once for one counter)
//! - Cancellation is checked at **safe points** only: loop top and the take wait
//! - An in-flight service runs to completion unless the controller aborts the task

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{SlotError, StageError},
    events::{Bus, Event, EventKind},
    queue::{CounterSlot, Handoff, Token},
};

use super::occupancy::OccupancyTracker;

/// A single service counter.
pub struct CounterWorker {
    slot: CounterSlot,
    handoff: Handoff,
    bus: Bus,
    occupancy: Arc<OccupancyTracker>,
    service_time: Duration,
}

impl CounterWorker {
    /// Creates a counter that owns `slot`, consumes from `handoff` and
    /// records its services in `occupancy`.
    pub fn new(
        slot: CounterSlot,
        handoff: Handoff,
        bus: Bus,
        occupancy: Arc<OccupancyTracker>,
        service_time: Duration,
    ) -> Self {
        Self {
            slot,
            handoff,
            bus,
            occupancy,
            service_time,
        }
    }

    /// Counter index (0-based).
    pub fn index(&self) -> usize {
        self.slot.index()
    }

    /// Serves tokens until `ctx` is cancelled.
    ///
    /// ### Exit conditions
    /// - `ctx` cancelled at loop top or while waiting → [`StageError::Canceled`]
    /// - hand-off closed and empty → [`StageError::HandoffClosed`]
    /// - slot already occupied → [`StageError::SlotOccupied`]; the token just
    ///   taken goes back to the hand-off
    pub async fn run(mut self, ctx: CancellationToken) -> Result<(), StageError> {
        let counter = self.index();

        loop {
            if ctx.is_cancelled() {
                break;
            }
            let Some(token) = self.handoff.take(&ctx).await else {
                if ctx.is_cancelled() {
                    break;
                }
                return Err(StageError::HandoffClosed { token: None });
            };

            if let Err(SlotError::Occupied { current }) = self.slot.occupy(token) {
                if let Err(e) = self.handoff.requeue(token) {
                    tracing::error!(counter, %token, error = %e, "token lost on occupied slot");
                }
                return Err(StageError::SlotOccupied {
                    counter,
                    current,
                    incoming: token,
                });
            }
            self.occupancy.begin(counter, token);
            self.publish(EventKind::TokenAssigned, token);
            self.publish(EventKind::ServiceStarted, token);

            time::sleep(self.service_time).await;

            self.occupancy.complete(counter);
            self.publish(EventKind::ServiceCompleted, token);
            self.publish(EventKind::CounterFree, token);
            self.slot.release();
        }

        tracing::debug!(counter, "counter stopped");
        Err(StageError::Canceled)
    }

    fn publish(&self, kind: EventKind, token: Token) {
        self.bus.publish(
            Event::new(kind)
                .with_token(token)
                .with_counter(self.slot.index()),
        );
    }
}
