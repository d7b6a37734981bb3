//! # Event bus for runtime events.
//!
//! [`Bus`] is the publishing half of an unbounded [`tokio::sync::mpsc`] channel.
//! Every component holds a clone; the controller's listener owns the single
//! receiving half and forwards events to the subscribers.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                 Consumer (one):
//!   TokenSource ──┐
//!   Counter 1   ──┼──────► Bus ───────► controller listener ────► SubscriberSet
//!   Counter N   ──┤  (unbounded mpsc)
//!   Controller  ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits.
//! - **Lossless**: an event is dropped only once the receiver is gone (after the run).
//! - **Per-publisher order**: events from one component arrive in publish order.

use tokio::sync::mpsc;

use super::event::Event;

/// Receiving half of the bus, owned by the controller's listener.
pub type EventStream = mpsc::UnboundedReceiver<Event>;

/// Cloneable publisher for runtime events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: mpsc::UnboundedSender<Event>,
}

impl Bus {
    /// Creates a bus and the stream that receives everything published on it.
    pub fn channel() -> (Self, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publishes an event.
    ///
    /// After the stream is dropped the event is discarded.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }
}
