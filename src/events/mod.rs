//! Runtime events: types and the event bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the token source, the counters and
//! the run controller.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`ShutdownReason`] event classification and payload metadata
//! - [`Bus`], [`EventStream`] lossless unbounded channel between publishers and the listener
//!
//! ## Quick reference
//! - **Publishers**: `TokenSource`, `CounterWorker`, `Controller`,
//!   `SubscriberSet` workers (panic reports).
//! - **Consumer**: the controller's listener, which hands every event to the
//!   `SubscriberSet`.

mod bus;
mod event;

pub use bus::{Bus, EventStream};
pub use event::{Event, EventKind, ShutdownReason};
