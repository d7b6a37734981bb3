//! # The `Subscribe` trait.
//!
//! Anything that wants to watch a run (the stdout log, a metrics sink, a test
//! recorder) implements [`Subscribe`] and is handed to
//! [`ControllerBuilder::with_subscriber`](crate::ControllerBuilder::with_subscriber).
//!
//! The [`SubscriberSet`](crate::SubscriberSet) gives each subscriber its own
//! bounded queue and worker task. A subscriber that falls behind makes the
//! listener wait; it never misses an event. One that panics is reported as
//! `SubscriberPanicked` and keeps receiving later events.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use counterline::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct Deliveries(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for Deliveries {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::ServiceCompleted {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "deliveries" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receives every event of a run, in publish order.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Runs on the subscriber's own worker task.
    async fn on_event(&self, event: &Event);

    /// Name used in panic reports and diagnostics. Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Events buffered for this subscriber before the listener waits (min 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
