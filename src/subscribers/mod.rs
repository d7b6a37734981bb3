//! # Event subscribers for the counterline runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out,
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Source / Counter ── publish(Event) ──► Bus ──► controller listener
//!                                                        │
//!                                                        └──► SubscriberSet::deliver(Event).await
//!                                                                  ┌────┴────┬─────────┐
//!                                                                  ▼         ▼         ▼
//!                                                               LogWriter  Custom    ...
//! ```

mod log;
mod subscriber;
mod subscriber_set;

pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
