//! # counterline
//!
//! **counterline** simulates a token-dispensing queue feeding a fixed pool of
//! service counters on top of tokio.
//!
//! A single source emits sequentially numbered tokens at a fixed cadence into
//! an unbounded hand-off queue; `N` counters each claim tokens one at a time,
//! hold them in a private capacity-1 slot for a fixed service time, then free
//! up again. A run controller owns the lifecycle and the shutdown discipline.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!            ┌──────────────────────────────────────────────────────────┐
//!            │  Controller (run lifecycle)                              │
//!            │  - Bus (lossless event channel)                          │
//!            │  - OccupancyTracker (which counter serves which token)   │
//!            │  - SubscriberSet (fans out to LogWriter / custom subs)   │
//!            │  - CancellationToken (one per run, child per component)  │
//!            └──────┬───────────────────┬───────────────────┬───────────┘
//!                   ▼                   ▼                   ▼
//!           ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!           │ TokenSource  │    │CounterWorker │ .. │CounterWorker │
//!           │ tick → put   │    │ take → serve │    │ take → serve │
//!           └──────┬───────┘    └──────▲───────┘    └──────▲───────┘
//!                  │   ┌───────────────┴───────────────────┘
//!                  ▼   │
//!           ┌──────────┴─────┐
//!           │    Handoff     │  unbounded FIFO, one winner per token
//!           └────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Idle ──► Running ──(deadline | OS signal | canceller())──► Cancelling ──► Stopped
//!
//! counter loop {
//!   ├─► cancelled? → exit
//!   ├─► take() from Handoff            (cancellable)
//!   ├─► occupy slot, publish TokenAssigned + ServiceStarted
//!   ├─► sleep(service_time)            (finishes unless aborted after grace)
//!   └─► publish ServiceCompleted + CounterFree, release slot
//! }
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use counterline::{Config, Controller, LogWriter};
//!
//! #[tokio::main(flavor = "current_thread", start_paused = true)]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         run_for: Duration::from_secs(10),
//!         handle_signals: false,
//!         ..Config::default()
//!     };
//!
//!     let report = Controller::builder(cfg)
//!         .with_subscriber(Arc::new(LogWriter::new()))
//!         .build()
//!         .run()
//!         .await?;
//!
//!     assert!(report.generated >= 3);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod queue;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    Config, Controller, ControllerBuilder, CounterWorker, OccupancyTracker, RunReport, RunState,
    Stage, TokenSource,
};
pub use error::{HandoffError, RuntimeError, SlotError, StageError};
pub use events::{Bus, Event, EventKind, EventStream, ShutdownReason};
pub use queue::{CounterSlot, Handoff, Token, TokenSequence};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
