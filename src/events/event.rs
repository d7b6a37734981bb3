//! # Runtime events emitted by the token source, the counters and the run controller.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Flow events**: a token's path (generated, assigned, serving, delivered, counter free)
//! - **Run events**: controller lifecycle (started, shutdown, grace outcome, finished)
//! - **Subscriber events**: a subscriber panicked
//!
//! The [`Event`] struct carries the token id, counter index and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//! Events published by one component reach subscribers in publish order.
//!
//! ## Example
//! ```rust
//! use counterline::{Event, EventKind, Token};
//!
//! let ev = Event::new(EventKind::TokenAssigned)
//!     .with_token(Token::new(4))
//!     .with_counter(1);
//!
//! assert_eq!(ev.kind, EventKind::TokenAssigned);
//! assert_eq!(ev.token, Some(Token::new(4)));
//! assert_eq!(ev.counter, Some(1));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::queue::Token;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    // === Flow events ===
    /// Source pushed a new token into the hand-off channel.
    ///
    /// Sets:
    /// - `token`
    TokenGenerated,

    /// A counter removed a token from the hand-off channel and occupied its slot.
    ///
    /// Sets:
    /// - `token`
    /// - `counter`: 0-based index
    TokenAssigned,

    /// A counter started the service for its token.
    ///
    /// Sets:
    /// - `token`
    /// - `counter`
    ServiceStarted,

    /// Service finished ("food delivered").
    ///
    /// Sets:
    /// - `token`
    /// - `counter`
    ServiceCompleted,

    /// A counter released its slot and is ready for the next token.
    ///
    /// Sets:
    /// - `token`: the token just released
    /// - `counter`
    CounterFree,

    /// A component stopped with a real failure (not cancellation).
    ///
    /// Sets:
    /// - `counter`: when the component is a counter
    /// - `reason`: error message
    StageFailed,

    // === Run events ===
    /// Controller spawned the source and all counters.
    ///
    /// Sets:
    /// - `reason`: summary of the run parameters
    RunStarted,

    /// Cancellation was broadcast.
    ///
    /// Sets:
    /// - `shutdown`: what triggered it
    ShutdownRequested,

    /// Every component stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded (or hard stop); remaining components were aborted.
    ///
    /// Sets:
    /// - `reason`: how many components were aborted
    GraceExceeded,

    /// Final event of a run. Listeners stop after observing it.
    RunFinished,
}

/// What moved the controller from running to cancelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownReason {
    /// The configured run duration elapsed.
    Elapsed,
    /// An OS termination signal arrived.
    Signal,
    /// Cancelled through [`Controller::canceller`](crate::Controller::canceller).
    External,
    /// Every component stopped on its own before any trigger fired.
    Exhausted,
}

impl ShutdownReason {
    /// Short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownReason::Elapsed => "elapsed",
            ShutdownReason::Signal => "signal",
            ShutdownReason::External => "external",
            ShutdownReason::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Event classification.
    pub kind: EventKind,

    /// Token the event refers to.
    pub token: Option<Token>,
    /// Counter index (0-based).
    pub counter: Option<usize>,
    /// Shutdown trigger (only for `ShutdownRequested`).
    pub shutdown: Option<ShutdownReason>,
    /// Human-readable reason (errors, run parameters, panic details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            kind,
            token: None,
            counter: None,
            shutdown: None,
            reason: None,
        }
    }

    /// Attaches a token.
    #[inline]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// Attaches a counter index.
    #[inline]
    pub fn with_counter(mut self, counter: usize) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Attaches the shutdown trigger.
    #[inline]
    pub fn with_shutdown(mut self, reason: ShutdownReason) -> Self {
        self.shutdown = Some(reason);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// 1-based counter number as printed in the event log.
    #[inline]
    pub fn counter_number(&self) -> Option<usize> {
        self.counter.map(|c| c + 1)
    }
}
