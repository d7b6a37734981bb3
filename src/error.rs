//! Error types used by the counterline runtime and its components.
//!
//! - [`RuntimeError`]: errors raised by the run controller itself.
//! - [`StageError`]: why a single component (source or counter) stopped.
//! - [`HandoffError`], [`SlotError`]: failures of the queueing primitives.
//!
//! Cancellation is not a failure: it surfaces as [`StageError::Canceled`] and is
//! treated as a graceful exit everywhere (see [`StageError::is_graceful`]).

use thiserror::Error;

use crate::queue::Token;

/// # Errors produced by the run controller.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration rejected before anything was spawned.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use counterline::RuntimeError;
    ///
    /// let err = RuntimeError::InvalidConfig { reason: "counters must be > 0".into() };
    /// assert_eq!(err.as_label(), "runtime_invalid_config");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidConfig { .. } => "runtime_invalid_config",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::InvalidConfig { reason } => format!("invalid config: {reason}"),
        }
    }
}

/// # Reasons a component stopped.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// Stopped because the run was cancelled.
    #[error("context cancelled")]
    Canceled,

    /// The hand-off channel was closed underneath the component.
    #[error("hand-off channel closed (token {token:?} not delivered)")]
    HandoffClosed {
        /// Token that could not be published, if any.
        token: Option<Token>,
    },

    /// A counter tried to serve a second token before releasing the first.
    #[error("counter {counter} already serving token {current}, refused token {incoming}")]
    SlotOccupied {
        /// Counter index (0-based).
        counter: usize,
        /// Token already in the slot.
        current: Token,
        /// Token that was refused.
        incoming: Token,
    },
}

impl StageError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use counterline::StageError;
    ///
    /// assert_eq!(StageError::Canceled.as_label(), "stage_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StageError::Canceled => "stage_canceled",
            StageError::HandoffClosed { .. } => "stage_handoff_closed",
            StageError::SlotOccupied { .. } => "stage_slot_occupied",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StageError::Canceled => "context cancelled".to_string(),
            StageError::HandoffClosed { token: Some(t) } => {
                format!("hand-off closed, token {t} dropped")
            }
            StageError::HandoffClosed { token: None } => "hand-off closed".to_string(),
            StageError::SlotOccupied {
                counter,
                current,
                incoming,
            } => format!("counter {counter} busy with {current}, refused {incoming}"),
        }
    }

    /// `true` for cancellation, which is a normal shutdown path rather than a failure.
    ///
    /// # Example
    /// ```
    /// use counterline::StageError;
    ///
    /// assert!(StageError::Canceled.is_graceful());
    /// assert!(!StageError::HandoffClosed { token: None }.is_graceful());
    /// ```
    pub fn is_graceful(&self) -> bool {
        matches!(self, StageError::Canceled)
    }
}

impl From<HandoffError> for StageError {
    fn from(e: HandoffError) -> Self {
        match e {
            HandoffError::Closed(t) => StageError::HandoffClosed { token: Some(t) },
        }
    }
}

/// Failure of [`Handoff::put`](crate::queue::Handoff::put).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandoffError {
    /// The channel is closed; the token is handed back.
    #[error("hand-off channel closed")]
    Closed(Token),
}

/// Failure of [`CounterSlot::occupy`](crate::queue::CounterSlot::occupy).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// The slot already holds a token.
    #[error("slot already holds token {current}")]
    Occupied {
        /// Token already in the slot.
        current: Token,
    },
}
