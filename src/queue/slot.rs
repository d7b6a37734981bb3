//! # Counter slot: a capacity-1 resource owned by one counter.
//!
//! A [`CounterSlot`] models the physical counter: it either serves exactly one
//! token or is empty. Each slot is moved into its counter's task, so no
//! cross-counter synchronization is needed.
//!
//! ## Rules
//! - `occupy` on an occupied slot fails with [`SlotError::Occupied`] instead of waiting.
//! - `release` on an empty slot returns `None`.

use crate::error::SlotError;
use crate::queue::Token;

/// Single-token slot of a service counter.
#[derive(Debug)]
pub struct CounterSlot {
    index: usize,
    current: Option<Token>,
}

impl CounterSlot {
    /// Creates an empty slot for the counter at `index` (0-based).
    pub fn new(index: usize) -> Self {
        Self {
            index,
            current: None,
        }
    }

    /// Builds `n` independent empty slots, indexed `0..n`.
    pub fn bank(n: usize) -> Vec<Self> {
        (0..n).map(Self::new).collect()
    }

    /// Counter index (0-based).
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Places `token` into the slot.
    pub fn occupy(&mut self, token: Token) -> Result<(), SlotError> {
        match self.current {
            Some(current) => Err(SlotError::Occupied { current }),
            None => {
                self.current = Some(token);
                Ok(())
            }
        }
    }

    /// Empties the slot and returns the token it held.
    pub fn release(&mut self) -> Option<Token> {
        self.current.take()
    }
}
