//! Queueing primitives: tokens, the shared hand-off channel, and counter slots.
//!
//! ## Contents
//! - [`Token`], [`TokenSequence`] identifiers and their gap-free generator
//! - [`Handoff`] unbounded FIFO shared by the source and all counters
//! - [`CounterSlot`] capacity-1 resource owned by a single counter

mod handoff;
mod slot;
mod token;

pub use handoff::Handoff;
pub use slot::CounterSlot;
pub use token::{Token, TokenSequence};
