//! Runtime core: components and their lifecycle.
//!
//! The public API from this module is [`Controller`] (with its builder,
//! [`RunReport`] and [`RunState`]), [`Config`], and the component types for
//! callers that want to wire them by hand.
//!
//! Internal modules:
//! - [`source`]: the fixed-cadence token generator;
//! - [`worker`]: one service counter's take / serve / release loop;
//! - [`controller`]: spawns components, decides when to stop, enforces grace;
//! - [`occupancy`]: which counter serves which token, written by the counters;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod controller;
mod occupancy;
mod shutdown;
mod source;
mod worker;

pub use builder::ControllerBuilder;
pub use config::Config;
pub use controller::{Controller, RunReport, RunState, Stage};
pub use occupancy::OccupancyTracker;
pub use source::TokenSource;
pub use worker::CounterWorker;
