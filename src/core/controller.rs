//! # Controller: owns the run lifecycle of the source and all counters.
//!
//! The [`Controller`] owns the event bus, the hand-off channel, the counter
//! slots, the occupancy tracker and the subscribers. It spawns the components,
//! decides when the run ends, broadcasts cancellation, and enforces the
//! shutdown grace period.
//!
//! ## State machine
//! ```text
//! Idle ──run()──► Running ──deadline | signal | canceller()──► Cancelling ──► Stopped
//! ```
//!
//! ## High-level architecture
//! ```text
//! Preparation:
//!   - Bus::channel(); listener: EventStream ─► SubscriberSet::deliver (waits, never drops)
//!   - Handoff::new(), CounterSlot::bank(counters), OccupancyTracker (written by counters)
//!
//! Spawn (JoinSet):
//!   TokenSource::run(token.child_token())
//!   CounterWorker[0..N]::run(token.child_token())     (one slot moved into each)
//!
//! Running:
//!   select! { deadline, OS signal, canceller(), component exits }
//!
//! Shutdown path:
//!   Bus.publish(ShutdownRequested{reason})
//!   runtime_token.cancel()   → propagates to child tokens
//!   grace > 0: wait up to grace ─┬─ all joined → AllStoppedWithin
//!                                └─ exceeded   → abort_all → GraceExceeded
//!   grace = 0: abort_all (hard stop) → GraceExceeded
//!   Bus.publish(RunFinished) → listener drains → SubscriberSet::shutdown
//! ```
//!
//! ## Shutdown policy
//! Cancellation never preempts a service in progress. Counters finish their
//! current token if it completes within `grace`; anything still running after
//! that is aborted and reported in [`RunReport::interrupted`]. Report counts
//! come from the hand-off and the tracker, never from the event stream.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::{
    config::Config, occupancy::OccupancyTracker, shutdown, source::TokenSource,
    worker::CounterWorker,
};
use crate::error::{RuntimeError, StageError};
use crate::events::{Bus, Event, EventKind, EventStream, ShutdownReason};
use crate::queue::{CounterSlot, Handoff, Token};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Lifecycle phase of a [`Controller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Built, not started.
    Idle,
    /// Source and counters are running.
    Running,
    /// Cancellation broadcast, waiting for components.
    Cancelling,
    /// Every component stopped; subscribers drained.
    Stopped,
}

/// Identifies a spawned component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The token source.
    Source,
    /// Counter by 0-based index.
    Counter(usize),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Source => f.write_str("source"),
            Stage::Counter(i) => write!(f, "counter-{}", i + 1),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// What ended the run.
    pub reason: ShutdownReason,
    /// Tokens pushed into the hand-off channel.
    pub generated: u64,
    /// Tokens taken by a counter.
    pub assigned: u64,
    /// Tokens whose service completed.
    pub delivered: u64,
    /// Tokens still queued at the end, in FIFO order.
    pub pending: Vec<Token>,
    /// `(counter, token)` services cut off by the hard stop.
    pub interrupted: Vec<(usize, Token)>,
    /// `true` when components had to be aborted.
    pub forced: bool,
}

type StageExit = (Stage, Result<(), StageError>);

/// Coordinates the token source, the counters, event delivery and shutdown.
pub struct Controller {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    occupancy: Arc<OccupancyTracker>,
    external: CancellationToken,
    state: watch::Sender<RunState>,
}

impl Controller {
    /// Starts building a controller for `cfg`.
    pub fn builder(cfg: Config) -> super::builder::ControllerBuilder {
        super::builder::ControllerBuilder::new(cfg)
    }

    pub(super) fn new_internal(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            cfg,
            subscribers,
            occupancy: Arc::new(OccupancyTracker::new()),
            external: CancellationToken::new(),
            state,
        }
    }

    /// Token that ends the run when cancelled (reported as [`ShutdownReason::External`]).
    pub fn canceller(&self) -> CancellationToken {
        self.external.clone()
    }

    /// Watches the lifecycle phase.
    pub fn state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Runs the simulation until the deadline, a signal, or an external cancel,
    /// then shuts everything down and reports.
    pub async fn run(self) -> Result<RunReport, RuntimeError> {
        self.cfg.validate()?;

        let (bus, events) = Bus::channel();
        let subs = SubscriberSet::new(self.subscribers.clone(), bus.clone());
        let listener = tokio::spawn(listen(events, subs));

        bus.publish(Event::new(EventKind::RunStarted).with_reason(format!(
            "counters={} period={:?} service={:?}",
            self.cfg.counters, self.cfg.token_period, self.cfg.service_time
        )));
        let handoff = Handoff::new();
        let runtime_token = CancellationToken::new();
        let mut set = JoinSet::new();
        self.spawn_components(&mut set, &bus, &handoff, &runtime_token);
        self.state.send_replace(RunState::Running);
        tracing::info!(
            counters = self.cfg.counters,
            run_for = ?self.cfg.deadline(),
            "run started"
        );

        let reason = self.drive(&mut set, &bus).await;

        self.state.send_replace(RunState::Cancelling);
        tracing::info!(%reason, "shutdown requested");
        bus.publish(Event::new(EventKind::ShutdownRequested).with_shutdown(reason));
        runtime_token.cancel();

        let forced = self.stop_components(&mut set, &bus).await;

        bus.publish(Event::new(EventKind::RunFinished));
        match listener.await {
            Ok(subs) => subs.shutdown().await,
            Err(e) => tracing::error!(error = %e, "event listener failed"),
        }

        let interrupted = self.occupancy.snapshot();
        if !interrupted.is_empty() {
            tracing::warn!(?interrupted, "services interrupted by hard stop");
        }
        let report = RunReport {
            reason,
            generated: handoff.put_count(),
            assigned: handoff.taken_count(),
            delivered: self.occupancy.delivered(),
            pending: handoff.close_and_drain().await,
            interrupted,
            forced,
        };
        self.state.send_replace(RunState::Stopped);
        tracing::info!(
            generated = report.generated,
            delivered = report.delivered,
            pending = report.pending.len(),
            "run stopped"
        );
        Ok(report)
    }

    /// Spawns the source and one counter per slot.
    fn spawn_components(
        &self,
        set: &mut JoinSet<StageExit>,
        bus: &Bus,
        handoff: &Handoff,
        runtime_token: &CancellationToken,
    ) {
        let source = TokenSource::new(handoff.clone(), bus.clone(), self.cfg.token_period);
        let ctx = runtime_token.child_token();
        set.spawn(async move { (Stage::Source, source.run(ctx).await) });

        for slot in CounterSlot::bank(self.cfg.counters) {
            let stage = Stage::Counter(slot.index());
            let worker = CounterWorker::new(
                slot,
                handoff.clone(),
                bus.clone(),
                Arc::clone(&self.occupancy),
                self.cfg.service_time,
            );
            let ctx = runtime_token.child_token();
            set.spawn(async move { (stage, worker.run(ctx).await) });
        }
    }

    /// Waits for the first shutdown trigger while reaping components that exit early.
    async fn drive(&self, set: &mut JoinSet<StageExit>, bus: &Bus) -> ShutdownReason {
        let deadline = async {
            match self.cfg.deadline() {
                Some(d) => time::sleep(d).await,
                None => std::future::pending().await,
            }
        };
        let signal = shutdown::shutdown_signal(self.cfg.handle_signals);
        tokio::pin!(deadline);
        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = &mut deadline => return ShutdownReason::Elapsed,
                _ = &mut signal => return ShutdownReason::Signal,
                _ = self.external.cancelled() => return ShutdownReason::External,
                joined = set.join_next() => match joined {
                    Some(res) => record_exit(bus, res),
                    None => return ShutdownReason::Exhausted,
                },
            }
        }
    }

    /// Waits up to `grace` for components, then aborts the rest.
    ///
    /// Returns `true` if anything had to be aborted.
    async fn stop_components(&self, set: &mut JoinSet<StageExit>, bus: &Bus) -> bool {
        if !self.cfg.is_hard_stop() {
            let done = async {
                while let Some(res) = set.join_next().await {
                    record_exit(bus, res);
                }
            };
            if time::timeout(self.cfg.grace, done).await.is_ok() {
                bus.publish(Event::new(EventKind::AllStoppedWithin));
                return false;
            }
        }

        let aborted = set.len();
        if aborted == 0 {
            bus.publish(Event::new(EventKind::AllStoppedWithin));
            return false;
        }
        set.abort_all();
        while let Some(res) = set.join_next().await {
            record_exit(bus, res);
        }
        tracing::warn!(aborted, grace = ?self.cfg.grace, "components aborted");
        bus.publish(
            Event::new(EventKind::GraceExceeded)
                .with_reason(format!("aborted {aborted} component(s) after {:?}", self.cfg.grace)),
        );
        true
    }
}

/// Hands every event to the subscribers until `RunFinished` has been delivered.
async fn listen(mut events: EventStream, subs: SubscriberSet) -> SubscriberSet {
    while let Some(ev) = events.recv().await {
        let last = ev.kind == EventKind::RunFinished;
        subs.deliver(ev).await;
        if last {
            break;
        }
    }
    subs
}

/// Logs one component exit and reports real failures on the bus.
fn record_exit(bus: &Bus, res: Result<StageExit, JoinError>) {
    match res {
        Ok((stage, Ok(()))) => tracing::debug!(%stage, "stage finished"),
        Ok((stage, Err(e))) if e.is_graceful() => {
            tracing::debug!(%stage, "stage cancelled");
        }
        Ok((stage, Err(e))) => {
            tracing::error!(%stage, error = %e, label = e.as_label(), "stage failed");
            let mut ev = Event::new(EventKind::StageFailed).with_reason(e.as_message());
            if let Stage::Counter(i) = stage {
                ev = ev.with_counter(i);
            }
            bus.publish(ev);
        }
        Err(e) if e.is_cancelled() => {}
        Err(e) => {
            tracing::error!(error = %e, "stage panicked");
            bus.publish(
                Event::new(EventKind::StageFailed).with_reason(format!("panicked: {e}")),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn quick(counters: usize) -> Config {
        Config {
            counters,
            run_for: Duration::from_millis(2_500),
            token_period: Duration::from_secs(1),
            service_time: Duration::from_secs(3),
            grace: Duration::from_secs(5),
            handle_signals: false,
        }
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Source.to_string(), "source");
        assert_eq!(Stage::Counter(0).to_string(), "counter-1");
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_spawning() {
        let ctl = Controller::builder(Config {
            counters: 0,
            ..quick(1)
        })
        .build();
        let state = ctl.state();
        let err = ctl.run().await.unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidConfig { .. }));
        assert_eq!(*state.borrow(), RunState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_reaches_stopped() {
        let ctl = Controller::builder(quick(2)).build();
        let state = ctl.state();
        assert_eq!(*state.borrow(), RunState::Idle);

        let report = ctl.run().await.unwrap();
        assert_eq!(*state.borrow(), RunState::Stopped);
        assert_eq!(report.reason, ShutdownReason::Elapsed);
        // tokens at 0s, 1s, 2s; both counters still serving at 2.5s drain within grace
        assert_eq!(report.generated, 3);
        assert!(!report.forced);
        assert!(report.interrupted.is_empty());
    }
}
