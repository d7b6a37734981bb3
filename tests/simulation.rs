//! End-to-end runs of the controller under paused tokio time.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use counterline::{
    Config, Controller, Event, EventKind, LogWriter, RunReport, ShutdownReason, Subscribe, Token,
};

/// Keeps every event it receives, in delivery order.
struct Recorder {
    events: Mutex<Vec<Event>>,
    capacity: usize,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::with_capacity(8192)
    }
}

impl Recorder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Lines the stdout log would print for what was recorded.
    fn log_lines(&self, prefix: &str) -> usize {
        self.events()
            .iter()
            .filter_map(LogWriter::render)
            .filter(|l| l.starts_with(prefix))
            .count()
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn tokens(&self, kind: EventKind) -> Vec<Token> {
        self.events()
            .iter()
            .filter(|e| e.kind == kind)
            .filter_map(|e| e.token)
            .collect()
    }

    fn count(&self, kind: EventKind) -> usize {
        self.events().iter().filter(|e| e.kind == kind).count()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        tokio::task::yield_now().await;
        self.events.lock().unwrap().push(ev.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }

    fn queue_capacity(&self) -> usize {
        self.capacity
    }
}

fn config(counters: usize, run_ms: u64, grace_ms: u64) -> Config {
    Config {
        counters,
        run_for: Duration::from_millis(run_ms),
        token_period: Duration::from_millis(1_000),
        service_time: Duration::from_millis(3_000),
        grace: Duration::from_millis(grace_ms),
        handle_signals: false,
    }
}

async fn run(cfg: Config) -> (RunReport, Arc<Recorder>) {
    let rec = Arc::new(Recorder::default());
    let report = Controller::builder(cfg)
        .with_subscriber(rec.clone())
        .with_subscriber(Arc::new(LogWriter::new()))
        .build()
        .run()
        .await
        .expect("run");
    (report, rec)
}

/// Conservation checks every run must satisfy.
fn assert_conserved(report: &RunReport, rec: &Recorder) {
    let generated = rec.tokens(EventKind::TokenGenerated);
    let assigned = rec.tokens(EventKind::TokenAssigned);

    // ids 1..=n without gaps
    let expected: Vec<Token> = (1..=generated.len() as u64).map(Token::new).collect();
    assert_eq!(generated, expected);
    assert_eq!(report.generated, generated.len() as u64);

    // no token assigned twice
    let unique: HashSet<Token> = assigned.iter().copied().collect();
    assert_eq!(unique.len(), assigned.len());
    assert_eq!(report.assigned, assigned.len() as u64);

    // generated = assigned ∪ pending, disjoint
    let mut all: Vec<Token> = assigned.iter().chain(report.pending.iter()).copied().collect();
    all.sort();
    assert_eq!(all, generated);

    // every delivery was assigned, and what was not delivered was interrupted
    let delivered = rec.tokens(EventKind::ServiceCompleted);
    assert_eq!(report.delivered, delivered.len() as u64);
    assert!(delivered.iter().all(|t| unique.contains(t)));
    assert_eq!(
        report.delivered + report.interrupted.len() as u64,
        report.assigned
    );
}

/// Per counter, events cycle Assigned → Started → Completed → Free for the same token.
fn assert_slot_discipline(rec: &Recorder) {
    let mut per_counter: HashMap<usize, Vec<(EventKind, Token)>> = HashMap::new();
    let mut events = rec.events();
    events.sort_by_key(|e| e.seq);
    for e in events {
        if let (Some(c), Some(t)) = (e.counter, e.token) {
            per_counter.entry(c).or_default().push((e.kind, t));
        }
    }

    let cycle = [
        EventKind::TokenAssigned,
        EventKind::ServiceStarted,
        EventKind::ServiceCompleted,
        EventKind::CounterFree,
    ];
    for (counter, evs) in per_counter {
        for (i, (kind, token)) in evs.iter().enumerate() {
            assert_eq!(*kind, cycle[i % 4], "counter {counter} out of order at {i}");
            let first = evs[i - i % 4].1;
            assert_eq!(*token, first, "counter {counter} switched token mid-service");
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_three_counters_ten_seconds() {
    let (report, rec) = run(config(3, 9_500, 5_000)).await;

    assert_eq!(report.reason, ShutdownReason::Elapsed);
    assert!((3..=10).contains(&report.generated));
    assert!(report.delivered >= 3);
    assert!(!report.forced);
    assert!(report.interrupted.is_empty());

    // first three tokens go one per counter
    let mut first_three = HashSet::new();
    for e in rec.events().iter().filter(|e| e.kind == EventKind::TokenAssigned).take(3) {
        assert!(e.token.unwrap() <= Token::new(3));
        first_three.insert(e.counter.unwrap());
    }
    assert_eq!(first_three.len(), 3);

    assert_conserved(&report, &rec);
    assert_slot_discipline(&rec);
}

#[tokio::test(start_paused = true)]
async fn test_single_counter_serves_in_generation_order() {
    let (report, rec) = run(config(1, 10_500, 5_000)).await;

    let generated = rec.tokens(EventKind::TokenGenerated);
    let assigned = rec.tokens(EventKind::TokenAssigned);
    // tokens queue up since period < service time
    assert!(assigned.len() < generated.len());
    assert_eq!(assigned[..], generated[..assigned.len()]);
    assert!(!report.pending.is_empty());

    assert_conserved(&report, &rec);
    assert_slot_discipline(&rec);
}

#[tokio::test(start_paused = true)]
async fn test_hard_stop_interrupts_services() {
    // t=4.5s: three counters busy with tokens 3, 4, 5; tokens 1 and 2 delivered
    let (report, rec) = run(config(3, 4_500, 0)).await;

    assert!(report.forced);
    assert_eq!(report.generated, 5);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.interrupted.len(), 3);

    let cut: HashSet<Token> = report.interrupted.iter().map(|(_, t)| *t).collect();
    let delivered: HashSet<Token> = rec.tokens(EventKind::ServiceCompleted).into_iter().collect();
    assert!(cut.is_disjoint(&delivered));
    assert_eq!(rec.count(EventKind::GraceExceeded), 1);
    assert_eq!(rec.count(EventKind::AllStoppedWithin), 0);

    assert_conserved(&report, &rec);
}

#[tokio::test(start_paused = true)]
async fn test_external_cancel_at_half_second_drains() {
    let rec = Arc::new(Recorder::default());
    let ctl = Controller::builder(config(3, 30_000, 5_000))
        .with_subscriber(rec.clone())
        .build();
    let cancel = ctl.canceller();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(10), ctl.run())
        .await
        .expect("run must stop within the grace period")
        .unwrap();

    assert_eq!(report.reason, ShutdownReason::External);
    assert_eq!(report.generated, 1);
    // idle counters left without an assignment; the busy one finished its token
    assert_eq!(rec.count(EventKind::TokenAssigned), 1);
    assert_eq!(report.delivered, 1);
    assert!(!report.forced);
    assert!(report.pending.is_empty());
    assert_eq!(rec.count(EventKind::AllStoppedWithin), 1);

    let shutdown: Vec<_> = rec
        .events()
        .into_iter()
        .filter(|e| e.kind == EventKind::ShutdownRequested)
        .collect();
    assert_eq!(shutdown.len(), 1);
    assert_eq!(shutdown[0].shutdown, Some(ShutdownReason::External));
}

#[tokio::test(start_paused = true)]
async fn test_external_cancel_with_hard_stop() {
    let rec = Arc::new(Recorder::default());
    let ctl = Controller::builder(config(3, 30_000, 0))
        .with_subscriber(rec.clone())
        .build();
    let cancel = ctl.canceller();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
    });

    let report = ctl.run().await.unwrap();

    assert!(report.forced);
    assert_eq!(report.delivered, 0);
    assert_eq!(report.interrupted, vec![(report.interrupted[0].0, Token::new(1))]);
    assert_eq!(rec.count(EventKind::ServiceCompleted), 0);
    assert_conserved(&report, &rec);
}

fn crowd(grace_ms: u64) -> Config {
    Config {
        counters: 500,
        run_for: Duration::from_millis(450),
        token_period: Duration::from_millis(1),
        ..config(1, 0, grace_ms)
    }
}

#[tokio::test(start_paused = true)]
async fn test_many_counters_with_tiny_subscriber_queue_lose_nothing() {
    let rec = Arc::new(Recorder::with_capacity(1));
    let report = Controller::builder(crowd(5_000))
        .with_subscriber(rec.clone())
        .build()
        .run()
        .await
        .unwrap();

    assert!(!report.forced);
    assert!(report.interrupted.is_empty());
    assert!(report.assigned > 400);
    assert_eq!(report.delivered, report.assigned);
    assert_eq!(rec.log_lines("Food delivered") as u64, report.delivered);
    assert_eq!(rec.log_lines("Counter ") as u64, 2 * report.delivered);
    assert_conserved(&report, &rec);
    assert_slot_discipline(&rec);
}

#[tokio::test(start_paused = true)]
async fn test_many_counters_hard_stop_reports_every_cut_service() {
    let rec = Arc::new(Recorder::with_capacity(1));
    let report = Controller::builder(crowd(0))
        .with_subscriber(rec.clone())
        .build()
        .run()
        .await
        .unwrap();

    assert!(report.forced);
    assert_eq!(report.delivered, 0);
    assert_eq!(report.interrupted.len() as u64, report.assigned);
    assert_eq!(rec.log_lines("Food delivered"), 0);
    assert_eq!(
        rec.log_lines("Token ") as u64,
        report.assigned,
        "every assignment is logged"
    );
    assert_conserved(&report, &rec);
}

#[tokio::test(start_paused = true)]
async fn test_run_events_bracket_the_flow() {
    let (_report, rec) = run(config(2, 2_500, 5_000)).await;
    let mut events = rec.events();
    events.sort_by_key(|e| e.seq);

    assert_eq!(events.first().map(|e| e.kind), Some(EventKind::RunStarted));
    assert_eq!(events.last().map(|e| e.kind), Some(EventKind::RunFinished));

    let shutdown_at = events
        .iter()
        .position(|e| e.kind == EventKind::ShutdownRequested)
        .unwrap();
    // nothing new is generated or assigned once shutdown is requested
    assert!(events[shutdown_at..].iter().all(|e| !matches!(
        e.kind,
        EventKind::TokenGenerated | EventKind::TokenAssigned
    )));
}

#[tokio::test(start_paused = true)]
async fn test_zero_counters_is_rejected() {
    let err = Controller::builder(config(0, 1_000, 0))
        .build()
        .run()
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "runtime_invalid_config");
}
