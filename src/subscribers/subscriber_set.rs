//! # Ordered, lossless delivery of run events to subscribers.
//!
//! [`SubscriberSet`] gives every subscriber a bounded queue and a worker task.
//! The controller's listener hands each event to [`SubscriberSet::deliver`],
//! which waits for room in every queue instead of dropping. A slow subscriber
//! therefore slows the listener; publishers are unaffected because the bus in
//! front of the listener is unbounded.
//!
//! ```text
//! listener ── deliver(ev).await ──┬──► [queue] ──► worker ──► LogWriter::on_event
//!                                 └──► [queue] ──► worker ──► custom.on_event
//!                                                    └─ panic → SubscriberPanicked
//! ```
//!
//! Each subscriber sees every event of the run, in listener order, before
//! [`SubscriberSet::shutdown`] returns.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct Sink {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
    worker: JoinHandle<()>,
}

/// Subscribers of one run, each fed by its own worker task.
pub struct SubscriberSet {
    sinks: Vec<Sink>,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Panics inside `on_event` are reported on `bus`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let sinks = subs
            .into_iter()
            .map(|sub| {
                let (queue, rx) = mpsc::channel(sub.queue_capacity().max(1));
                Sink {
                    name: sub.name(),
                    queue,
                    worker: tokio::spawn(drain(sub, rx, bus.clone())),
                }
            })
            .collect();
        Self { sinks }
    }

    /// Queues `event` for every subscriber, waiting while a queue is full.
    pub async fn deliver(&self, event: Event) {
        let event = Arc::new(event);
        for sink in &self.sinks {
            if sink.queue.send(Arc::clone(&event)).await.is_err() {
                tracing::error!(subscriber = sink.name, seq = event.seq, "subscriber worker gone; event lost");
            }
        }
    }

    /// Closes every queue and waits until the workers processed what is left.
    pub async fn shutdown(self) {
        for Sink { name, queue, worker } in self.sinks {
            drop(queue);
            if let Err(e) = worker.await {
                tracing::error!(subscriber = name, error = %e, "subscriber worker failed");
            }
        }
    }
}

async fn drain(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let handled = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
        if let Err(payload) = handled {
            let info = panic_message(payload.as_ref());
            tracing::warn!(subscriber = sub.name(), seq = ev.seq, %info, "subscriber panicked");
            bus.publish(Event::subscriber_panicked(sub.name(), info));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&'static str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
