//! # LogWriter: the human-readable event log
//!
//! Prints token flow events to stdout, one line per event, with counters
//! numbered from 1. Run-level events are left to `tracing` diagnostics.
//!
//! ## Example output
//! ```text
//! New Token 1 generated
//! Token 1 allocated to Counter 1
//! Counter 1 starts serving Token 1
//! Food delivered for Token 1 at Counter 1
//! Counter 1 is now free
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event log subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Formats the log line for `e`, or `None` when the event is not part of the log.
    pub fn render(e: &Event) -> Option<String> {
        let token = e.token;
        let counter = e.counter_number();
        let line = match (e.kind, token, counter) {
            (EventKind::TokenGenerated, Some(t), _) => format!("New Token {t} generated"),
            (EventKind::TokenAssigned, Some(t), Some(k)) => {
                format!("Token {t} allocated to Counter {k}")
            }
            (EventKind::ServiceStarted, Some(t), Some(k)) => {
                format!("Counter {k} starts serving Token {t}")
            }
            (EventKind::ServiceCompleted, Some(t), Some(k)) => {
                format!("Food delivered for Token {t} at Counter {k}")
            }
            (EventKind::CounterFree, _, Some(k)) => format!("Counter {k} is now free"),
            _ => return None,
        };
        Some(line)
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        if let Some(line) = Self::render(e) {
            println!("{line}");
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }

    fn queue_capacity(&self) -> usize {
        4096
    }
}
