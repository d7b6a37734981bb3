//! # TokenSource: the single token generator.
//!
//! Emits `1, 2, 3, ...` into the [`Handoff`] on every tick of a fixed period.
//! The first tick fires immediately.
//!
//! ## Event flow
//! ```text
//! loop {
//!   ├─► wait next tick (cancellable)
//!   ├─► publish TokenGenerated{ token }
//!   └─► handoff.put(token)
//! }
//! ```
//!
//! ## Rules
//! - Cancellation is checked before every emission and wins over a due tick.
//! - A token is either fully emitted (event + queued) or not at all; the hand-off
//!   is only closed after every component stopped.
//! - Missed ticks are delayed, never bursted.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    error::StageError,
    events::{Bus, Event, EventKind},
    queue::{Handoff, TokenSequence},
};

/// Fixed-cadence token generator.
pub struct TokenSource {
    handoff: Handoff,
    bus: Bus,
    period: Duration,
}

impl TokenSource {
    /// Creates a source publishing into `handoff` every `period`.
    pub fn new(handoff: Handoff, bus: Bus, period: Duration) -> Self {
        Self {
            handoff,
            bus,
            period,
        }
    }

    /// Generates tokens until `ctx` is cancelled.
    ///
    /// Returns [`StageError::Canceled`] on shutdown, or
    /// [`StageError::HandoffClosed`] if the channel was closed under it.
    pub async fn run(self, ctx: CancellationToken) -> Result<(), StageError> {
        let mut seq = TokenSequence::new();
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    tracing::debug!(minted = seq.minted(), "token source stopped");
                    return Err(StageError::Canceled);
                }
                _ = ticker.tick() => {}
            }

            let token = seq.next_token();
            // announce before queueing so no counter logs the token first
            if self.handoff.is_closed() {
                return Err(StageError::HandoffClosed { token: Some(token) });
            }
            self.bus
                .publish(Event::new(EventKind::TokenGenerated).with_token(token));
            self.handoff.put(token)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Token;

    #[tokio::test(start_paused = true)]
    async fn test_emits_one_token_per_period_from_one() {
        let q = Handoff::new();
        let (bus, _rx) = Bus::channel();
        let ctx = CancellationToken::new();
        let src = TokenSource::new(q.clone(), bus, Duration::from_secs(1));
        let h = tokio::spawn(src.run(ctx.clone()));

        // ticks at 0s, 1s, 2s, 3s
        time::sleep(Duration::from_millis(3_500)).await;
        ctx.cancel();
        assert_eq!(h.await.unwrap(), Err(StageError::Canceled));

        let drained = q.close_and_drain().await;
        let expected: Vec<Token> = (1..=4).map(Token::new).collect();
        assert_eq!(drained, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generated_events_match_queue() {
        let q = Handoff::new();
        let (bus, mut rx) = Bus::channel();
        let ctx = CancellationToken::new();
        let h = tokio::spawn(TokenSource::new(q.clone(), bus, Duration::from_millis(100)).run(ctx.clone()));

        time::sleep(Duration::from_millis(250)).await;
        ctx.cancel();
        let _ = h.await.unwrap();

        let mut published = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            assert_eq!(ev.kind, EventKind::TokenGenerated);
            published.push(ev.token.unwrap());
        }
        assert_eq!(published, q.close_and_drain().await);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_emits_nothing() {
        let q = Handoff::new();
        let ctx = CancellationToken::new();
        ctx.cancel();

        let res = TokenSource::new(q.clone(), Bus::channel().0, Duration::from_secs(1))
            .run(ctx)
            .await;
        assert_eq!(res, Err(StageError::Canceled));
        assert_eq!(q.put_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_handoff_stops_source() {
        let q = Handoff::new();
        let _ = q.close_and_drain().await;
        let (bus, mut rx) = Bus::channel();

        let res = TokenSource::new(q.clone(), bus, Duration::from_millis(10))
            .run(CancellationToken::new())
            .await;
        assert_eq!(
            res,
            Err(StageError::HandoffClosed {
                token: Some(Token::new(1))
            })
        );
        // the refused token is never announced
        assert!(rx.try_recv().is_err());
        assert_eq!(q.put_count(), 0);
    }
}
