use crate::{ChainError, ChainResult, EventSource, ReaderConfig};
use backoff::future::retry_notify;
use meme_badges_types::ChainEvent;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Polls an [`EventSource`] block range by block range and forwards every
/// decoded event over a bounded channel.
///
/// Delivery is at-least-once: a restart resumes from the configured start
/// block, which may replay events the consumer has already seen.
///
/// Transient RPC failures are retried with backoff on the same range. A range
/// the provider rejects outright is halved until it is accepted, and the span
/// doubles back towards `max_block_range` after every successful fetch.
pub struct EventReader {
    source: Arc<dyn EventSource>,
    config: ReaderConfig,
}

impl EventReader {
    pub fn new(source: Arc<dyn EventSource>, config: ReaderConfig) -> Self {
        Self { source, config }
    }

    /// Run until `shutdown` flips to true, its sender goes away, or the
    /// receiving side of `events` is dropped
    pub async fn run(
        self,
        events: mpsc::Sender<ChainEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> ChainResult<()> {
        let max_span = self.config.max_block_range.max(1);
        let mut span = max_span;

        let mut next_block = match self.config.start_block {
            Some(block) => block,
            None => tokio::select! {
                head = self.with_retry("latest_block", true, || self.source.latest_block()) => head?,
                _ = shutdown.changed() => return Ok(()),
            },
        };

        info!(start_block = next_block, "Event reader started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let head = tokio::select! {
                head = self.with_retry("latest_block", true, || self.source.latest_block()) => head?,
                _ = shutdown.changed() => break,
            };

            if head < next_block {
                if self.idle(&mut shutdown).await {
                    break;
                }
                continue;
            }

            let to = head.min(next_block.saturating_add(span - 1));
            // A single block has nowhere left to shrink, so every error is retried
            let retry_all = to == next_block;
            let fetched = tokio::select! {
                fetched = self.with_retry(
                    "fetch_events",
                    retry_all,
                    || self.source.fetch_events(next_block, to),
                ) => fetched,
                _ = shutdown.changed() => break,
            };

            let batch = match fetched {
                Ok(batch) => batch,
                Err(e) => {
                    span = narrowed(next_block, to);
                    warn!(
                        from = next_block,
                        to,
                        next_span = span,
                        "Block range rejected, narrowing: {}",
                        e
                    );
                    continue;
                }
            };

            debug!(from = next_block, to, events = batch.len(), "Fetched block range");

            for event in batch {
                if events.send(event).await.is_err() {
                    info!("Event consumer went away, stopping reader");
                    return Ok(());
                }
            }

            next_block = to + 1;
            span = span.saturating_mul(2).min(max_span);

            // Keep going without sleeping while behind the head
            if to >= head && self.idle(&mut shutdown).await {
                break;
            }
        }

        info!(next_block, "Event reader stopped");
        Ok(())
    }

    /// Sleep one poll interval; true if shutdown was requested meanwhile
    async fn idle(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.config.poll_interval) => false,
            _ = shutdown.changed() => true,
        }
    }

    /// Retry transient failures with backoff. Other failures are returned
    /// unless `retry_all` is set.
    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        retry_all: bool,
        mut attempt: F,
    ) -> ChainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ChainResult<T>>,
    {
        retry_notify(
            self.config.retry_backoff.clone(),
            || {
                let call = attempt();
                async move {
                    call.await.map_err(|e| {
                        if retry_all || e.is_transient() {
                            backoff::Error::transient(e)
                        } else {
                            backoff::Error::permanent(e)
                        }
                    })
                }
            },
            |err: ChainError, retry_in: Duration| {
                warn!(operation, retry_in = ?retry_in, "Chain read failed, retrying: {}", err);
            },
        )
        .await
    }
}

/// Half of the rejected `from..=to` range, at least one block
fn narrowed(from: u64, to: u64) -> u64 {
    ((to - from + 1) / 2).max(1)
}
