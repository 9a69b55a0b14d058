use crate::error::within;
use crate::metrics::MetricsSource;
use crate::rules::{EligibilityRuleSet, RuleContext, Trigger};
use crate::submitter::{MintSubmitter, SubmissionOutcome};
use crate::thresholds::ThresholdSource;
use crate::{BadgeStore, EngineConfig, EngineResult, EnqueueOutcome};
use meme_badges_chain::{BadgeMinter, ContractReader};
use meme_badges_types::{
    Address, BadgeKind, ChainEvent, DeferredEvaluation, MintRequest, NewDeferredEvaluation,
    NewMintRequest,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Deferred evaluations re-driven per sweep
const MAX_DEFERRED_PER_SWEEP: usize = 64;

/// Work accepted by the automation loop besides chain events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineInput {
    CheckBadges {
        subject: Address,
        token: Option<Address>,
    },
}

/// Cloneable sender side of the loop's manual-check channel
#[derive(Debug, Clone)]
pub struct EngineHandle {
    inputs: mpsc::Sender<EngineInput>,
}

impl EngineHandle {
    /// Ask the loop to re-evaluate `subject`. Never blocks; when the
    /// channel is full the hint is dropped.
    pub fn check_badges(&self, subject: Address, token: Option<Address>) {
        match self.inputs.try_send(EngineInput::CheckBadges { subject, token }) {
            Ok(()) => debug!(subject = %subject, "Queued badge check"),
            Err(TrySendError::Full(_)) => {
                warn!(subject = %subject, "Engine busy, dropping badge check")
            }
            Err(TrySendError::Closed(_)) => {
                warn!(subject = %subject, "Engine stopped, dropping badge check")
            }
        }
    }
}

/// Manual-check channel sized like the event channel
pub fn engine_channel(capacity: usize) -> (EngineHandle, mpsc::Receiver<EngineInput>) {
    let (inputs, receiver) = mpsc::channel(capacity.max(1));
    (EngineHandle { inputs }, receiver)
}

/// Evaluates eligibility for incoming events and drains the mint queue on
/// a fixed interval.
pub struct AutomationLoop {
    rules: EligibilityRuleSet,
    reader: Arc<dyn ContractReader>,
    store: BadgeStore,
    submitter: MintSubmitter,
    config: EngineConfig,
}

impl AutomationLoop {
    pub fn new(
        reader: Arc<dyn ContractReader>,
        minter: Arc<dyn BadgeMinter>,
        metrics: Arc<dyn MetricsSource>,
        thresholds: Arc<dyn ThresholdSource>,
        store: BadgeStore,
        config: EngineConfig,
    ) -> Self {
        let rules = EligibilityRuleSet::new(
            Arc::clone(&reader),
            metrics,
            thresholds,
            config.read_timeout,
        );
        let submitter = MintSubmitter::new(
            minter,
            Arc::clone(&reader),
            store.clone(),
            config.clone(),
        );

        Self {
            rules,
            reader,
            store,
            submitter,
            config,
        }
    }

    pub fn store(&self) -> &BadgeStore {
        &self.store
    }

    pub fn submitter(&self) -> &MintSubmitter {
        &self.submitter
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate the kinds an event can unlock and enqueue the eligible ones.
    /// The event's block becomes the resume cursor afterwards.
    pub async fn handle_event(&self, event: &ChainEvent) -> EngineResult<Vec<MintRequest>> {
        let ctx = RuleContext::for_event(event);
        let enqueued = self
            .evaluate_subject(&ctx, Trigger::for_event(event).kinds())
            .await;

        self.store.advance_cursor(event.block_number()).await?;
        Ok(enqueued)
    }

    /// Manual refresh for one subject
    pub async fn check_badges(&self, subject: Address, token: Option<Address>) -> Vec<MintRequest> {
        let ctx = RuleContext::manual(subject, token);
        self.evaluate_subject(&ctx, Trigger::Manual.kinds()).await
    }

    pub async fn handle_input(&self, input: EngineInput) -> Vec<MintRequest> {
        match input {
            EngineInput::CheckBadges { subject, token } => self.check_badges(subject, token).await,
        }
    }

    /// Each kind is isolated: a failing rule never blocks the others.
    /// Transient failures are deferred and repeated by later sweeps.
    async fn evaluate_subject(&self, ctx: &RuleContext, kinds: &[BadgeKind]) -> Vec<MintRequest> {
        let mut enqueued = Vec::new();

        for &kind in kinds {
            match self.evaluate_kind(ctx, kind).await {
                Ok(Some(request)) => enqueued.push(request),
                Ok(None) => {}
                Err(e) if e.is_unimplemented_rule() || e.is_invariant_violation() => {
                    debug!(subject = %ctx.subject, kind = %kind, "Skipping rule: {}", e);
                }
                Err(e) if e.is_transient() => self.defer(ctx, kind, &e.to_string()).await,
                Err(e) => {
                    warn!(subject = %ctx.subject, kind = %kind, "Eligibility check failed: {}", e);
                }
            }
        }

        enqueued
    }

    async fn defer(&self, ctx: &RuleContext, kind: BadgeKind, reason: &str) {
        let evaluation = NewDeferredEvaluation {
            subject: ctx.subject,
            badge_kind: kind,
            related_token: ctx.token,
            transfer_value: ctx.transfer_value,
            error: reason.to_string(),
        };

        match self
            .store
            .defer_evaluation(evaluation, self.config.retry_at(0))
            .await
        {
            Ok(deferred) => warn!(
                subject = %ctx.subject,
                kind = %kind,
                attempts = deferred.attempts,
                "Deferring evaluation: {}",
                reason
            ),
            Err(e) => error!(
                subject = %ctx.subject,
                kind = %kind,
                "Failed to defer evaluation ({}): {}",
                reason,
                e
            ),
        }
    }

    /// Repeat due deferred evaluations. Each one is resolved once it
    /// reaches a verdict, fails for a non-transient reason or runs out of
    /// attempts; otherwise it is pushed out with a doubling delay.
    pub async fn retry_deferred(&self) -> EngineResult<Vec<MintRequest>> {
        let due = self.store.due_evaluations(MAX_DEFERRED_PER_SWEEP).await?;
        let mut enqueued = Vec::new();

        for deferred in due {
            let ctx = deferred_context(&deferred);

            match self.evaluate_kind(&ctx, deferred.badge_kind).await {
                Ok(request) => {
                    debug!(
                        subject = %deferred.subject,
                        kind = %deferred.badge_kind,
                        attempts = deferred.attempts,
                        "Deferred evaluation completed"
                    );
                    enqueued.extend(request);
                }
                Err(e)
                    if e.is_transient()
                        && deferred.attempts + 1 < self.config.max_evaluation_attempts =>
                {
                    let rescheduled = self
                        .store
                        .reschedule_evaluation(
                            deferred.id,
                            &e.to_string(),
                            self.config.retry_at(deferred.attempts),
                        )
                        .await?;
                    warn!(
                        subject = %deferred.subject,
                        kind = %deferred.badge_kind,
                        attempts = rescheduled.attempts,
                        "Deferred evaluation failed again: {}",
                        e
                    );
                    continue;
                }
                Err(e) if e.is_transient() => {
                    error!(
                        subject = %deferred.subject,
                        kind = %deferred.badge_kind,
                        attempts = deferred.attempts + 1,
                        "Giving up on deferred evaluation: {}",
                        e
                    );
                }
                Err(e) => {
                    warn!(
                        subject = %deferred.subject,
                        kind = %deferred.badge_kind,
                        "Deferred evaluation dropped: {}",
                        e
                    );
                }
            }

            self.store.resolve_evaluation(deferred.id).await?;
        }

        Ok(enqueued)
    }

    async fn evaluate_kind(
        &self,
        ctx: &RuleContext,
        kind: BadgeKind,
    ) -> EngineResult<Option<MintRequest>> {
        if self.store.is_settled(ctx.subject, kind).await? {
            debug!(subject = %ctx.subject, kind = %kind, "Badge already held or queued");
            return Ok(None);
        }

        let eligibility = self.rules.evaluate(ctx, kind).await?;
        if !eligibility.eligible {
            return Ok(None);
        }

        let on_chain = within(
            "has_badge",
            self.config.read_timeout,
            self.reader.has_badge(ctx.subject, kind),
        )
        .await?;
        if on_chain {
            debug!(subject = %ctx.subject, kind = %kind, "Badge contract already reports the badge");
            return Ok(None);
        }

        let request = NewMintRequest {
            recipient: ctx.subject,
            badge_kind: kind,
            related_token: ctx.token,
            achievement_value: eligibility.fact.observed_metric,
        };

        match self.store.try_enqueue(request).await? {
            EnqueueOutcome::Enqueued(request) => {
                info!(
                    request_id = request.id,
                    subject = %request.recipient,
                    kind = %request.badge_kind,
                    achievement_value = %request.achievement_value,
                    "Queued badge mint"
                );
                Ok(Some(request))
            }
            EnqueueOutcome::AlreadyHeld | EnqueueOutcome::AlreadyQueued => {
                debug!(subject = %ctx.subject, kind = %kind, "Lost enqueue race, skipping");
                Ok(None)
            }
        }
    }

    /// Re-drive deferred evaluations, then drain the queue one submission
    /// at a time. A request is attempted at most once per sweep.
    pub async fn sweep(&self) -> EngineResult<Vec<SubmissionOutcome>> {
        match self.retry_deferred().await {
            Ok(enqueued) if !enqueued.is_empty() => {
                info!(count = enqueued.len(), "Deferred evaluations queued mints");
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to retry deferred evaluations: {}", e),
        }

        let mut outcomes = Vec::new();
        let mut attempted = HashSet::new();

        while outcomes.len() < self.config.max_submissions_per_sweep {
            let Some(request) = self.store.dequeue_next().await? else {
                break;
            };
            if !attempted.insert(request.id) {
                break;
            }

            outcomes.push(self.submitter.submit(request).await?);
        }

        Ok(outcomes)
    }

    /// Run until `shutdown` flips to true or its sender goes away.
    ///
    /// Requests stranded in `Submitted` by an earlier run are re-awaited
    /// first. An in-flight sweep is allowed to finish before returning.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<ChainEvent>,
        mut inputs: mpsc::Receiver<EngineInput>,
        mut shutdown: watch::Receiver<bool>,
    ) -> EngineResult<()> {
        let recovered = self.submitter.recover_submitted().await?;
        if !recovered.is_empty() {
            info!(count = recovered.len(), "Resolved submitted requests from a previous run");
        }

        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sweep_task: Option<JoinHandle<()>> = None;

        info!(
            sweep_interval = ?self.config.sweep_interval,
            max_retries = self.config.max_retries,
            "Automation loop started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                Some(event) = events.recv() => {
                    if let Err(e) = self.handle_event(&event).await {
                        warn!(block = event.block_number(), "Failed to handle chain event: {}", e);
                    }
                }
                Some(input) = inputs.recv() => {
                    self.handle_input(input).await;
                }
                _ = ticker.tick() => {
                    if sweep_task.as_ref().is_some_and(|task| !task.is_finished()) {
                        debug!("Previous sweep still running, skipping tick");
                        continue;
                    }

                    let engine = Arc::clone(&self);
                    sweep_task = Some(tokio::spawn(async move {
                        match engine.sweep().await {
                            Ok(outcomes) if !outcomes.is_empty() => {
                                info!(submissions = outcomes.len(), "Queue sweep finished");
                            }
                            Ok(_) => {}
                            Err(e) => warn!("Queue sweep failed: {}", e),
                        }
                    }));
                }
            }
        }

        if let Some(task) = sweep_task {
            if let Err(e) = task.await {
                warn!("Sweep task ended abnormally: {}", e);
            }
        }

        info!("Automation loop stopped");
        Ok(())
    }
}

fn deferred_context(deferred: &DeferredEvaluation) -> RuleContext {
    RuleContext {
        subject: deferred.subject,
        token: deferred.related_token,
        transfer_value: deferred.transfer_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_drops_hints_when_full() {
        let (handle, mut receiver) = engine_channel(1);
        let subject = Address::repeat_byte(0xaa);

        handle.check_badges(subject, None);
        handle.check_badges(Address::repeat_byte(0xbb), None);

        assert_eq!(
            receiver.recv().await,
            Some(EngineInput::CheckBadges {
                subject,
                token: None
            })
        );
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_handle_survives_stopped_engine() {
        let (handle, receiver) = engine_channel(4);
        drop(receiver);
        handle.check_badges(Address::repeat_byte(0xaa), None);
    }
}
