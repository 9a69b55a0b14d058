use crate::error::within;
use crate::metrics::{MetricQuery, MetricsSource};
use crate::thresholds::ThresholdSource;
use crate::EngineResult;
use chrono::Utc;
use meme_badges_chain::ContractReader;
use meme_badges_types::{Address, BadgeKind, ChainEvent, EligibilityFact, U256};
use std::sync::Arc;
use std::time::Duration;

/// Inputs a rule is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleContext {
    pub subject: Address,
    pub token: Option<Address>,
    /// Set only for transfer-triggered evaluations
    pub transfer_value: Option<U256>,
}

impl RuleContext {
    pub fn for_event(event: &ChainEvent) -> Self {
        match event {
            ChainEvent::TokenCreated(created) => Self {
                subject: created.creator,
                token: Some(created.token),
                transfer_value: None,
            },
            ChainEvent::LargeTransfer(transfer) => Self {
                subject: transfer.to,
                token: Some(transfer.token),
                transfer_value: Some(transfer.value),
            },
        }
    }

    pub fn manual(subject: Address, token: Option<Address>) -> Self {
        Self {
            subject,
            token,
            transfer_value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    pub eligible: bool,
    pub fact: EligibilityFact,
}

/// What caused an evaluation; decides which kinds are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    TokenCreated,
    LargeTransfer,
    Manual,
}

const ALL_BUT_WHALE: [BadgeKind; 7] = [
    BadgeKind::TokenCreator,
    BadgeKind::LaunchMaster,
    BadgeKind::VolumeKing,
    BadgeKind::CommunityBuilder,
    BadgeKind::DiamondHands,
    BadgeKind::ViralSensation,
    BadgeKind::PerfectShot,
];

impl Trigger {
    pub fn for_event(event: &ChainEvent) -> Self {
        match event {
            ChainEvent::TokenCreated(_) => Trigger::TokenCreated,
            ChainEvent::LargeTransfer(_) => Trigger::LargeTransfer,
        }
    }

    pub fn kinds(self) -> &'static [BadgeKind] {
        match self {
            Trigger::TokenCreated | Trigger::Manual => &ALL_BUT_WHALE,
            Trigger::LargeTransfer => &[BadgeKind::WhaleCaller],
        }
    }
}

/// Decides eligibility per badge kind. Rules only read; they never touch
/// the ledger or the queue.
pub struct EligibilityRuleSet {
    reader: Arc<dyn ContractReader>,
    metrics: Arc<dyn MetricsSource>,
    thresholds: Arc<dyn ThresholdSource>,
    read_timeout: Duration,
}

impl EligibilityRuleSet {
    pub fn new(
        reader: Arc<dyn ContractReader>,
        metrics: Arc<dyn MetricsSource>,
        thresholds: Arc<dyn ThresholdSource>,
        read_timeout: Duration,
    ) -> Self {
        Self {
            reader,
            metrics,
            thresholds,
            read_timeout,
        }
    }

    pub async fn evaluate(&self, ctx: &RuleContext, kind: BadgeKind) -> EngineResult<Eligibility> {
        match kind {
            BadgeKind::TokenCreator => self.token_creator(ctx).await,
            BadgeKind::LaunchMaster => self.launch_master(ctx).await,
            BadgeKind::WhaleCaller => self.whale_caller(ctx).await,
            _ => self.metric_backed(ctx, kind).await,
        }
    }

    async fn token_creator(&self, ctx: &RuleContext) -> EngineResult<Eligibility> {
        let tokens = within(
            "created_tokens",
            self.read_timeout,
            self.reader.created_tokens(ctx.subject),
        )
        .await?;

        let observed = U256::from(tokens.len());
        self.against_threshold(ctx, BadgeKind::TokenCreator, observed).await
    }

    async fn launch_master(&self, ctx: &RuleContext) -> EngineResult<Eligibility> {
        let Some(token) = ctx.token else {
            return Ok(not_eligible(ctx, BadgeKind::LaunchMaster, U256::ZERO));
        };

        let info = within("token_info", self.read_timeout, self.reader.token_info(token)).await?;

        // Launch credit goes to the deployer only
        if info.creator != ctx.subject {
            return Ok(not_eligible(ctx, BadgeKind::LaunchMaster, info.initial_liquidity));
        }

        self.against_threshold(ctx, BadgeKind::LaunchMaster, info.initial_liquidity)
            .await
    }

    async fn whale_caller(&self, ctx: &RuleContext) -> EngineResult<Eligibility> {
        match ctx.transfer_value {
            Some(value) => self.against_threshold(ctx, BadgeKind::WhaleCaller, value).await,
            None => Ok(not_eligible(ctx, BadgeKind::WhaleCaller, U256::ZERO)),
        }
    }

    async fn metric_backed(&self, ctx: &RuleContext, kind: BadgeKind) -> EngineResult<Eligibility> {
        let query = MetricQuery {
            subject: ctx.subject,
            token: ctx.token,
            kind,
        };
        let observed = within("metrics", self.read_timeout, self.metrics.observe(query)).await?;
        self.against_threshold(ctx, kind, observed).await
    }

    async fn against_threshold(
        &self,
        ctx: &RuleContext,
        kind: BadgeKind,
        observed: U256,
    ) -> EngineResult<Eligibility> {
        let threshold = self.thresholds.threshold(kind).await?;
        Ok(Eligibility {
            eligible: observed >= threshold,
            fact: fact(ctx, kind, observed),
        })
    }
}

fn fact(ctx: &RuleContext, kind: BadgeKind, observed_metric: U256) -> EligibilityFact {
    EligibilityFact {
        subject: ctx.subject,
        badge_kind: kind,
        observed_metric,
        as_of: Utc::now(),
    }
}

fn not_eligible(ctx: &RuleContext, kind: BadgeKind, observed: U256) -> Eligibility {
    Eligibility {
        eligible: false,
        fact: fact(ctx, kind, observed),
    }
}
