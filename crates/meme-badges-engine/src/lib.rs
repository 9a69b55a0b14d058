/*!
# Meme Badges Engine

Decides who earns which badge and gets the badge minted exactly once.

- [`EligibilityRuleSet`]: per-kind rules over chain reads, metrics and thresholds
- [`BadgeStore`]: shared ledger and mint queue
- [`MintSubmitter`]: the only component that sends mint transactions
- [`AutomationLoop`]: event handling plus periodic sweeps that repeat
  deferred evaluations and drain the queue

Chain access goes through the gateway traits of `meme-badges-chain`, so
tests can drive the whole engine against an in-memory chain.
*/

mod automation;
mod config;
mod error;
pub mod metrics;
pub mod rules;
mod store;
mod submitter;
pub mod thresholds;

pub use automation::{engine_channel, AutomationLoop, EngineHandle, EngineInput};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use metrics::{MetricQuery, MetricsError, MetricsSource, UnwiredMetrics};
pub use rules::{Eligibility, EligibilityRuleSet, RuleContext, Trigger};
pub use store::{BadgeStore, EnqueueOutcome};
pub use submitter::{MintSubmitter, SubmissionOutcome};
pub use thresholds::{ChainThresholds, StaticThresholds, ThresholdSource};
