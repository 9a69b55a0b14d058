use crate::{creator, launch_liquidity, launched_token, FixtureStage, MockChain};
use meme_badges_db::BadgeDatabase;
use meme_badges_engine::{
    AutomationLoop, BadgeStore, ChainThresholds, EngineConfig, MetricsSource, SubmissionOutcome,
    UnwiredMetrics,
};
use meme_badges_types::{Address, BadgeRecord, ChainEvent, MintRequest, MintStatus};
use std::sync::Arc;
use std::time::Duration;

/// Engine wired to a [`MockChain`] and an in-memory database.
///
/// Thresholds are read from the mock badge contract through
/// `ChainThresholds`, the same path the service uses.
pub struct TestFixture {
    pub chain: Arc<MockChain>,
    pub engine: Arc<AutomationLoop>,

    stage: FixtureStage,
    last_event: Option<ChainEvent>,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        Self::build(Self::fast_config(), Arc::new(UnwiredMetrics), in_memory())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::build(config, Arc::new(UnwiredMetrics), in_memory())
    }

    pub fn with_metrics(metrics: Arc<dyn MetricsSource>) -> Self {
        Self::build(Self::fast_config(), metrics, in_memory())
    }

    /// Fixture over an existing database, e.g. one a previous engine left behind
    pub fn with_database(chain: Arc<MockChain>, db: BadgeDatabase, config: EngineConfig) -> Self {
        Self::build_on(chain, config, Arc::new(UnwiredMetrics), db)
    }

    fn build(config: EngineConfig, metrics: Arc<dyn MetricsSource>, db: BadgeDatabase) -> Self {
        Self::build_on(Arc::new(MockChain::new()), config, metrics, db)
    }

    fn build_on(
        chain: Arc<MockChain>,
        config: EngineConfig,
        metrics: Arc<dyn MetricsSource>,
        db: BadgeDatabase,
    ) -> Self {
        let thresholds = ChainThresholds::new(
            chain.clone(),
            config.threshold_cache_ttl,
            config.read_timeout,
        );

        let engine = AutomationLoop::new(
            chain.clone(),
            chain.clone(),
            metrics,
            Arc::new(thresholds),
            BadgeStore::new(db),
            config,
        );

        Self {
            chain,
            engine: Arc::new(engine),
            stage: FixtureStage::Fresh,
            last_event: None,
        }
    }

    /// Short timeouts and immediate retries
    pub fn fast_config() -> EngineConfig {
        EngineConfig {
            sweep_interval: Duration::from_millis(20),
            max_retries: 3,
            retry_delay: Duration::ZERO,
            submit_timeout: Duration::from_millis(500),
            confirmation_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_millis(500),
            max_submissions_per_sweep: 16,
            event_buffer: 16,
            threshold_cache_ttl: Duration::ZERO,
            max_evaluation_attempts: 5,
        }
    }

    pub fn store(&self) -> &BadgeStore {
        self.engine.store()
    }

    pub fn stage(&self) -> FixtureStage {
        self.stage
    }

    // ------------------------------------------------------------------
    // Driving the engine
    // ------------------------------------------------------------------

    /// Hand one chain event to the engine, as the reader would
    pub async fn deliver(&self, event: &ChainEvent) -> Vec<MintRequest> {
        self.engine
            .handle_event(event)
            .await
            .expect("event handling should not fail")
    }

    pub async fn check_badges(&self, subject: Address, token: Option<Address>) -> Vec<MintRequest> {
        self.engine.check_badges(subject, token).await
    }

    pub async fn sweep(&self) -> Vec<SubmissionOutcome> {
        self.engine.sweep().await.expect("sweep should not fail")
    }

    /// Advance the staged scenario up to `target`. Stages already passed
    /// are left alone.
    pub async fn jump_to(&mut self, target: FixtureStage) {
        for stage in FixtureStage::all() {
            if *stage <= self.stage || *stage > target {
                continue;
            }

            match stage {
                FixtureStage::Fresh => {}
                FixtureStage::TokenLaunched => {
                    let event =
                        self.chain
                            .launch_token(creator(), launched_token(), launch_liquidity());
                    self.last_event = Some(event);
                }
                FixtureStage::MintsQueued => {
                    let event = self
                        .last_event
                        .clone()
                        .expect("launch event should exist before queueing");
                    self.deliver(&event).await;
                }
                FixtureStage::BadgesMinted => {
                    self.sweep().await;
                }
            }

            self.stage = *stage;
        }
    }

    /// The `TokenCreated` event emitted by the staged launch
    pub fn launch_event(&self) -> Option<&ChainEvent> {
        self.last_event.as_ref()
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub async fn badges(&self, subject: Address) -> Vec<BadgeRecord> {
        self.store()
            .read_badges(subject)
            .await
            .expect("ledger read should succeed")
    }

    pub async fn requests(&self) -> Vec<MintRequest> {
        self.store()
            .list_requests(None, usize::MAX)
            .await
            .expect("queue read should succeed")
    }

    pub async fn requests_with(&self, status: MintStatus) -> Vec<MintRequest> {
        self.store()
            .list_requests(Some(status), usize::MAX)
            .await
            .expect("queue read should succeed")
    }

    /// Evaluations waiting for a later sweep
    pub async fn deferred_count(&self) -> u64 {
        self.store()
            .count_deferred()
            .await
            .expect("deferred read should succeed")
    }
}

fn in_memory() -> BadgeDatabase {
    BadgeDatabase::create_in_memory().expect("in-memory database should open")
}
