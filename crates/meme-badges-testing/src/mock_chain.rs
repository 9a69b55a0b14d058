use async_trait::async_trait;
use meme_badges_chain::{
    BadgeMinter, ChainError, ChainResult, ContractReader, EventSource, MintCall, MintReceipt,
    TokenInfo,
};
use meme_badges_types::{
    ether, Address, BadgeKind, ChainEvent, LargeTransfer, TokenCreated, TxHash, U256,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// What the mock does when asked to confirm a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Include the mint and emit a token id
    Confirm,
    /// Include the transaction with a failed status
    Revert,
    /// Never produce a receipt within the wait
    Timeout,
    /// Include the mint, but only after the wait gave up
    LateConfirm,
}

#[derive(Default)]
struct MockChainState {
    head: u64,
    events: Vec<ChainEvent>,
    tokens: HashMap<Address, TokenInfo>,
    created: HashMap<Address, Vec<Address>>,
    requirements: HashMap<BadgeKind, U256>,
    on_chain_badges: HashSet<(Address, BadgeKind)>,

    mint_calls: Vec<MintCall>,
    broadcast: HashMap<TxHash, MintCall>,
    landed: HashMap<TxHash, MintReceipt>,
    confirmations_requested: u32,
    next_tx: u64,
    next_token_id: u64,

    submit_failures: u32,
    scripted_confirmations: VecDeque<Confirmation>,
    head_failures: u32,
    badge_check_failures: u32,
}

/// In-memory stand-in for the factory, the badge contract and the log
/// stream. Cheap to share behind an `Arc`.
pub struct MockChain {
    state: Mutex<MockChainState>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    /// A chain at block 1 whose badge contract carries the reference
    /// requirements
    pub fn new() -> Self {
        let mut state = MockChainState {
            head: 1,
            next_token_id: 1,
            ..Default::default()
        };
        for kind in BadgeKind::ALL {
            state.requirements.insert(kind, reference_requirement(kind));
        }

        Self {
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockChainState> {
        self.state.lock().expect("mock chain state poisoned")
    }

    // ------------------------------------------------------------------
    // Scenario setup
    // ------------------------------------------------------------------

    /// Deploy `token` for `creator` in a new block and emit `TokenCreated`
    pub fn launch_token(
        &self,
        creator: Address,
        token: Address,
        initial_liquidity: U256,
    ) -> ChainEvent {
        let mut state = self.state();
        state.head += 1;
        let block_number = state.head;

        let info = TokenInfo {
            token,
            creator,
            name: format!("Meme {}", block_number),
            symbol: format!("MEME{}", block_number),
            total_supply: ether(1_000_000_000),
            initial_liquidity,
            lock_period: U256::from(30u64 * 24 * 60 * 60),
            created_at: U256::from(1_700_000_000u64 + block_number * 12),
        };
        state.tokens.insert(token, info.clone());
        state.created.entry(creator).or_default().push(token);

        let event = ChainEvent::TokenCreated(TokenCreated {
            creator,
            token,
            name: info.name,
            symbol: info.symbol,
            total_supply: info.total_supply,
            initial_liquidity,
            lock_period: info.lock_period,
            block_number,
            log_index: 0,
        });
        state.events.push(event.clone());
        event
    }

    /// Emit a `Transfer` of `token` in a new block
    pub fn transfer(&self, token: Address, from: Address, to: Address, value: U256) -> ChainEvent {
        let mut state = self.state();
        state.head += 1;

        let event = ChainEvent::LargeTransfer(LargeTransfer {
            token,
            from,
            to,
            value,
            block_number: state.head,
            log_index: 0,
        });
        state.events.push(event.clone());
        event
    }

    /// Pretend the badge was minted outside the engine
    pub fn grant_badge_on_chain(&self, subject: Address, kind: BadgeKind) {
        self.state().on_chain_badges.insert((subject, kind));
    }

    pub fn set_requirement(&self, kind: BadgeKind, value: U256) {
        self.state().requirements.insert(kind, value);
    }

    /// Make the next `count` broadcasts fail
    pub fn fail_next_submissions(&self, count: u32) {
        self.state().submit_failures = count;
    }

    /// Queue up confirmation outcomes; once drained every wait confirms
    pub fn script_confirmations(&self, outcomes: impl IntoIterator<Item = Confirmation>) {
        self.state().scripted_confirmations.extend(outcomes);
    }

    /// Make the next `count` head queries fail
    pub fn fail_next_head_queries(&self, count: u32) {
        self.state().head_failures = count;
    }

    /// Make the next `count` badge ownership reads fail
    pub fn fail_next_badge_checks(&self, count: u32) {
        self.state().badge_check_failures = count;
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Every `mintBadge` call that was broadcast, in order
    pub fn mint_calls(&self) -> Vec<MintCall> {
        self.state().mint_calls.clone()
    }

    pub fn mints_of(&self, subject: Address, kind: BadgeKind) -> usize {
        self.state()
            .mint_calls
            .iter()
            .filter(|call| call.recipient == subject && call.badge_kind == kind)
            .count()
    }

    pub fn confirmations_requested(&self) -> u32 {
        self.state().confirmations_requested
    }

    pub fn holds_on_chain(&self, subject: Address, kind: BadgeKind) -> bool {
        self.state().on_chain_badges.contains(&(subject, kind))
    }

    pub fn head(&self) -> u64 {
        self.state().head
    }
}

fn reference_requirement(kind: BadgeKind) -> U256 {
    match kind {
        BadgeKind::TokenCreator => U256::from(1u64),
        BadgeKind::LaunchMaster => ether(1),
        BadgeKind::VolumeKing => ether(100_000),
        BadgeKind::CommunityBuilder => U256::from(1_000u64),
        BadgeKind::DiamondHands => U256::from(180u64 * 24 * 60 * 60),
        BadgeKind::ViralSensation => U256::from(10_000u64),
        BadgeKind::WhaleCaller => ether(10),
        BadgeKind::PerfectShot => U256::from(100u64),
    }
}

#[async_trait]
impl ContractReader for MockChain {
    async fn created_tokens(&self, creator: Address) -> ChainResult<Vec<Address>> {
        Ok(self.state().created.get(&creator).cloned().unwrap_or_default())
    }

    async fn token_info(&self, token: Address) -> ChainResult<TokenInfo> {
        self.state()
            .tokens
            .get(&token)
            .cloned()
            .ok_or_else(|| ChainError::Decode {
                what: "getTokenInfo",
                reason: format!("token {} is not registered", token),
            })
    }

    async fn has_badge(&self, subject: Address, kind: BadgeKind) -> ChainResult<bool> {
        let mut state = self.state();
        if state.badge_check_failures > 0 {
            state.badge_check_failures -= 1;
            return Err(ChainError::Unavailable("connection reset by peer".to_string()));
        }
        Ok(state.on_chain_badges.contains(&(subject, kind)))
    }

    async fn badge_requirement(&self, kind: BadgeKind) -> ChainResult<U256> {
        Ok(self
            .state()
            .requirements
            .get(&kind)
            .copied()
            .unwrap_or(U256::ZERO))
    }
}

#[async_trait]
impl BadgeMinter for MockChain {
    async fn submit_mint(&self, call: &MintCall) -> ChainResult<TxHash> {
        let mut state = self.state();

        if state.submit_failures > 0 {
            state.submit_failures -= 1;
            return Err(ChainError::Unavailable("nonce too low".to_string()));
        }

        state.next_tx += 1;
        let tx_hash = TxHash::left_padding_from(&state.next_tx.to_be_bytes());
        state.mint_calls.push(call.clone());
        state.broadcast.insert(tx_hash, call.clone());
        Ok(tx_hash)
    }

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
    ) -> ChainResult<MintReceipt> {
        let mut state = self.state();
        state.confirmations_requested += 1;

        let outcome = state
            .scripted_confirmations
            .pop_front()
            .unwrap_or(Confirmation::Confirm);

        match outcome {
            Confirmation::Timeout => Err(ChainError::ConfirmationTimeout {
                tx_hash,
                waited: timeout,
            }),
            Confirmation::Revert => {
                state.broadcast.remove(&tx_hash);
                Err(ChainError::Reverted { tx_hash })
            }
            Confirmation::Confirm => {
                let Some(call) = state.broadcast.remove(&tx_hash) else {
                    return Err(ChainError::ConfirmationTimeout {
                        tx_hash,
                        waited: timeout,
                    });
                };
                state.include(tx_hash, &call)
            }
            Confirmation::LateConfirm => {
                if let Some(call) = state.broadcast.remove(&tx_hash) {
                    // Lands, but the waiter has already given up
                    let _ = state.include(tx_hash, &call);
                }
                Err(ChainError::ConfirmationTimeout {
                    tx_hash,
                    waited: timeout,
                })
            }
        }
    }

    async fn find_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<MintReceipt>> {
        Ok(self.state().landed.get(&tx_hash).cloned())
    }
}

impl MockChainState {
    /// Mine `call` in a new block
    fn include(&mut self, tx_hash: TxHash, call: &MintCall) -> ChainResult<MintReceipt> {
        // The badge contract refuses a second badge of the same kind
        if !self.on_chain_badges.insert((call.recipient, call.badge_kind)) {
            return Err(ChainError::Reverted { tx_hash });
        }

        self.head += 1;
        let token_id = U256::from(self.next_token_id);
        self.next_token_id += 1;

        let receipt = MintReceipt {
            tx_hash,
            block_number: Some(self.head),
            token_id: Some(token_id),
        };
        self.landed.insert(tx_hash, receipt.clone());
        Ok(receipt)
    }
}

#[async_trait]
impl EventSource for MockChain {
    async fn latest_block(&self) -> ChainResult<u64> {
        let mut state = self.state();
        if state.head_failures > 0 {
            state.head_failures -= 1;
            return Err(ChainError::Unavailable("connection reset by peer".to_string()));
        }
        Ok(state.head)
    }

    async fn fetch_events(&self, from: u64, to: u64) -> ChainResult<Vec<ChainEvent>> {
        Ok(self
            .state()
            .events
            .iter()
            .filter(|event| (from..=to).contains(&event.block_number()))
            .cloned()
            .collect())
    }
}
