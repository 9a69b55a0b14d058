use alloy::primitives::{Address, U256};

/// `TokenCreated` emitted by the token factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCreated {
    pub creator: Address,
    pub token: Address,
    pub name: String,
    pub symbol: String,
    pub total_supply: U256,
    pub initial_liquidity: U256,
    pub lock_period: U256,
    pub block_number: u64,
    pub log_index: u64,
}

/// ERC-20 `Transfer` whose value passed the reader's size filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LargeTransfer {
    /// Contract that emitted the log
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub block_number: u64,
    pub log_index: u64,
}

/// Chain logs forwarded by the event reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    TokenCreated(TokenCreated),
    LargeTransfer(LargeTransfer),
}

impl ChainEvent {
    pub const fn block_number(&self) -> u64 {
        match self {
            ChainEvent::TokenCreated(event) => event.block_number,
            ChainEvent::LargeTransfer(event) => event.block_number,
        }
    }

    /// The address whose eligibility the event may change
    pub const fn subject(&self) -> Address {
        match self {
            ChainEvent::TokenCreated(event) => event.creator,
            ChainEvent::LargeTransfer(event) => event.to,
        }
    }

    pub const fn token(&self) -> Address {
        match self {
            ChainEvent::TokenCreated(event) => event.token,
            ChainEvent::LargeTransfer(event) => event.token,
        }
    }
}
