mod fixture_stage;
mod mock_chain;
mod test_fixture;

pub use fixture_stage::FixtureStage;
pub use mock_chain::{Confirmation, MockChain};
pub use test_fixture::TestFixture;

use meme_badges_types::Address;

pub use meme_badges_types::{ether, BadgeKind, ChainEvent, MintStatus, U256};

/// Deterministic address filled with `byte`
pub fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

/// Creator used by the staged fixture
pub fn creator() -> Address {
    addr(0xaa)
}

/// Token the staged fixture deploys for [`creator`]
pub fn launched_token() -> Address {
    addr(0x10)
}

/// Liquidity the staged fixture launches with
pub fn launch_liquidity() -> U256 {
    ether(2)
}
