/*!
# Meme Badges Chain

Everything the badge engine needs from the chain, behind three traits:

- [`ContractReader`]: factory registry reads, `hasBadge` and badge requirements
- [`BadgeMinter`]: the privileged `mintBadge` call and confirmation wait
- [`EventSource`]: decoded `TokenCreated` and large `Transfer` logs

[`EvmGateway`] implements all three over JSON-RPC with alloy, and
[`EventReader`] turns an `EventSource` into a bounded event channel.

## Quick Start

```rust,no_run
use meme_badges_chain::{EventReader, EvmGateway, GatewayConfig, ReaderConfig};
use meme_badges_types::Address;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

# async fn example() -> Result<(), Box<dyn std::error::Error>> {
let config = GatewayConfig::new(Address::ZERO, Address::ZERO);
let gateway = Arc::new(EvmGateway::read_only("https://mainnet.base.org".parse()?, config));

let (events_tx, mut events_rx) = mpsc::channel(256);
let (_shutdown_tx, shutdown_rx) = watch::channel(false);
tokio::spawn(EventReader::new(gateway, ReaderConfig::default()).run(events_tx, shutdown_rx));

while let Some(event) = events_rx.recv().await {
    println!("{:?}", event);
}
# Ok(())
# }
```
*/

mod client;
mod config;
pub mod contracts;
mod error;
mod event_reader;
mod gateway;

pub use client::EvmGateway;
pub use config::{GatewayConfig, ReaderConfig};
pub use error::{ChainError, ChainResult};
pub use event_reader::EventReader;
pub use gateway::{BadgeMinter, ContractReader, EventSource, MintCall, MintReceipt, TokenInfo};

// Re-export the signer type used to load the minter key
pub use alloy::signers::local::PrivateKeySigner;
