use crate::{
    contracts::{IBadgeNFT, IERC20, ITokenFactory},
    BadgeMinter, ChainError, ChainResult, ContractReader, EventSource, GatewayConfig, MintCall,
    MintReceipt, TokenInfo,
};
use alloy::{
    network::{EthereumWallet, ReceiptResponse},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{Filter, Log, TransactionReceipt},
    signers::local::PrivateKeySigner,
    sol_types::SolEvent,
};
use async_trait::async_trait;
use meme_badges_types::{
    Address, BadgeKind, ChainEvent, LargeTransfer, TokenCreated, TxHash, U256,
};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Contract-call gateway backed by an HTTP JSON-RPC endpoint
pub struct EvmGateway {
    provider: DynProvider,
    minter: Option<Address>,
    config: GatewayConfig,
}

impl EvmGateway {
    /// Gateway that signs mints with the given minter key
    pub fn with_minter(rpc_url: Url, minter: PrivateKeySigner, config: GatewayConfig) -> Self {
        let minter_address = minter.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(minter))
            .connect_http(rpc_url)
            .erased();

        Self {
            provider,
            minter: Some(minter_address),
            config,
        }
    }

    /// Gateway for reads only; submitting a mint through it fails
    pub fn read_only(rpc_url: Url, config: GatewayConfig) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();

        Self {
            provider,
            minter: None,
            config,
        }
    }

    pub fn minter_address(&self) -> Option<Address> {
        self.minter
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub async fn chain_id(&self) -> ChainResult<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn fetch_token_created(&self, from: u64, to: u64) -> ChainResult<Vec<ChainEvent>> {
        let filter = Filter::new()
            .address(self.config.factory_address)
            .event_signature(ITokenFactory::TokenCreated::SIGNATURE_HASH)
            .from_block(from)
            .to_block(to);

        let logs = self.provider.get_logs(&filter).await?;
        let mut events = Vec::with_capacity(logs.len());

        for log in logs {
            let (block_number, log_index) = log_position(&log, to);
            match log.log_decode::<ITokenFactory::TokenCreated>() {
                Ok(decoded) => {
                    let created = decoded.inner.data;
                    events.push(ChainEvent::TokenCreated(TokenCreated {
                        creator: created.creator,
                        token: created.tokenAddress,
                        name: created.name,
                        symbol: created.symbol,
                        total_supply: created.totalSupply,
                        initial_liquidity: created.initialLiquidity,
                        lock_period: created.lockPeriod,
                        block_number,
                        log_index,
                    }));
                }
                Err(e) => {
                    debug!(block_number, log_index, "Skipping undecodable TokenCreated log: {}", e)
                }
            }
        }

        Ok(events)
    }

    async fn fetch_large_transfers(&self, from: u64, to: u64) -> ChainResult<Vec<ChainEvent>> {
        let filter = Filter::new()
            .event_signature(IERC20::Transfer::SIGNATURE_HASH)
            .from_block(from)
            .to_block(to);

        let logs = self.provider.get_logs(&filter).await?;
        Ok(logs
            .iter()
            .filter_map(|log| decode_large_transfer(log, self.config.min_transfer_value, to))
            .collect())
    }

    fn mint_receipt(&self, tx_hash: TxHash, receipt: &TransactionReceipt) -> MintReceipt {
        MintReceipt {
            tx_hash,
            block_number: receipt.block_number,
            token_id: self.token_id_from_receipt(receipt),
        }
    }

    fn token_id_from_receipt(&self, receipt: &TransactionReceipt) -> Option<U256> {
        receipt
            .inner
            .logs()
            .iter()
            .filter(|log| log.inner.address == self.config.badge_nft_address)
            .find_map(|log| log.log_decode::<IBadgeNFT::BadgeMinted>().ok())
            .map(|minted| minted.inner.data.tokenId)
    }
}

/// `None` for logs below `min_value` and for logs that are not ERC-20
/// transfers. ERC-721 transfers share the topic but index the third argument.
fn decode_large_transfer(log: &Log, min_value: U256, fallback_block: u64) -> Option<ChainEvent> {
    let transfer = log.log_decode::<IERC20::Transfer>().ok()?.inner.data;
    if transfer.value < min_value {
        return None;
    }

    let (block_number, log_index) = log_position(log, fallback_block);
    Some(ChainEvent::LargeTransfer(LargeTransfer {
        token: log.inner.address,
        from: transfer.from,
        to: transfer.to,
        value: transfer.value,
        block_number,
        log_index,
    }))
}

fn log_position(log: &Log, fallback_block: u64) -> (u64, u64) {
    (
        log.block_number.unwrap_or(fallback_block),
        log.log_index.unwrap_or_default(),
    )
}

#[async_trait]
impl ContractReader for EvmGateway {
    async fn created_tokens(&self, creator: Address) -> ChainResult<Vec<Address>> {
        let factory = ITokenFactory::new(self.config.factory_address, &self.provider);
        Ok(factory.getCreatedTokens(creator).call().await?)
    }

    async fn token_info(&self, token: Address) -> ChainResult<TokenInfo> {
        let factory = ITokenFactory::new(self.config.factory_address, &self.provider);
        let info = factory.getTokenInfo(token).call().await?;

        Ok(TokenInfo {
            token: info.tokenAddress,
            creator: info.creator,
            name: info.name,
            symbol: info.symbol,
            total_supply: info.totalSupply,
            initial_liquidity: info.initialLiquidity,
            lock_period: info.lockPeriod,
            created_at: info.createdAt,
        })
    }

    async fn has_badge(&self, subject: Address, kind: BadgeKind) -> ChainResult<bool> {
        let badges = IBadgeNFT::new(self.config.badge_nft_address, &self.provider);
        Ok(badges.hasBadge(subject, kind.as_u8()).call().await?)
    }

    async fn badge_requirement(&self, kind: BadgeKind) -> ChainResult<U256> {
        let badges = IBadgeNFT::new(self.config.badge_nft_address, &self.provider);
        Ok(badges.badgeRequirements(kind.as_u8()).call().await?)
    }
}

#[async_trait]
impl BadgeMinter for EvmGateway {
    async fn submit_mint(&self, call: &MintCall) -> ChainResult<TxHash> {
        if self.minter.is_none() {
            return Err(ChainError::Config(
                "Gateway was created without a minter key".to_string(),
            ));
        }

        let badges = IBadgeNFT::new(self.config.badge_nft_address, &self.provider);
        let (to, badge_type, token_address, achievement_value) = call.args();

        let pending = badges
            .mintBadge(to, badge_type, token_address, achievement_value)
            .send()
            .await?;
        let tx_hash = *pending.tx_hash();

        info!(
            recipient = %call.recipient,
            kind = %call.badge_kind,
            tx_hash = %tx_hash,
            "Broadcast badge mint"
        );
        Ok(tx_hash)
    }

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
    ) -> ChainResult<MintReceipt> {
        let poll_interval = self.config.receipt_poll_interval;
        let wait_for_receipt = async {
            loop {
                if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                    return Ok::<_, ChainError>(receipt);
                }
                tokio::time::sleep(poll_interval).await;
            }
        };

        let receipt = match tokio::time::timeout(timeout, wait_for_receipt).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ChainError::ConfirmationTimeout {
                    tx_hash,
                    waited: timeout,
                })
            }
        };

        if !receipt.status() {
            return Err(ChainError::Reverted { tx_hash });
        }

        Ok(self.mint_receipt(tx_hash, &receipt))
    }

    async fn find_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<MintReceipt>> {
        let receipt = self.provider.get_transaction_receipt(tx_hash).await?;
        Ok(receipt
            .filter(|receipt| receipt.status())
            .map(|receipt| self.mint_receipt(tx_hash, &receipt)))
    }
}

#[async_trait]
impl EventSource for EvmGateway {
    async fn latest_block(&self) -> ChainResult<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn fetch_events(&self, from: u64, to: u64) -> ChainResult<Vec<ChainEvent>> {
        let mut events = self.fetch_token_created(from, to).await?;
        events.extend(self.fetch_large_transfers(from, to).await?);

        events.sort_by_key(|event| match event {
            ChainEvent::TokenCreated(e) => (e.block_number, e.log_index),
            ChainEvent::LargeTransfer(e) => (e.block_number, e.log_index),
        });

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Log as PrimitiveLog, LogData, B256};
    use meme_badges_types::ether;

    fn rpc_log(address: Address, data: LogData) -> Log {
        Log {
            inner: PrimitiveLog { address, data },
            block_number: Some(42),
            log_index: Some(3),
            ..Default::default()
        }
    }

    fn erc20_transfer(value: U256) -> Log {
        let event = IERC20::Transfer {
            from: Address::repeat_byte(0x01),
            to: Address::repeat_byte(0x02),
            value,
        };
        rpc_log(Address::repeat_byte(0x10), event.encode_log_data())
    }

    #[test]
    fn test_large_transfer_is_forwarded() {
        let event = decode_large_transfer(&erc20_transfer(ether(12)), ether(10), 0).unwrap();

        assert_eq!(
            event,
            ChainEvent::LargeTransfer(LargeTransfer {
                token: Address::repeat_byte(0x10),
                from: Address::repeat_byte(0x01),
                to: Address::repeat_byte(0x02),
                value: ether(12),
                block_number: 42,
                log_index: 3,
            })
        );
    }

    #[test]
    fn test_small_transfer_is_dropped() {
        assert!(decode_large_transfer(&erc20_transfer(ether(9)), ether(10), 0).is_none());
        assert!(decode_large_transfer(&erc20_transfer(ether(10)), ether(10), 0).is_some());
    }

    #[test]
    fn test_nft_transfer_is_skipped() {
        // ERC-721: tokenId is the third topic and the data is empty
        let topics = vec![
            IERC20::Transfer::SIGNATURE_HASH,
            Address::repeat_byte(0x01).into_word(),
            Address::repeat_byte(0x02).into_word(),
            B256::with_last_byte(7),
        ];
        let log = rpc_log(
            Address::repeat_byte(0x20),
            LogData::new_unchecked(topics, Default::default()),
        );

        assert!(decode_large_transfer(&log, U256::ZERO, 0).is_none());
    }
}
