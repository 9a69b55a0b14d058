pub mod cancel_request;
pub mod check_badges;
pub mod init_db;
pub mod list_badges;
pub mod queue_status;
pub mod run_service;

use crate::config::ServiceConfig;
use crate::error::{CliError, CliResult};
use meme_badges_chain::EvmGateway;
use std::time::Duration;

/// Upper bound for the startup chain-id check
const CHAIN_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Fail fast when the configured endpoint does not answer
pub(crate) async fn check_chain(gateway: &EvmGateway, config: &ServiceConfig) -> CliResult<u64> {
    match tokio::time::timeout(CHAIN_CHECK_TIMEOUT, gateway.chain_id()).await {
        Ok(Ok(chain_id)) => Ok(chain_id),
        Ok(Err(e)) => Err(CliError::InvalidConfig(format!(
            "RPC endpoint {} is unreachable: {}",
            config.rpc_url, e
        ))),
        Err(_) => Err(CliError::InvalidConfig(format!(
            "RPC endpoint {} did not answer within {:?}",
            config.rpc_url, CHAIN_CHECK_TIMEOUT
        ))),
    }
}
