use crate::error::within;
use crate::{BadgeStore, EngineConfig, EngineResult};
use meme_badges_chain::{BadgeMinter, ChainError, ContractReader, MintCall, MintReceipt};
use meme_badges_types::{MintRequest, MintStatus, TxHash, U256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Slack on top of the confirmation timeout for minters that ignore it
const CONFIRMATION_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Confirmed {
        request: MintRequest,
        token_id: Option<U256>,
    },
    /// Back to pending, due again after the retry delay
    Retrying { request: MintRequest },
    /// Retries exhausted
    Failed { request: MintRequest },
}

impl SubmissionOutcome {
    pub fn request(&self) -> &MintRequest {
        match self {
            SubmissionOutcome::Confirmed { request, .. }
            | SubmissionOutcome::Retrying { request }
            | SubmissionOutcome::Failed { request } => request,
        }
    }
}

/// Turns queued requests into mint transactions, one at a time.
///
/// The submitter owns the only [`BadgeMinter`], so nothing else in the
/// process can use the minting credential. A request is confirmed only
/// after `await_confirmation` returned a successful receipt, or after the
/// badge contract reports the badge minted by an earlier attempt.
pub struct MintSubmitter {
    minter: Arc<dyn BadgeMinter>,
    reader: Arc<dyn ContractReader>,
    store: BadgeStore,
    config: EngineConfig,
}

impl MintSubmitter {
    pub fn new(
        minter: Arc<dyn BadgeMinter>,
        reader: Arc<dyn ContractReader>,
        store: BadgeStore,
        config: EngineConfig,
    ) -> Self {
        Self {
            minter,
            reader,
            store,
            config,
        }
    }

    /// Submit the next due request, if there is one
    pub async fn submit_next(&self) -> EngineResult<Option<SubmissionOutcome>> {
        let Some(request) = self.store.dequeue_next().await? else {
            return Ok(None);
        };
        self.submit(request).await.map(Some)
    }

    /// Re-await requests a previous run left `Submitted`. Their transaction
    /// was already broadcast, so they are never sent again.
    pub async fn recover_submitted(&self) -> EngineResult<Vec<SubmissionOutcome>> {
        let stranded = self.store.submitted_requests().await?;
        if !stranded.is_empty() {
            info!(count = stranded.len(), "Recovering submitted mint requests");
        }

        let mut outcomes = Vec::with_capacity(stranded.len());
        for request in stranded {
            let outcome = match request.tx_hash {
                Some(tx_hash) => self.confirm(request, tx_hash).await?,
                None => {
                    self.fail(&request, "submitted without a transaction hash")
                        .await?
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Broadcast `request` and wait for its receipt. The request must be
    /// `Pending`.
    ///
    /// A request carrying the hash of an earlier broadcast may have landed
    /// after its wait ran out. If the badge contract already reports the
    /// badge, the request is completed without sending anything.
    pub async fn submit(&self, request: MintRequest) -> EngineResult<SubmissionOutcome> {
        if let Some(previous) = request.tx_hash {
            let held = within(
                "has_badge",
                self.config.read_timeout,
                self.reader.has_badge(request.recipient, request.badge_kind),
            )
            .await;

            match held {
                Ok(true) => return self.adopt_earlier_mint(request, previous).await,
                Ok(false) => {}
                Err(e) => return self.fail(&request, &e.to_string()).await,
            }
        }

        let call = MintCall::from_request(&request);

        let sent = tokio::time::timeout(
            self.config.submit_timeout,
            self.minter.submit_mint(&call),
        )
        .await;
        let tx_hash = match sent {
            Ok(Ok(tx_hash)) => tx_hash,
            Ok(Err(e)) => return self.fail(&request, &e.to_string()).await,
            Err(_) => {
                let e = ChainError::Timeout {
                    operation: "submit_mint",
                    after: self.config.submit_timeout,
                };
                return self.fail(&request, &e.to_string()).await;
            }
        };

        let submitted = self.store.mark_submitted(request.id, tx_hash).await?;
        self.confirm(submitted, tx_hash).await
    }

    async fn confirm(
        &self,
        request: MintRequest,
        tx_hash: TxHash,
    ) -> EngineResult<SubmissionOutcome> {
        let waited = self.config.confirmation_timeout;
        let receipt = tokio::time::timeout(
            waited + CONFIRMATION_GRACE,
            self.minter.await_confirmation(tx_hash, waited),
        )
        .await
        .unwrap_or(Err(ChainError::ConfirmationTimeout { tx_hash, waited }));

        match receipt {
            Ok(receipt) => {
                let confirmed = self.store.complete(&request, &receipt).await?;
                info!(
                    request_id = confirmed.id,
                    subject = %confirmed.recipient,
                    kind = %confirmed.badge_kind,
                    tx_hash = %tx_hash,
                    token_id = ?receipt.token_id,
                    "Badge minted"
                );
                Ok(SubmissionOutcome::Confirmed {
                    request: confirmed,
                    token_id: receipt.token_id,
                })
            }
            Err(e) => self.fail(&request, &e.to_string()).await,
        }
    }

    async fn adopt_earlier_mint(
        &self,
        request: MintRequest,
        previous: TxHash,
    ) -> EngineResult<SubmissionOutcome> {
        let landed = within(
            "find_receipt",
            self.config.read_timeout,
            self.minter.find_receipt(previous),
        )
        .await;
        let receipt = match landed {
            Ok(Some(receipt)) => receipt,
            Ok(None) => MintReceipt {
                tx_hash: previous,
                block_number: None,
                token_id: None,
            },
            Err(e) => {
                debug!(tx_hash = %previous, "Receipt lookup failed: {}", e);
                MintReceipt {
                    tx_hash: previous,
                    block_number: None,
                    token_id: None,
                }
            }
        };

        let submitted = self.store.mark_submitted(request.id, receipt.tx_hash).await?;
        let confirmed = self.store.complete(&submitted, &receipt).await?;
        info!(
            request_id = confirmed.id,
            subject = %confirmed.recipient,
            kind = %confirmed.badge_kind,
            tx_hash = %receipt.tx_hash,
            token_id = ?receipt.token_id,
            "Badge already minted by an earlier attempt"
        );

        Ok(SubmissionOutcome::Confirmed {
            request: confirmed,
            token_id: receipt.token_id,
        })
    }

    async fn fail(&self, request: &MintRequest, reason: &str) -> EngineResult<SubmissionOutcome> {
        let delay = self.config.backoff_delay(request.retry_count);
        let retry_at = self.config.retry_at(request.retry_count);

        let updated = self
            .store
            .mark_failed(request.id, reason, self.config.max_retries, retry_at)
            .await?;

        if updated.status == MintStatus::Failed {
            error!(
                request_id = updated.id,
                subject = %updated.recipient,
                kind = %updated.badge_kind,
                attempts = updated.retry_count,
                "Badge mint failed permanently: {}",
                reason
            );
            Ok(SubmissionOutcome::Failed { request: updated })
        } else {
            warn!(
                request_id = updated.id,
                subject = %updated.recipient,
                kind = %updated.badge_kind,
                attempts = updated.retry_count,
                retry_in = ?delay,
                "Badge mint attempt failed: {}",
                reason
            );
            Ok(SubmissionOutcome::Retrying { request: updated })
        }
    }
}
