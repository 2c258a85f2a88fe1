//! Step Executor
//!
//! Runs one `Action` end to end: sign with the cursor's current nonce, submit,
//! wait for the receipt, check its status. Nothing is retried here. A failure
//! before the node accepts the transaction leaves the cursor untouched; once
//! accepted, the nonce is consumed whatever happens next.
//!
//! Created: 2026-10-18

use super::action::{Action, ActionKind};
use super::gas::GasPolicy;
use super::nonce::NonceCursor;
use super::signer::Account;
use crate::chain::{CallRequest, ChainClient, ReceiptSummary};
use crate::error::{BotError, BotResult, RevertKind};
use crate::scheduler::Clock;
use alloy::primitives::{Address, TxHash};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    /// Prefix for transaction links in logs, e.g. `https://explorer/tx/`
    pub explorer_tx_url: Option<String>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(1000),
            explorer_tx_url: None,
        }
    }
}

/// Outcome of a confirmed, successful step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReceipt {
    pub kind: ActionKind,
    pub nonce: u64,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

pub struct StepExecutor<C> {
    chain: Arc<C>,
    account: Account,
    gas: GasPolicy,
    settings: ExecutorSettings,
    /// Paces receipt polling
    clock: Arc<dyn Clock>,
}

impl<C: ChainClient> StepExecutor<C> {
    pub fn new(
        chain: Arc<C>,
        account: Account,
        gas: GasPolicy,
        settings: ExecutorSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            chain,
            account,
            gas,
            settings,
            clock,
        }
    }

    pub fn owner(&self) -> Address {
        self.account.address()
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    fn tx_link(&self, tx_hash: TxHash) -> String {
        match &self.settings.explorer_tx_url {
            Some(prefix) => format!("{}{:?}", prefix, tx_hash),
            None => format!("{:?}", tx_hash),
        }
    }

    /// Execute one action using the cursor's current nonce.
    pub async fn execute(&self, action: &Action, cursor: &mut NonceCursor) -> BotResult<StepReceipt> {
        let kind = action.kind();
        let nonce = cursor.peek();

        let signed = self.account.sign_legacy(
            action,
            nonce,
            self.gas.price(kind),
            self.gas.limit(kind),
        )?;

        debug!("Submitting {} | nonce={} | {}", kind, nonce, action.describe());

        let tx_hash = self
            .chain
            .send_raw_transaction(&signed.raw)
            .await
            .map_err(|e| BotError::Submission {
                action: kind.to_string(),
                nonce,
                reason: e.to_string(),
            })?;
        cursor.advance();

        if tx_hash != signed.hash {
            warn!("Node returned hash {:?}, locally computed {:?}", tx_hash, signed.hash);
        }
        info!("{} tx submitted (nonce {}): {}", kind, nonce, self.tx_link(tx_hash));

        let receipt = self.wait_for_receipt(kind, tx_hash).await?;

        if !receipt.success {
            let reason = self
                .chain
                .revert_reason(CallRequest {
                    from: self.owner(),
                    to: action.target(),
                    value: action.value(),
                    input: action.calldata(),
                    block: receipt.block_number,
                })
                .await;
            let revert_kind = RevertKind::classify(reason.as_deref());
            error!(
                "{} tx reverted ({}): {} | reason: {}",
                kind,
                revert_kind,
                self.tx_link(tx_hash),
                reason.as_deref().unwrap_or("unavailable")
            );
            return Err(BotError::Revert {
                action: kind.to_string(),
                tx_hash,
                kind: revert_kind,
                reason,
            });
        }

        info!(
            "{} confirmed in block {:?} | gas used {}",
            kind, receipt.block_number, receipt.gas_used
        );

        Ok(StepReceipt {
            kind,
            nonce,
            tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }

    /// Poll for the receipt until the confirmation timeout. Time waited is
    /// the sum of the clock's poll sleeps.
    async fn wait_for_receipt(&self, kind: ActionKind, tx_hash: TxHash) -> BotResult<ReceiptSummary> {
        let mut waited = Duration::ZERO;
        let confirmation_error = |reason: String| BotError::Confirmation {
            action: kind.to_string(),
            tx_hash,
            reason,
        };

        loop {
            match self.chain.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(e) => debug!("Receipt poll for {:?} failed: {}", tx_hash, e),
            }

            if waited >= self.settings.confirmation_timeout {
                return Err(confirmation_error(format!(
                    "no receipt after {:?}",
                    self.settings.confirmation_timeout
                )));
            }
            self.clock.sleep(self.settings.poll_interval).await;
            waited += self.settings.poll_interval;
        }
    }
}
