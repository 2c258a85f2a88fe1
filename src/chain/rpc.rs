//! alloy-backed `ChainClient`
//!
//! Thin adapter: read-only contract calls go through the `sol!` rpc instance
//! types, transactions arrive already signed and are pushed with
//! `eth_sendRawTransaction`. No retries here; the round scheduler owns recovery.

use super::{CallRequest, ChainClient, ChainError, ReceiptSummary};
use crate::contracts::{IUniswapV2Factory, IUniswapV2Router02, IERC20};
use alloy::eips::BlockId;
use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, TxHash, TxKind, U256};
use alloy::providers::Provider;
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Chain client over any alloy provider (HTTP or WebSocket)
pub struct RpcChain<P> {
    provider: Arc<P>,
}

impl<P: Provider + 'static> RpcChain<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

fn transport(err: impl std::fmt::Display) -> ChainError {
    ChainError::Transport(err.to_string())
}

#[async_trait]
impl<P: Provider + 'static> ChainClient for RpcChain<P> {
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.provider.get_balance(owner).await.map_err(transport)
    }

    async fn transaction_count(&self, owner: Address) -> Result<u64, ChainError> {
        self.provider
            .get_transaction_count(owner)
            .pending()
            .await
            .map_err(transport)
    }

    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        let contract = IERC20::new(token, self.provider.clone());
        contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(ChainError::from_call_error)
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        let contract = IERC20::new(token, self.provider.clone());
        contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(ChainError::from_call_error)
    }

    async fn token_symbol(&self, token: Address) -> Result<String, ChainError> {
        let contract = IERC20::new(token, self.provider.clone());
        contract.symbol().call().await.map_err(ChainError::from_call_error)
    }

    async fn amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>, ChainError> {
        let contract = IUniswapV2Router02::new(router, self.provider.clone());
        contract
            .getAmountsOut(amount_in, path.to_vec())
            .call()
            .await
            .map_err(ChainError::from_call_error)
    }

    async fn get_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, ChainError> {
        let contract = IUniswapV2Factory::new(factory, self.provider.clone());
        contract
            .getPair(token_a, token_b)
            .call()
            .await
            .map_err(ChainError::from_call_error)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, ChainError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(transport)?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<ReceiptSummary>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(transport)?;

        Ok(receipt.map(|r| ReceiptSummary {
            tx_hash: r.transaction_hash,
            success: r.status(),
            block_number: r.block_number,
            gas_used: r.gas_used,
        }))
    }

    async fn revert_reason(&self, call: CallRequest) -> Option<String> {
        let request = TransactionRequest {
            from: Some(call.from),
            to: Some(TxKind::Call(call.to)),
            value: Some(call.value),
            input: TransactionInput::new(call.input),
            ..Default::default()
        };

        let mut eth_call = self.provider.call(request);
        if let Some(block) = call.block {
            eth_call = eth_call.block(BlockId::number(block));
        }

        match eth_call.await {
            Ok(_) => {
                debug!("Replay at block {:?} did not revert", call.block);
                None
            }
            Err(e) => Some(e.to_string()),
        }
    }
}
