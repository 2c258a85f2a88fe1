//! Local signer
//!
//! Holds the operator key and produces raw legacy transactions. Keys never
//! leave the process; the node only sees `eth_sendRawTransaction`.

use super::action::Action;
use crate::error::{BotError, BotResult};
use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxHash, TxKind};
use alloy::signers::local::PrivateKeySigner;

/// A signed transaction ready for submission
#[derive(Debug, Clone)]
pub struct SignedTx {
    pub raw: Bytes,
    pub hash: TxHash,
}

pub struct Account {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl Account {
    pub fn new(signer: PrivateKeySigner, chain_id: u64) -> Self {
        Self { signer, chain_id }
    }

    /// Parse a hex private key, with or without `0x`.
    pub fn from_private_key(key: &str, chain_id: u64) -> BotResult<Self> {
        let signer: PrivateKeySigner = key
            .trim()
            .parse()
            .map_err(|e| BotError::Config(format!("invalid private key: {}", e)))?;
        Ok(Self::new(signer, chain_id))
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn sign_legacy(
        &self,
        action: &Action,
        nonce: u64,
        gas_price: u128,
        gas_limit: u64,
    ) -> BotResult<SignedTx> {
        let mut tx = TxLegacy {
            chain_id: Some(self.chain_id),
            nonce,
            gas_price,
            gas_limit,
            to: TxKind::Call(action.target()),
            value: action.value(),
            input: action.calldata(),
        };

        let sig = TxSignerSync::sign_transaction_sync(&self.signer, &mut tx).map_err(|e| {
            BotError::Build {
                action: action.kind().to_string(),
                reason: e.to_string(),
            }
        })?;
        let envelope: TxEnvelope = tx.into_signed(sig).into();

        Ok(SignedTx {
            hash: *envelope.tx_hash(),
            raw: Bytes::from(envelope.encoded_2718()),
        })
    }
}
