//! Local private key signer

use super::{TransactionSigner, TxRequest};
use crate::config::NetworkConfig;
use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, ChainId, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use eyre::{Context, Result};
use std::sync::Arc;

/// Signer holding a raw EVM private key, bound to one chain's RPC endpoint
pub struct LocalSigner {
    /// Provider with wallet filler - handles nonce, gas and signing
    provider: Arc<dyn Provider<Ethereum>>,
    address: Address,
    chain_id: ChainId,
}

impl LocalSigner {
    /// Create a signer from a hex private key (with or without 0x prefix)
    ///
    /// ```rust,ignore
    /// let signer = LocalSigner::from_private_key("0x...", &NetworkConfig::optimism())?;
    /// ```
    pub fn from_private_key(private_key: impl AsRef<str>, network: &NetworkConfig) -> Result<Self> {
        let key = private_key.as_ref();
        let key = key.strip_prefix("0x").unwrap_or(key);

        let signer: PrivateKeySigner = key.parse().context("Failed to parse private key")?;
        Self::new(signer, network)
    }

    /// Bind an already parsed key to a network
    pub fn new(signer: PrivateKeySigner, network: &NetworkConfig) -> Result<Self> {
        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let url: Url = network.rpc_url.parse().context("Invalid RPC URL")?;

        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

        Ok(Self {
            provider: Arc::new(provider),
            address,
            chain_id: network.chain_id,
        })
    }
}

impl TransactionSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    async fn sign_and_send(&self, tx: TxRequest) -> Result<TxHash> {
        let tx_request = alloy::rpc::types::TransactionRequest::default()
            .with_to(tx.to)
            .with_input(tx.data)
            .with_chain_id(self.chain_id);

        let pending_tx = self
            .provider
            .send_transaction(tx_request)
            .await
            .with_context(|| format!("Failed to send transaction on chain {}", self.chain_id))?;

        Ok(*pending_tx.tx_hash())
    }
}
