//! Private key wallet spanning several configured networks

use super::WalletAdapter;
use crate::config::NetworkConfig;
use crate::signer::LocalSigner;
use alloy::primitives::{Address, ChainId};
use alloy::signers::local::PrivateKeySigner;
use eyre::{Context, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Wallet backed by a single private key
///
/// "Switching" only changes which configured RPC endpoint signers are built for; a chain
/// with no [`NetworkConfig`] is rejected like a wallet rejecting an unsupported network.
pub struct LocalWallet {
    key: PrivateKeySigner,
    networks: HashMap<ChainId, NetworkConfig>,
    active: RwLock<Option<ChainId>>,
}

impl LocalWallet {
    pub fn from_private_key(
        private_key: impl AsRef<str>,
        networks: impl IntoIterator<Item = NetworkConfig>,
    ) -> Result<Self> {
        let key = private_key.as_ref();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let key: PrivateKeySigner = key.parse().context("Failed to parse private key")?;

        Ok(Self {
            key,
            networks: networks.into_iter().map(|n| (n.chain_id, n)).collect(),
            active: RwLock::new(None),
        })
    }

    /// Start on a given chain instead of disconnected
    pub fn with_active_chain(self, chain_id: ChainId) -> Self {
        *self.active.write() = Some(chain_id);
        self
    }

    pub fn address(&self) -> Address {
        self.key.address()
    }
}

impl WalletAdapter for LocalWallet {
    type Signer = LocalSigner;

    fn active_chain(&self) -> Option<ChainId> {
        *self.active.read()
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<()> {
        if !self.networks.contains_key(&chain_id) {
            eyre::bail!("Unsupported chain {}", chain_id);
        }
        *self.active.write() = Some(chain_id);
        Ok(())
    }

    async fn signer(&self, chain_id: ChainId) -> Result<LocalSigner> {
        if self.active_chain() != Some(chain_id) {
            eyre::bail!("Wallet is not on chain {}", chain_id);
        }
        let network = self
            .networks
            .get(&chain_id)
            .ok_or_else(|| eyre::eyre!("No network configured for chain {}", chain_id))?;

        LocalSigner::new(self.key.clone(), network)
    }
}
