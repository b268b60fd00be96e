//! Wallet access: network switching and signer resolution
//!
//! The wallet's active chain is process-wide mutable state. It is only ever touched
//! through a [`WalletLease`], and a [`WalletHandle`] hands out at most one lease at a
//! time, so two batches (or two runs sharing a handle) can never switch networks
//! concurrently.

mod local;

pub use local::LocalWallet;

use crate::error::{ChainSwitchError, WalletUnavailableError};
use crate::signer::TransactionSigner;
use alloy::primitives::ChainId;
use eyre::Result;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Wallet adapter: the connected wallet as seen by the orchestrator
pub trait WalletAdapter: Send + Sync {
    type Signer: TransactionSigner;

    /// Chain the wallet is currently on, if connected
    fn active_chain(&self) -> Option<ChainId>;

    /// Whether a wallet is connected at all
    fn is_connected(&self) -> bool {
        true
    }

    /// Ask the wallet to move to `chain_id`. Resolves once the switch completed.
    fn switch_chain(
        &self,
        chain_id: ChainId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Signer for `chain_id`, which must be the active chain
    fn signer(
        &self,
        chain_id: ChainId,
    ) -> impl std::future::Future<Output = Result<Self::Signer>> + Send;
}

/// Shared owner of a wallet adapter
pub struct WalletHandle<W> {
    inner: Arc<HandleInner<W>>,
}

struct HandleInner<W> {
    wallet: W,
    lease: Mutex<()>,
}

impl<W> Clone for WalletHandle<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: WalletAdapter> WalletHandle<W> {
    pub fn new(wallet: W) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                wallet,
                lease: Mutex::new(()),
            }),
        }
    }

    pub fn wallet(&self) -> &W {
        &self.inner.wallet
    }

    pub fn active_chain(&self) -> Option<ChainId> {
        self.inner.wallet.active_chain()
    }

    /// Exclusive access to the wallet, held for the duration of one batch
    pub async fn lease(&self) -> WalletLease<'_, W> {
        let guard = self.inner.lease.lock().await;
        WalletLease {
            wallet: &self.inner.wallet,
            _guard: guard,
        }
    }
}

/// Single-writer access to the wallet's active chain and signer
pub struct WalletLease<'a, W> {
    wallet: &'a W,
    _guard: MutexGuard<'a, ()>,
}

impl<W: WalletAdapter> WalletLease<'_, W> {
    /// Fail fast when no wallet is connected, before any switch is requested
    pub fn ensure_connected(&self, chain_id: ChainId) -> Result<(), WalletUnavailableError> {
        if self.wallet.is_connected() {
            return Ok(());
        }
        Err(WalletUnavailableError {
            chain_id,
            source: eyre::eyre!("no wallet connected"),
        })
    }

    /// Make the wallet's active chain equal `chain_id`
    ///
    /// No-op when already there. A rejected switch is not retried.
    pub async fn ensure_chain(&self, chain_id: ChainId) -> Result<(), ChainSwitchError> {
        if self.wallet.active_chain() == Some(chain_id) {
            tracing::debug!(chain_id, "wallet already on target chain");
            return Ok(());
        }

        tracing::info!(
            chain_id,
            from = ?self.wallet.active_chain(),
            "requesting network switch"
        );
        self.wallet
            .switch_chain(chain_id)
            .await
            .map_err(|source| ChainSwitchError { chain_id, source })
    }

    /// Signer scoped to the now-active chain
    pub async fn signer(&self, chain_id: ChainId) -> Result<W::Signer, WalletUnavailableError> {
        let signer = self
            .wallet
            .signer(chain_id)
            .await
            .map_err(|source| WalletUnavailableError { chain_id, source })?;

        if signer.chain_id() != chain_id {
            return Err(WalletUnavailableError {
                chain_id,
                source: eyre::eyre!(
                    "wallet produced a signer for chain {} instead",
                    signer.chain_id()
                ),
            });
        }

        Ok(signer)
    }
}
