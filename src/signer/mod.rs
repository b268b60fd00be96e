//! Chain-scoped transaction signers
//!
//! A signer is handed out by a [`WalletAdapter`](crate::wallet::WalletAdapter) for the
//! chain the wallet is currently on, and is only used for that chain.

mod local;

pub use local::LocalSigner;

use alloy::primitives::{Address, Bytes, ChainId, TxHash};
use eyre::Result;

/// Transaction request parameters
#[derive(Debug, Clone)]
pub struct TxRequest {
    /// Target contract address
    pub to: Address,
    /// Encoded calldata
    pub data: Bytes,
}

impl TxRequest {
    /// Create a new transaction request
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
        }
    }
}

/// Trait for signing and sending EVM transactions on one chain
pub trait TransactionSigner: Send + Sync {
    /// Returns the signer's EVM address
    fn address(&self) -> Address;

    /// Chain this signer is scoped to
    fn chain_id(&self) -> ChainId;

    /// Signs and sends a transaction, returning the transaction hash
    fn sign_and_send(
        &self,
        tx: TxRequest,
    ) -> impl std::future::Future<Output = Result<TxHash>> + Send;
}
