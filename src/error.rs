//! Error types for the attestation SDK
//!
//! Collaborators (wallets, attestation SDKs, the indexer) report failures with `eyre`.
//! The orchestrator sorts those failures into the typed taxonomy below, which decides
//! whether a failure stays inside one chain batch or stops the whole run.

use crate::types::SubmissionResult;
use alloy::primitives::{ChainId, B256};
use thiserror::Error;

pub use eyre::{eyre, Context, Report, Result};

/// The wallet refused to move to the batch's chain (user declined or network unsupported)
#[derive(Debug, Error)]
#[error("chain switch declined")]
pub struct ChainSwitchError {
    /// Chain the batch needed
    pub chain_id: ChainId,
    #[source]
    pub source: Report,
}

/// No signer could be produced for the active chain
///
/// Every later batch needs the same wallet, so this stops the run.
#[derive(Debug, Error)]
#[error("wallet unavailable on chain {chain_id}")]
pub struct WalletUnavailableError {
    pub chain_id: ChainId,
    #[source]
    pub source: Report,
}

/// Building, signing or broadcasting an attestation transaction failed
#[derive(Debug, Error)]
#[error("attestation submission failed on chain {chain_id} ({operation})")]
pub struct SubmitError {
    pub chain_id: ChainId,
    /// Operation id, or `batch` for a multi-target submission
    pub operation: String,
    /// Transactions of the batch that were broadcast before the failure
    pub submitted: SubmissionResult,
    #[source]
    pub source: Report,
}

/// The indexer never reflected the change within the poll budget
#[derive(Debug, Error)]
#[error("indexer did not confirm project {project_id} after {attempts} attempts")]
pub struct IndexTimeoutError {
    pub project_id: String,
    pub attempts: u32,
}

/// Best-effort indexer notification failed. Logged, never surfaced as a failure state.
#[derive(Debug, Error)]
#[error("failed to notify indexer of {transaction_hash} on chain {chain_id}")]
pub struct NotifyError {
    pub transaction_hash: B256,
    pub chain_id: ChainId,
    #[source]
    pub source: Report,
}

/// Why a chain batch did not reach `Indexed`
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    ChainSwitch(#[from] ChainSwitchError),

    #[error(transparent)]
    WalletUnavailable(#[from] WalletUnavailableError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    IndexTimeout(#[from] IndexTimeoutError),
}

impl BatchError {
    /// Whether this failure must stop the remaining batches of the run
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::WalletUnavailable(_))
    }
}
