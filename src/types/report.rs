//! Submission results and run-level reporting

use crate::error::BatchError;
use alloy::primitives::{ChainId, TxHash, B256};

/// Transactions produced for one chain batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionResult {
    pub chain_id: ChainId,
    pub transaction_hashes: Vec<TxHash>,
    /// Deterministic attestation uids, for submissions that yielded no hash
    pub uids: Vec<B256>,
}

impl SubmissionResult {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            ..Default::default()
        }
    }

    /// Identifiers to hand to the indexer: hashes, or uids when no hash exists
    pub fn notify_ids(&self) -> &[B256] {
        if self.transaction_hashes.is_empty() {
            &self.uids
        } else {
            &self.transaction_hashes
        }
    }
}

/// A batch that reached `Indexed`
#[derive(Debug, Clone)]
pub struct BatchSuccess {
    pub submission: SubmissionResult,
    /// Indexer notifications that were accepted
    pub notified: usize,
    /// Indexer queries until the predicate held
    pub poll_attempts: u32,
}

/// Terminal outcome of one chain batch
#[derive(Debug)]
pub struct BatchOutcome {
    pub chain_id: ChainId,
    pub batch_size: usize,
    pub result: Result<BatchSuccess, BatchError>,
}

impl BatchOutcome {
    pub fn is_indexed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-chain outcomes of one orchestration run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Processed batches, in processing order
    pub outcomes: Vec<BatchOutcome>,
    /// Chains never attempted because the run aborted
    pub skipped: Vec<ChainId>,
    /// Chain where the wallet became unavailable, if the run aborted
    pub aborted_at: Option<ChainId>,
}

impl RunReport {
    /// Every batch reached `Indexed`
    pub fn is_success(&self) -> bool {
        self.aborted_at.is_none() && self.outcomes.iter().all(BatchOutcome::is_indexed)
    }

    pub fn indexed_chains(&self) -> Vec<ChainId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_indexed())
            .map(|o| o.chain_id)
            .collect()
    }

    pub fn failed_chains(&self) -> Vec<ChainId> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_indexed())
            .map(|o| o.chain_id)
            .collect()
    }

    pub fn outcome(&self, chain_id: ChainId) -> Option<&BatchOutcome> {
        self.outcomes.iter().find(|o| o.chain_id == chain_id)
    }
}
