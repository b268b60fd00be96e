//! Attestation submission
//!
//! [`AttestationSdk`] is the seam to whatever builds and signs attestation transactions.
//! [`AttestationSubmitter`] decides, per chain batch, between one transaction per
//! operation and a single multi-target transaction.

mod eas;

pub use eas::EasAttester;

use crate::error::SubmitError;
use crate::signer::TransactionSigner;
use crate::types::{BatchAction, ChainBatch, Operation, SubmissionResult};
use alloy::primitives::{ChainId, TxHash, B256};
use eyre::Result;
use serde_json::Value;

/// What one single-operation submission produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Submission {
    pub tx_hash: Option<TxHash>,
    /// Attestation uid, when the SDK knows it up front
    pub uid: Option<B256>,
}

impl Submission {
    pub fn from_hash(tx_hash: TxHash) -> Self {
        Self {
            tx_hash: Some(tx_hash),
            uid: None,
        }
    }
}

/// Builds, signs and broadcasts attestation transactions
pub trait AttestationSdk<S: TransactionSigner>: Send + Sync {
    /// Whether multi-target revoke/complete calls are available
    fn supports_batch(&self) -> bool {
        true
    }

    /// Submit one operation as its own transaction
    fn submit(
        &self,
        signer: &S,
        operation: &Operation,
    ) -> impl std::future::Future<Output = Result<Submission>> + Send;

    /// Submit one call covering every target on `chain_id`
    fn submit_batch(
        &self,
        signer: &S,
        chain_id: ChainId,
        action: BatchAction,
        targets: &[B256],
        payload: &Value,
    ) -> impl std::future::Future<Output = Result<Vec<TxHash>>> + Send;
}

/// Submits the operations of one chain batch, at most once
pub struct AttestationSubmitter<'a, A> {
    sdk: &'a A,
}

impl<'a, A> AttestationSubmitter<'a, A> {
    pub fn new(sdk: &'a A) -> Self {
        Self { sdk }
    }

    /// Submit a batch with a signer already scoped to its chain
    ///
    /// No retry: the first failure fails the batch, carrying whatever was already
    /// broadcast.
    pub async fn submit<S>(&self, signer: &S, batch: &ChainBatch) -> Result<SubmissionResult, SubmitError>
    where
        S: TransactionSigner,
        A: AttestationSdk<S>,
    {
        let mut result = SubmissionResult::new(batch.chain_id);

        if self.sdk.supports_batch() {
            if let Some((action, targets)) = batch.merged_action() {
                // Merged targets share one payload
                let payload = batch.operations[0].payload();
                tracing::info!(
                    chain_id = batch.chain_id,
                    ?action,
                    targets = targets.len(),
                    "submitting multi-target attestation"
                );

                let hashes = self
                    .sdk
                    .submit_batch(signer, batch.chain_id, action, &targets, payload)
                    .await
                    .map_err(|source| SubmitError {
                        chain_id: batch.chain_id,
                        operation: "batch".to_string(),
                        submitted: SubmissionResult::new(batch.chain_id),
                        source,
                    })?;

                result.transaction_hashes = hashes;
                if result.transaction_hashes.is_empty() {
                    result.uids = targets;
                }
                return Ok(result);
            }
        }

        for operation in &batch.operations {
            tracing::info!(
                chain_id = batch.chain_id,
                operation = operation.id(),
                kind = operation.kind().label(),
                "submitting attestation"
            );

            let submission = match self.sdk.submit(signer, operation).await {
                Ok(submission) => submission,
                Err(source) => {
                    return Err(SubmitError {
                        chain_id: batch.chain_id,
                        operation: operation.id().to_string(),
                        submitted: result,
                        source,
                    })
                }
            };

            match submission.tx_hash {
                Some(hash) => result.transaction_hashes.push(hash),
                None => {
                    let uid = submission.uid.or_else(|| operation.kind().target_uid());
                    match uid {
                        Some(uid) => result.uids.push(uid),
                        None => tracing::warn!(
                            operation = operation.id(),
                            "submission returned neither hash nor uid"
                        ),
                    }
                }
            }
        }

        Ok(result)
    }
}
