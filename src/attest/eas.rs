//! Attestation SDK backed by the EAS contract

use super::{AttestationSdk, Submission};
use crate::config::{NetworkConfig, SchemaSet};
use crate::contracts::{
    AttestationRequest, AttestationRequestData, MultiAttestationRequest, MultiRevocationRequest,
    RevocationRequest, RevocationRequestData, IEAS,
};
use crate::signer::{TransactionSigner, TxRequest};
use crate::types::{BatchAction, Operation, OperationKind};
use alloy::primitives::{Address, Bytes, ChainId, TxHash, B256, U256};
use alloy::sol_types::{SolCall, SolValue};
use eyre::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct Deployment {
    eas: Address,
    schemas: SchemaSet,
}

/// Encodes operations as EAS `attest` / `revoke` calls and sends them through the signer
///
/// Payloads are attested as a single ABI `string` holding the JSON document.
#[derive(Debug, Clone, Default)]
pub struct EasAttester {
    deployments: HashMap<ChainId, Deployment>,
}

impl EasAttester {
    pub fn new(networks: impl IntoIterator<Item = NetworkConfig>) -> Self {
        let deployments = networks
            .into_iter()
            .map(|n| {
                (
                    n.chain_id,
                    Deployment {
                        eas: n.eas,
                        schemas: n.schemas,
                    },
                )
            })
            .collect();
        Self { deployments }
    }

    fn deployment(&self, chain_id: ChainId) -> Result<Deployment> {
        self.deployments
            .get(&chain_id)
            .copied()
            .ok_or_else(|| eyre::eyre!("No EAS deployment configured for chain {}", chain_id))
    }

    /// Calldata for a single operation
    fn encode_operation(
        &self,
        deployment: &Deployment,
        recipient: Address,
        operation: &Operation,
    ) -> Result<Bytes> {
        let schemas = &deployment.schemas;
        let calldata = match operation.kind() {
            OperationKind::Create => attest_call(
                schemas.milestone,
                recipient,
                operation.ref_uid(),
                operation.payload(),
            )?,
            OperationKind::Update => attest_call(
                schemas.grant_details,
                recipient,
                operation.ref_uid(),
                operation.payload(),
            )?,
            OperationKind::Complete { milestone } => attest_call(
                schemas.milestone_completed,
                recipient,
                milestone,
                operation.payload(),
            )?,
            OperationKind::Revoke { target } => {
                let call = IEAS::revokeCall {
                    request: RevocationRequest {
                        schema: schemas.milestone,
                        data: RevocationRequestData {
                            uid: target,
                            value: U256::ZERO,
                        },
                    },
                };
                Bytes::from(call.abi_encode())
            }
        };
        Ok(calldata)
    }

    /// Calldata for a multi-target completion or revocation
    fn encode_batch(
        &self,
        deployment: &Deployment,
        recipient: Address,
        action: BatchAction,
        targets: &[B256],
        payload: &Value,
    ) -> Result<Bytes> {
        let schemas = &deployment.schemas;
        let calldata = match action {
            BatchAction::Complete => {
                let data = encode_payload(payload)?;
                let call = IEAS::multiAttestCall {
                    multiRequests: vec![MultiAttestationRequest {
                        schema: schemas.milestone_completed,
                        data: targets
                            .iter()
                            .map(|target| request_data(recipient, *target, data.clone()))
                            .collect(),
                    }],
                };
                Bytes::from(call.abi_encode())
            }
            BatchAction::Revoke => {
                let call = IEAS::multiRevokeCall {
                    multiRequests: vec![MultiRevocationRequest {
                        schema: schemas.milestone,
                        data: targets
                            .iter()
                            .map(|target| RevocationRequestData {
                                uid: *target,
                                value: U256::ZERO,
                            })
                            .collect(),
                    }],
                };
                Bytes::from(call.abi_encode())
            }
        };
        Ok(calldata)
    }
}

impl<S: TransactionSigner> AttestationSdk<S> for EasAttester {
    async fn submit(&self, signer: &S, operation: &Operation) -> Result<Submission> {
        let deployment = self.deployment(signer.chain_id())?;
        let data = self.encode_operation(&deployment, signer.address(), operation)?;

        let hash = signer
            .sign_and_send(TxRequest::new(deployment.eas, data))
            .await
            .with_context(|| format!("Failed to {} attestation", operation.kind().label()))?;

        Ok(Submission::from_hash(hash))
    }

    async fn submit_batch(
        &self,
        signer: &S,
        chain_id: ChainId,
        action: BatchAction,
        targets: &[B256],
        payload: &Value,
    ) -> Result<Vec<TxHash>> {
        eyre::ensure!(
            signer.chain_id() == chain_id,
            "Signer is scoped to chain {}, batch targets chain {}",
            signer.chain_id(),
            chain_id
        );
        let deployment = self.deployment(chain_id)?;
        let data = self.encode_batch(&deployment, signer.address(), action, targets, payload)?;

        let hash = signer
            .sign_and_send(TxRequest::new(deployment.eas, data))
            .await
            .context("Failed to send multi-target attestation")?;

        Ok(vec![hash])
    }
}

fn attest_call(schema: B256, recipient: Address, ref_uid: B256, payload: &Value) -> Result<Bytes> {
    let call = IEAS::attestCall {
        request: AttestationRequest {
            schema,
            data: request_data(recipient, ref_uid, encode_payload(payload)?),
        },
    };
    Ok(Bytes::from(call.abi_encode()))
}

fn request_data(recipient: Address, ref_uid: B256, data: Bytes) -> AttestationRequestData {
    AttestationRequestData {
        recipient,
        expirationTime: 0,
        revocable: true,
        refUID: ref_uid,
        data,
        value: U256::ZERO,
    }
}

/// ABI-encode the payload JSON as a single `string`
fn encode_payload(payload: &Value) -> Result<Bytes> {
    let json = serde_json::to_string(payload).context("Failed to serialize payload")?;
    Ok(Bytes::from(json.abi_encode()))
}
