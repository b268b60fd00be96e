//! Per-chain batches of operations

use super::operation::{Operation, OperationKind};
use crate::grouper::{group_by_chain, ChainGroup};
use alloy::primitives::{ChainId, B256};

/// Operations targeting one chain, processed inside one network-switch scope
#[derive(Debug, Clone, PartialEq)]
pub struct ChainBatch {
    pub chain_id: ChainId,
    pub operations: Vec<Operation>,
    pub is_current_chain: bool,
}

impl ChainBatch {
    /// Partition operations into ordered per-chain batches
    pub fn plan(operations: Vec<Operation>, active_chain: Option<ChainId>) -> Vec<Self> {
        group_by_chain(operations, active_chain)
            .into_iter()
            .map(Self::from)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Multi-target action covering the whole batch, if it qualifies for one
    ///
    /// Only two or more merged-milestone instances qualify, all completions or all
    /// revocations, carrying the same payload.
    pub fn merged_action(&self) -> Option<(BatchAction, Vec<B256>)> {
        if self.operations.len() < 2 {
            return None;
        }

        let payload = self.operations[0].payload();
        if self
            .operations
            .iter()
            .any(|op| !op.is_merged() || op.payload() != payload)
        {
            return None;
        }

        let action = match self.operations[0].kind() {
            OperationKind::Complete { .. } => BatchAction::Complete,
            OperationKind::Revoke { .. } => BatchAction::Revoke,
            OperationKind::Create | OperationKind::Update => return None,
        };

        let mut targets = Vec::with_capacity(self.operations.len());
        for op in &self.operations {
            match (action, op.kind()) {
                (BatchAction::Complete, OperationKind::Complete { milestone }) => {
                    targets.push(milestone)
                }
                (BatchAction::Revoke, OperationKind::Revoke { target }) => targets.push(target),
                _ => return None,
            }
        }

        Some((action, targets))
    }
}

impl From<ChainGroup<Operation>> for ChainBatch {
    fn from(group: ChainGroup<Operation>) -> Self {
        Self {
            chain_id: group.chain_id,
            operations: group.items,
            is_current_chain: group.is_current_chain,
        }
    }
}

/// Action of a multi-target submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    Complete,
    Revoke,
}
