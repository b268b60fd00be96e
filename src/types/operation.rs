//! Logical write operations

use crate::grouper::ChainScoped;
use alloy::primitives::{ChainId, B256};
use serde_json::Value;

/// What an operation does to the attested state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// New attestation under `ref_uid` (e.g. a milestone under a grant)
    Create,
    /// Refreshed details attestation for `ref_uid` (e.g. a grant update)
    Update,
    /// Completion attestation referencing a milestone
    Complete { milestone: B256 },
    /// Revocation of an existing attestation (e.g. deleting a milestone)
    Revoke { target: B256 },
}

impl OperationKind {
    /// Attestation this operation acts on, when it exists before submission
    pub fn target_uid(&self) -> Option<B256> {
        match self {
            Self::Create | Self::Update => None,
            Self::Complete { milestone } => Some(*milestone),
            Self::Revoke { target } => Some(*target),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Complete { .. } => "complete",
            Self::Revoke { .. } => "revoke",
        }
    }
}

/// One logical write, tagged with the chain it must land on
///
/// Immutable once constructed; owned by the run that created it.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    id: String,
    kind: OperationKind,
    target_chain_id: ChainId,
    ref_uid: B256,
    payload: Value,
    /// Instance of a milestone merged across grants
    merged: bool,
}

impl Operation {
    pub fn new(
        id: impl Into<String>,
        kind: OperationKind,
        target_chain_id: ChainId,
        ref_uid: B256,
        payload: Value,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            target_chain_id,
            ref_uid,
            payload,
            merged: false,
        }
    }

    /// Mark as one instance of a merged milestone, eligible for multi-target submission
    pub fn into_merged(mut self) -> Self {
        self.merged = true;
        self
    }

    /// Create an attestation under a parent grant or project
    pub fn create(
        id: impl Into<String>,
        chain_id: ChainId,
        parent: B256,
        payload: Value,
    ) -> Self {
        Self::new(id, OperationKind::Create, chain_id, parent, payload)
    }

    /// Update the details of a grant
    pub fn update(id: impl Into<String>, chain_id: ChainId, grant: B256, payload: Value) -> Self {
        Self::new(id, OperationKind::Update, chain_id, grant, payload)
    }

    /// Mark a milestone of a grant complete
    pub fn complete(
        id: impl Into<String>,
        chain_id: ChainId,
        grant: B256,
        milestone: B256,
        payload: Value,
    ) -> Self {
        Self::new(
            id,
            OperationKind::Complete { milestone },
            chain_id,
            grant,
            payload,
        )
    }

    /// Revoke a milestone of a grant
    pub fn revoke(id: impl Into<String>, chain_id: ChainId, grant: B256, target: B256) -> Self {
        Self::new(
            id,
            OperationKind::Revoke { target },
            chain_id,
            grant,
            Value::Null,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn target_chain_id(&self) -> ChainId {
        self.target_chain_id
    }

    /// Parent grant or project uid
    pub fn ref_uid(&self) -> B256 {
        self.ref_uid
    }

    /// Sanitized domain fields attested with the operation
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn is_merged(&self) -> bool {
        self.merged
    }
}

impl ChainScoped for Operation {
    fn chain_id(&self) -> ChainId {
        self.target_chain_id
    }
}

/// One grant+chain instance of a merged milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MilestoneRef {
    pub grant_uid: B256,
    pub milestone_uid: B256,
    pub chain_id: ChainId,
}

impl MilestoneRef {
    pub fn new(grant_uid: B256, milestone_uid: B256, chain_id: ChainId) -> Self {
        Self {
            grant_uid,
            milestone_uid,
            chain_id,
        }
    }

    /// Completion of this milestone instance
    pub fn complete(&self, payload: Value) -> Operation {
        Operation::complete(
            self.milestone_uid.to_string(),
            self.chain_id,
            self.grant_uid,
            self.milestone_uid,
            payload,
        )
        .into_merged()
    }

    /// Revocation of this milestone instance
    pub fn revoke(&self) -> Operation {
        Operation::revoke(
            self.milestone_uid.to_string(),
            self.chain_id,
            self.grant_uid,
            self.milestone_uid,
        )
        .into_merged()
    }
}

impl ChainScoped for MilestoneRef {
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }
}
