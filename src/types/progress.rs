//! Lifecycle events emitted per chain batch

use alloy::primitives::ChainId;
use serde::Serialize;
use std::fmt;

/// Stage of a chain batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Batch picked up, nothing sent to the wallet yet
    Preparing,
    /// Waiting on the wallet (network switch, signature, broadcast)
    Pending,
    /// Transaction sent, waiting for the indexer
    Indexing,
    /// Indexer reflects the change
    Indexed,
    /// Batch ended without reaching `Indexed`
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preparing => "preparing",
            Self::Pending => "pending",
            Self::Indexing => "indexing",
            Self::Indexed => "indexed",
            Self::Failed => "failed",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub phase: Phase,
    pub chain_id: ChainId,
    pub batch_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressEvent {
    pub fn new(phase: Phase, chain_id: ChainId, batch_size: usize) -> Self {
        Self {
            phase,
            chain_id,
            batch_size,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
