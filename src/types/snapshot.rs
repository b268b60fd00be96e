//! Indexed project state as served by the indexer

use alloy::primitives::{ChainId, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest indexed view of a project and its grants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    /// Project uid or slug
    pub uid: String,
    #[serde(default)]
    pub grants: Vec<GrantSnapshot>,
}

/// Grant as indexed on one chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantSnapshot {
    pub uid: B256,
    #[serde(rename = "chainID")]
    pub chain_id: ChainId,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub milestones: Vec<MilestoneSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneSnapshot {
    pub uid: B256,
    /// Completion attestation data, absent until completed
    #[serde(default)]
    pub completed: Option<serde_json::Value>,
}

impl MilestoneSnapshot {
    pub fn is_completed(&self) -> bool {
        matches!(&self.completed, Some(data) if !data.is_null())
    }
}

impl ProjectSnapshot {
    pub fn grant(&self, uid: B256) -> Option<&GrantSnapshot> {
        self.grants.iter().find(|g| g.uid == uid)
    }

    /// Find a milestone in any grant of the project
    pub fn milestone(&self, uid: B256) -> Option<&MilestoneSnapshot> {
        self.grants
            .iter()
            .flat_map(|g| g.milestones.iter())
            .find(|m| m.uid == uid)
    }
}
