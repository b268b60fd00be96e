//! Confirmation predicates over indexed project state

use crate::types::{Operation, OperationKind, ProjectSnapshot};
use alloy::primitives::B256;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Decides from an indexed snapshot whether a submitted change is observable
#[derive(Clone)]
pub struct ConfirmationPredicate(Arc<dyn Fn(&ProjectSnapshot) -> bool + Send + Sync>);

impl fmt::Debug for ConfirmationPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConfirmationPredicate")
    }
}

impl ConfirmationPredicate {
    pub fn from_fn(f: impl Fn(&ProjectSnapshot) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn evaluate(&self, snapshot: &ProjectSnapshot) -> bool {
        (self.0)(snapshot)
    }

    /// The milestone is gone from every grant
    pub fn milestone_removed(milestone: B256) -> Self {
        Self::from_fn(move |s| s.milestone(milestone).is_none())
    }

    /// The milestone carries completion data
    pub fn milestone_completed(milestone: B256) -> Self {
        Self::from_fn(move |s| s.milestone(milestone).is_some_and(|m| m.is_completed()))
    }

    /// The grant's `updated_at` moved past `baseline`
    pub fn grant_updated_after(grant: B256, baseline: DateTime<Utc>) -> Self {
        Self::from_fn(move |s| {
            s.grant(grant)
                .and_then(|g| g.updated_at)
                .is_some_and(|updated| updated > baseline)
        })
    }

    /// Every predicate holds
    pub fn all(predicates: Vec<Self>) -> Self {
        Self::from_fn(move |s| predicates.iter().all(|p| p.evaluate(s)))
    }

    /// Default check for an operation
    ///
    /// Creations and updates are confirmed through their parent grant's `updated_at`,
    /// which the indexer advances whenever an attestation lands under it.
    pub fn for_operation(operation: &Operation, baseline: DateTime<Utc>) -> Self {
        match operation.kind() {
            OperationKind::Create | OperationKind::Update => {
                Self::grant_updated_after(operation.ref_uid(), baseline)
            }
            OperationKind::Complete { milestone } => Self::milestone_completed(milestone),
            OperationKind::Revoke { target } => Self::milestone_removed(target),
        }
    }
}

/// Builds the predicate for each operation of a run
pub type PredicateFactory = Arc<dyn Fn(&Operation) -> ConfirmationPredicate + Send + Sync>;

/// Factory using [`ConfirmationPredicate::for_operation`] against a fixed baseline
pub fn default_predicates(baseline: DateTime<Utc>) -> PredicateFactory {
    Arc::new(move |op| ConfirmationPredicate::for_operation(op, baseline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GrantSnapshot, MilestoneSnapshot};
    use chrono::TimeZone;
    use serde_json::json;

    fn snapshot(updated_at: DateTime<Utc>, milestones: Vec<MilestoneSnapshot>) -> ProjectSnapshot {
        ProjectSnapshot {
            uid: "project".into(),
            grants: vec![GrantSnapshot {
                uid: B256::repeat_byte(0xaa),
                chain_id: 10,
                updated_at: Some(updated_at),
                milestones,
            }],
        }
    }

    fn milestone(n: u8, completed: bool) -> MilestoneSnapshot {
        MilestoneSnapshot {
            uid: B256::repeat_byte(n),
            completed: completed.then(|| json!({ "reason": "done" })),
        }
    }

    #[test]
    fn test_removed_and_completed() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let s = snapshot(t, vec![milestone(1, true), milestone(2, false)]);

        assert!(ConfirmationPredicate::milestone_completed(B256::repeat_byte(1)).evaluate(&s));
        assert!(!ConfirmationPredicate::milestone_completed(B256::repeat_byte(2)).evaluate(&s));
        assert!(!ConfirmationPredicate::milestone_completed(B256::repeat_byte(3)).evaluate(&s));

        assert!(ConfirmationPredicate::milestone_removed(B256::repeat_byte(3)).evaluate(&s));
        assert!(!ConfirmationPredicate::milestone_removed(B256::repeat_byte(2)).evaluate(&s));
    }

    #[test]
    fn test_updated_after_is_strict() {
        let baseline = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let grant = B256::repeat_byte(0xaa);

        let same = snapshot(baseline, vec![]);
        assert!(!ConfirmationPredicate::grant_updated_after(grant, baseline).evaluate(&same));

        let later = snapshot(baseline + chrono::Duration::seconds(1), vec![]);
        assert!(ConfirmationPredicate::grant_updated_after(grant, baseline).evaluate(&later));
    }

    #[test]
    fn test_all() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let s = snapshot(t, vec![milestone(1, true), milestone(2, false)]);

        let both = ConfirmationPredicate::all(vec![
            ConfirmationPredicate::milestone_completed(B256::repeat_byte(1)),
            ConfirmationPredicate::milestone_completed(B256::repeat_byte(2)),
        ]);
        assert!(!both.evaluate(&s));
        assert!(ConfirmationPredicate::all(vec![]).evaluate(&s));
    }

    #[test]
    fn test_for_operation_by_kind() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let s = snapshot(t, vec![milestone(1, true)]);

        let revoke = Operation::revoke("r", 10, B256::repeat_byte(0xaa), B256::repeat_byte(1));
        assert!(!ConfirmationPredicate::for_operation(&revoke, t).evaluate(&s));

        let complete = Operation::complete(
            "c",
            10,
            B256::repeat_byte(0xaa),
            B256::repeat_byte(1),
            json!({}),
        );
        assert!(ConfirmationPredicate::for_operation(&complete, t).evaluate(&s));
    }
}
