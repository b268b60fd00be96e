//! Submit-then-confirm orchestration across chains
//!
//! A run plans its operations into per-chain batches and processes them strictly one
//! after another: switch network, resolve signer, submit, notify the indexer, poll for
//! confirmation. A batch failure is reported and the run moves on; losing the wallet
//! stops the run.

use crate::attest::{AttestationSdk, AttestationSubmitter};
use crate::config::PollPolicy;
use crate::error::BatchError;
use crate::grouper::group_by_chain;
use crate::indexer::{Indexer, IndexerNotifier};
use crate::poller::ConfirmationPoller;
use crate::predicate::{default_predicates, ConfirmationPredicate, PredicateFactory};
use crate::progress::{BatchProgress, ProgressSink};
use crate::types::{
    BatchOutcome, BatchSuccess, ChainBatch, MilestoneRef, Operation, Phase, RunReport,
};
use crate::wallet::{WalletAdapter, WalletHandle};
use alloy::primitives::ChainId;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Operations to record, plus how to recognize them in the indexer
#[derive(Clone)]
pub struct RunRequest {
    /// Project whose snapshot reflects the operations
    pub project_id: String,
    pub operations: Vec<Operation>,
    pub predicates: PredicateFactory,
}

impl RunRequest {
    /// Request confirmed with the default per-kind predicates against `baseline`
    pub fn new(
        project_id: impl Into<String>,
        operations: Vec<Operation>,
        baseline: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            operations,
            predicates: default_predicates(baseline),
        }
    }

    /// Use custom predicates
    pub fn with_predicates(
        mut self,
        predicates: impl Fn(&Operation) -> ConfirmationPredicate + Send + Sync + 'static,
    ) -> Self {
        self.predicates = std::sync::Arc::new(predicates);
        self
    }

    fn batch_predicate(&self, batch: &ChainBatch) -> ConfirmationPredicate {
        ConfirmationPredicate::all(batch.operations.iter().map(|op| (self.predicates)(op)).collect())
    }
}

/// Drives runs against one wallet, attestation SDK, indexer and progress sink
pub struct AttestationOrchestrator<W, A, I, P> {
    wallet: WalletHandle<W>,
    attester: A,
    indexer: I,
    progress: P,
    poll: PollPolicy,
}

impl<W, A, I, P> AttestationOrchestrator<W, A, I, P>
where
    W: WalletAdapter,
    A: AttestationSdk<W::Signer>,
    I: Indexer,
    P: ProgressSink,
{
    pub fn new(wallet: WalletHandle<W>, attester: A, indexer: I, progress: P) -> Self {
        Self {
            wallet,
            attester,
            indexer,
            progress,
            poll: PollPolicy::default(),
        }
    }

    /// Set the confirmation poll budget
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn wallet(&self) -> &WalletHandle<W> {
        &self.wallet
    }

    /// Process every batch of the request and report each chain's outcome
    pub async fn run(&self, mut request: RunRequest) -> RunReport {
        let operations = std::mem::take(&mut request.operations);
        let batches = ChainBatch::plan(operations, self.wallet.active_chain());
        let mut report = RunReport::default();

        if batches.is_empty() {
            tracing::debug!(project_id = %request.project_id, "nothing to submit");
            return report;
        }

        tracing::info!(
            project_id = %request.project_id,
            batches = batches.len(),
            chains = ?batches.iter().map(|b| b.chain_id).collect::<Vec<_>>(),
            "starting attestation run"
        );

        let mut remaining = batches.into_iter();
        while let Some(batch) = remaining.next() {
            let progress = BatchProgress::new(&self.progress, batch.chain_id, batch.len());
            let predicate = request.batch_predicate(&batch);

            let result = self
                .process_batch(&batch, &request.project_id, &predicate, &progress)
                .await;

            match &result {
                Ok(_) => progress.phase(Phase::Indexed),
                Err(err) => {
                    tracing::warn!(chain_id = batch.chain_id, error = ?err, "batch failed");
                    progress.failed(err.to_string());
                }
            }

            let fatal = matches!(&result, Err(err) if err.is_run_fatal());
            report.outcomes.push(BatchOutcome {
                chain_id: batch.chain_id,
                batch_size: batch.len(),
                result,
            });

            if fatal {
                report.aborted_at = Some(batch.chain_id);
                report.skipped = remaining.by_ref().map(|b| b.chain_id).collect();
                tracing::error!(
                    chain_id = batch.chain_id,
                    skipped = ?report.skipped,
                    "wallet unavailable, aborting run"
                );
                break;
            }
        }

        report
    }

    /// Complete one logical milestone on every grant+chain it is merged into
    ///
    /// One multi-target submission per chain.
    pub async fn complete_merged_milestone(
        &self,
        project_id: impl Into<String>,
        refs: Vec<MilestoneRef>,
        payload: Value,
    ) -> RunReport {
        let operations = merged_operations(refs, self.wallet.active_chain(), |r| {
            r.complete(payload.clone())
        });
        self.run(RunRequest::new(project_id, operations, Utc::now()))
            .await
    }

    /// Revoke one logical milestone on every grant+chain it is merged into
    pub async fn revoke_merged_milestone(
        &self,
        project_id: impl Into<String>,
        refs: Vec<MilestoneRef>,
    ) -> RunReport {
        let operations = merged_operations(refs, self.wallet.active_chain(), |r| r.revoke());
        self.run(RunRequest::new(project_id, operations, Utc::now()))
            .await
    }

    async fn process_batch(
        &self,
        batch: &ChainBatch,
        project_id: &str,
        predicate: &ConfirmationPredicate,
        progress: &BatchProgress<'_, P>,
    ) -> Result<BatchSuccess, BatchError> {
        progress.phase(Phase::Preparing);

        // The lease covers switch, signer and submission
        let submission = {
            let lease = self.wallet.lease().await;
            progress.phase(Phase::Pending);

            lease.ensure_connected(batch.chain_id)?;
            lease.ensure_chain(batch.chain_id).await?;
            let signer = lease.signer(batch.chain_id).await?;

            AttestationSubmitter::new(&self.attester)
                .submit(&signer, batch)
                .await
        };
        let submission = match submission {
            Ok(submission) => submission,
            Err(err) => {
                // Whatever reached the chain still gets indexed
                if !err.submitted.notify_ids().is_empty() {
                    IndexerNotifier::new(&self.indexer).notify(&err.submitted).await;
                }
                return Err(err.into());
            }
        };
        progress.phase(Phase::Indexing);

        let notified = IndexerNotifier::new(&self.indexer).notify(&submission).await;

        let outcome = ConfirmationPoller::new(&self.indexer, self.poll)
            .wait_for(project_id, predicate)
            .await?;

        Ok(BatchSuccess {
            submission,
            notified,
            poll_attempts: outcome.attempts,
        })
    }
}

/// Expand merged milestone references into operations, grouped chain by chain
fn merged_operations(
    refs: Vec<MilestoneRef>,
    active_chain: Option<ChainId>,
    to_operation: impl Fn(&MilestoneRef) -> Operation,
) -> Vec<Operation> {
    group_by_chain(refs, active_chain)
        .into_iter()
        .flat_map(|group| {
            tracing::debug!(
                chain_id = group.chain_id,
                grants = group.items.len(),
                "merged milestone chain group"
            );
            group.items
        })
        .map(|r| to_operation(&r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockAttester, MockIndexer, MockWallet, ProgressRecorder};
    use alloy::primitives::B256;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    type TestOrchestrator =
        AttestationOrchestrator<MockWallet, MockAttester, MockIndexer, Arc<ProgressRecorder>>;

    const GRANT: B256 = B256::repeat_byte(0xaa);

    fn orchestrator(
        wallet: MockWallet,
        attester: MockAttester,
        indexer: MockIndexer,
    ) -> (TestOrchestrator, Arc<ProgressRecorder>) {
        let recorder = Arc::new(ProgressRecorder::default());
        let orchestrator = AttestationOrchestrator::new(
            WalletHandle::new(wallet),
            attester,
            indexer,
            Arc::clone(&recorder),
        )
        .with_poll_policy(PollPolicy::new(20, Duration::from_millis(1500)));
        (orchestrator, recorder)
    }

    fn milestone(n: u8) -> B256 {
        B256::repeat_byte(n)
    }

    fn complete(n: u8, chain: ChainId) -> Operation {
        Operation::complete(format!("m{n}"), chain, GRANT, milestone(n), json!({ "reason": "done" }))
    }

    fn indexer_with(milestones: &[(u8, ChainId)]) -> MockIndexer {
        let indexer = MockIndexer::new("project");
        for &(n, chain) in milestones {
            indexer.add_milestone(GRANT, chain, milestone(n));
        }
        indexer
    }

    fn request(operations: Vec<Operation>) -> RunRequest {
        RunRequest::new("project", operations, Utc::now())
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_run_touches_nothing() {
        let indexer = indexer_with(&[]);
        let (orchestrator, recorder) =
            orchestrator(MockWallet::on_chain(10), MockAttester::new(indexer.clone()), indexer.clone());

        let report = orchestrator.run(request(vec![])).await;

        assert!(report.outcomes.is_empty());
        assert!(recorder.events().is_empty());
        assert_eq!(indexer.fetch_count(), 0);
        assert_eq!(orchestrator.wallet().wallet().switch_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_declined_switch_scenario() {
        let indexer = indexer_with(&[(1, 10), (2, 137)]);
        let (orchestrator, recorder) = orchestrator(
            MockWallet::on_chain(10).declining(137),
            MockAttester::new(indexer.clone()),
            indexer,
        );

        let report = orchestrator
            .run(request(vec![complete(2, 137), complete(1, 10)]))
            .await;

        let order: Vec<_> = report.outcomes.iter().map(|o| o.chain_id).collect();
        assert_eq!(order, vec![10, 137]);

        assert_eq!(
            recorder.phases_for(10),
            vec![Phase::Preparing, Phase::Pending, Phase::Indexing, Phase::Indexed]
        );
        assert_eq!(
            recorder.phases_for(137),
            vec![Phase::Preparing, Phase::Pending, Phase::Failed]
        );
        assert_eq!(
            recorder.last_for(137).unwrap().message.as_deref(),
            Some("chain switch declined")
        );

        assert_eq!(report.indexed_chains(), vec![10]);
        assert_eq!(report.failed_chains(), vec![137]);
        assert!(matches!(
            report.outcome(137).unwrap().result,
            Err(BatchError::ChainSwitch(_))
        ));
        assert!(report.aborted_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_middle_batch_failure_is_isolated() {
        let indexer = indexer_with(&[(1, 10), (2, 137), (3, 42161)]);
        let (orchestrator, recorder) = orchestrator(
            MockWallet::on_chain(10),
            MockAttester::new(indexer.clone()).failing_on(137),
            indexer,
        );

        let report = orchestrator
            .run(request(vec![complete(1, 10), complete(2, 137), complete(3, 42161)]))
            .await;

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.indexed_chains(), vec![10, 42161]);
        assert!(matches!(
            report.outcome(137).unwrap().result,
            Err(BatchError::Submit(_))
        ));
        assert_eq!(recorder.last_for(42161).unwrap().phase, Phase::Indexed);
        assert!(!report.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wallet_loss_aborts_remaining_batches() {
        let indexer = indexer_with(&[(1, 10), (2, 137), (3, 42161)]);
        let wallet = MockWallet::on_chain(10).unavailable_on(137);
        let (orchestrator, recorder) =
            orchestrator(wallet, MockAttester::new(indexer.clone()), indexer);

        let report = orchestrator
            .run(request(vec![complete(1, 10), complete(2, 137), complete(3, 42161)]))
            .await;

        assert_eq!(report.indexed_chains(), vec![10]);
        assert_eq!(report.aborted_at, Some(137));
        assert_eq!(report.skipped, vec![42161]);
        assert!(recorder.phases_for(42161).is_empty());
        assert_eq!(recorder.last_for(137).unwrap().phase, Phase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_batch_and_run_continues() {
        // Milestone 9 is never added, so its completion never shows up
        let indexer = indexer_with(&[(1, 137)]);
        let (orchestrator, recorder) = orchestrator(
            MockWallet::on_chain(10),
            MockAttester::new(indexer.clone()),
            indexer.clone(),
        );

        let report = orchestrator
            .run(request(vec![complete(9, 10), complete(1, 137)]))
            .await;

        match &report.outcome(10).unwrap().result {
            Err(BatchError::IndexTimeout(err)) => assert_eq!(err.attempts, 20),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(recorder.phases_for(10).last(), Some(&Phase::Failed));
        assert_eq!(report.indexed_chains(), vec![137]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_failure_does_not_fail_batch() {
        let indexer = indexer_with(&[(1, 10)]).failing_notifications();
        let (orchestrator, _) = orchestrator(
            MockWallet::on_chain(10),
            MockAttester::new(indexer.clone()),
            indexer,
        );

        let report = orchestrator.run(request(vec![complete(1, 10)])).await;

        let success = report.outcome(10).unwrap().result.as_ref().unwrap();
        assert_eq!(success.notified, 0);
        assert!(report.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batched_and_single_reach_same_end_state() {
        let single_indexer = indexer_with(&[(1, 10)]);
        let single_attester = MockAttester::new(single_indexer.clone());
        let (single, _) = orchestrator(
            MockWallet::on_chain(10),
            single_attester.clone(),
            single_indexer.clone(),
        );
        let single_report = single
            .complete_merged_milestone(
                "project",
                vec![MilestoneRef::new(GRANT, milestone(1), 10)],
                json!({ "reason": "done" }),
            )
            .await;

        let merged_indexer = MockIndexer::new("project");
        let grants = [B256::repeat_byte(0xa1), B256::repeat_byte(0xa2), B256::repeat_byte(0xa3)];
        let refs: Vec<_> = grants
            .iter()
            .enumerate()
            .map(|(i, grant)| {
                let uid = milestone(i as u8 + 1);
                merged_indexer.add_milestone(*grant, 10, uid);
                MilestoneRef::new(*grant, uid, 10)
            })
            .collect();
        let merged_attester = MockAttester::new(merged_indexer.clone());
        let (merged, _) = orchestrator(
            MockWallet::on_chain(10),
            merged_attester.clone(),
            merged_indexer.clone(),
        );
        let merged_report = merged
            .complete_merged_milestone("project", refs.clone(), json!({ "reason": "done" }))
            .await;

        assert!(single_report.is_success());
        assert!(merged_report.is_success());
        assert_eq!(single_attester.transaction_count(), 1);
        assert_eq!(merged_attester.transaction_count(), 1);
        assert_eq!(merged_attester.batch_call_count(), 1);

        let snapshot = merged_indexer.current_snapshot();
        for r in &refs {
            assert!(snapshot.milestone(r.milestone_uid).unwrap().is_completed());
        }
        assert!(single_indexer
            .current_snapshot()
            .milestone(milestone(1))
            .unwrap()
            .is_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_merged_revoke_one_call_per_chain() {
        let indexer = MockIndexer::new("project");
        let refs = vec![
            MilestoneRef::new(B256::repeat_byte(0xa1), milestone(1), 137),
            MilestoneRef::new(B256::repeat_byte(0xa2), milestone(2), 10),
            MilestoneRef::new(B256::repeat_byte(0xa3), milestone(3), 137),
        ];
        for r in &refs {
            indexer.add_milestone(r.grant_uid, r.chain_id, r.milestone_uid);
        }
        let attester = MockAttester::new(indexer.clone());
        let (orchestrator, recorder) =
            orchestrator(MockWallet::on_chain(137), attester.clone(), indexer.clone());

        let report = orchestrator.revoke_merged_milestone("project", refs).await;

        assert!(report.is_success());
        let order: Vec<_> = report.outcomes.iter().map(|o| o.chain_id).collect();
        assert_eq!(order, vec![137, 10]);
        // Chain 137 gets one multi-revoke, chain 10 a plain revoke
        assert_eq!(attester.transaction_count(), 2);
        assert_eq!(attester.batch_call_count(), 1);
        assert_eq!(recorder.last_for(137).unwrap().batch_size, 2);
        assert!(indexer.current_snapshot().milestone(milestone(1)).is_none());
        assert!(indexer.current_snapshot().milestone(milestone(2)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_confirmed_against_baseline() {
        let indexer = MockIndexer::new("project").with_lag(3);
        indexer.add_grant(GRANT, 42220);
        let (orchestrator, _) = orchestrator(
            MockWallet::on_chain(10),
            MockAttester::new(indexer.clone()),
            indexer.clone(),
        );

        let update = Operation::update("grant", 42220, GRANT, json!({ "title": "New title" }));
        let report = orchestrator.run(request(vec![update])).await;

        let success = report.outcome(42220).unwrap().result.as_ref().unwrap();
        assert_eq!(success.poll_attempts, 4);
        assert_eq!(orchestrator.wallet().active_chain(), Some(42220));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_sharing_a_wallet_never_switch_concurrently() {
        let indexer = indexer_with(&[(1, 10), (2, 137), (3, 42161), (4, 8453)]);
        let handle = WalletHandle::new(MockWallet::on_chain(10));

        let first = AttestationOrchestrator::new(
            handle.clone(),
            MockAttester::new(indexer.clone()),
            indexer.clone(),
            ProgressRecorder::default(),
        )
        .with_poll_policy(PollPolicy::new(5, Duration::from_millis(10)));
        let second = AttestationOrchestrator::new(
            handle.clone(),
            MockAttester::new(indexer.clone()),
            indexer.clone(),
            ProgressRecorder::default(),
        )
        .with_poll_policy(PollPolicy::new(5, Duration::from_millis(10)));

        let (a, b) = tokio::join!(
            first.run(request(vec![complete(1, 10), complete(2, 137)])),
            second.run(request(vec![complete(3, 42161), complete(4, 8453)])),
        );

        assert!(a.is_success());
        assert!(b.is_success());
        assert_eq!(handle.wallet().max_concurrent_switches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_completions_keep_their_payloads() {
        let indexer = indexer_with(&[(1, 10), (2, 10)]);
        let attester = MockAttester::new(indexer.clone());
        let (orchestrator, _) =
            orchestrator(MockWallet::on_chain(10), attester.clone(), indexer.clone());

        let first = Operation::complete("m1", 10, GRANT, milestone(1), json!({ "reason": "first" }));
        let second =
            Operation::complete("m2", 10, GRANT, milestone(2), json!({ "reason": "second" }));
        let report = orchestrator.run(request(vec![first, second])).await;

        assert!(report.is_success());
        assert_eq!(attester.batch_call_count(), 0);
        assert_eq!(attester.transaction_count(), 2);

        let snapshot = indexer.current_snapshot();
        assert_eq!(
            snapshot.milestone(milestone(1)).unwrap().completed,
            Some(json!({ "reason": "first" }))
        );
        assert_eq!(
            snapshot.milestone(milestone(2)).unwrap().completed,
            Some(json!({ "reason": "second" }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnected_wallet_aborts_run() {
        let indexer = indexer_with(&[(1, 10), (2, 137)]);
        let wallet = MockWallet::on_chain(10);
        wallet.disconnect();
        let (orchestrator, recorder) =
            orchestrator(wallet, MockAttester::new(indexer.clone()), indexer);

        let report = orchestrator
            .run(request(vec![complete(1, 10), complete(2, 137)]))
            .await;

        assert_eq!(report.outcomes.len(), 1);
        assert!(matches!(
            report.outcome(10).unwrap().result,
            Err(BatchError::WalletUnavailable(_))
        ));
        assert_eq!(report.aborted_at, Some(10));
        assert_eq!(report.skipped, vec![137]);
        assert!(recorder.phases_for(137).is_empty());
        assert_eq!(orchestrator.wallet().wallet().switch_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_before_failure_is_still_notified() {
        let indexer = indexer_with(&[(1, 10), (2, 10)]);
        let attester = MockAttester::new(indexer.clone()).failing_operation("m2");
        let (orchestrator, _) =
            orchestrator(MockWallet::on_chain(10), attester.clone(), indexer.clone());

        let report = orchestrator
            .run(request(vec![complete(1, 10), complete(2, 10)]))
            .await;

        match &report.outcome(10).unwrap().result {
            Err(BatchError::Submit(err)) => {
                assert_eq!(err.operation, "m2");
                assert_eq!(err.submitted.transaction_hashes.len(), 1);
                assert_eq!(
                    indexer.notifications(),
                    vec![(err.submitted.transaction_hashes[0], 10)]
                );
            }
            other => panic!("expected submit failure, got {:?}", other),
        }
    }
}
