//! Confirmation polling against the indexer's eventually consistent read path

use crate::config::PollPolicy;
use crate::error::IndexTimeoutError;
use crate::indexer::Indexer;
use crate::predicate::ConfirmationPredicate;
use std::time::Duration;

/// Poll state of one batch. Never shared across batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollState {
    pub attempts_remaining: u32,
    pub interval: Duration,
}

impl PollState {
    pub fn new(policy: &PollPolicy) -> Self {
        Self {
            // At least one query always runs
            attempts_remaining: policy.max_attempts.max(1),
            interval: policy.interval,
        }
    }
}

/// How the predicate was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Indexer queries made, including the successful one
    pub attempts: u32,
}

/// Re-queries the project snapshot until a predicate holds or the budget runs out
pub struct ConfirmationPoller<'a, I> {
    indexer: &'a I,
    policy: PollPolicy,
}

impl<'a, I: Indexer> ConfirmationPoller<'a, I> {
    pub fn new(indexer: &'a I, policy: PollPolicy) -> Self {
        Self { indexer, policy }
    }

    /// Poll `project_id` until `predicate` holds
    ///
    /// The first query runs immediately. A query error costs one attempt, exactly like
    /// a snapshot that does not satisfy the predicate yet.
    pub async fn wait_for(
        &self,
        project_id: &str,
        predicate: &ConfirmationPredicate,
    ) -> Result<PollOutcome, IndexTimeoutError> {
        let mut state = PollState::new(&self.policy);
        let budget = state.attempts_remaining;
        let mut attempts = 0;

        loop {
            attempts += 1;
            state.attempts_remaining -= 1;

            match self.indexer.fetch_project_snapshot(project_id).await {
                Ok(snapshot) if predicate.evaluate(&snapshot) => {
                    tracing::info!(project_id, attempts, "change indexed");
                    return Ok(PollOutcome { attempts });
                }
                Ok(_) => {
                    tracing::debug!(project_id, "not indexed yet (attempt {}/{})", attempts, budget);
                }
                Err(err) => {
                    tracing::debug!(
                        project_id,
                        error = %err,
                        "indexer query failed (attempt {}/{})",
                        attempts,
                        budget
                    );
                }
            }

            if state.attempts_remaining == 0 {
                tracing::warn!(project_id, attempts, "confirmation polling exhausted");
                return Err(IndexTimeoutError {
                    project_id: project_id.to_string(),
                    attempts,
                });
            }

            tokio::time::sleep(state.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockIndexer;
    use alloy::primitives::B256;
    use tokio::time::Instant;
    use tokio_test::{assert_err, assert_ok};

    fn policy(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(max_attempts, Duration::from_millis(1500))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_success_has_no_delay() {
        let indexer = MockIndexer::new("p");
        let started = Instant::now();

        let outcome = assert_ok!(
            ConfirmationPoller::new(&indexer, policy(1000))
                .wait_for("p", &ConfirmationPredicate::from_fn(|_| true))
                .await
        );

        assert_eq!(outcome.attempts, 1);
        assert_eq!(indexer.fetch_count(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_is_exact() {
        let indexer = MockIndexer::new("p");
        let started = Instant::now();

        let err = assert_err!(
            ConfirmationPoller::new(&indexer, policy(5))
                .wait_for("p", &ConfirmationPredicate::from_fn(|_| false))
                .await
        );

        assert_eq!(err.attempts, 5);
        assert_eq!(indexer.fetch_count(), 5);
        // No sleep after the last attempt
        assert_eq!(started.elapsed(), Duration::from_millis(4 * 1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_still_polls_once() {
        let indexer = MockIndexer::new("p");

        let err = assert_err!(
            ConfirmationPoller::new(&indexer, policy(0))
                .wait_for("p", &ConfirmationPredicate::from_fn(|_| false))
                .await
        );
        assert_eq!(err.attempts, 1);
        assert_eq!(indexer.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_errors_consume_attempts() {
        let indexer = MockIndexer::new("p");
        indexer.fail_next_fetches(3);

        let outcome = assert_ok!(
            ConfirmationPoller::new(&indexer, policy(10))
                .wait_for("p", &ConfirmationPredicate::from_fn(|_| true))
                .await
        );
        assert_eq!(outcome.attempts, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_indexing_lag() {
        let indexer = MockIndexer::new("p").with_lag(2);
        let milestone = B256::repeat_byte(1);
        indexer.add_milestone(B256::repeat_byte(0xaa), 10, milestone);
        indexer.complete_milestone(milestone);

        let outcome = assert_ok!(
            ConfirmationPoller::new(&indexer, policy(10))
                .wait_for("p", &ConfirmationPredicate::milestone_completed(milestone))
                .await
        );
        assert_eq!(outcome.attempts, 3);
    }
}
