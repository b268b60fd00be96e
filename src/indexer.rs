//! Indexer client: transaction notifications and project snapshots

use crate::config::IndexerConfig;
use crate::constants::ATTESTATION_LISTENER_PATH;
use crate::error::NotifyError;
use crate::types::{ProjectSnapshot, SubmissionResult};
use alloy::primitives::{ChainId, B256};
use eyre::{Context, Result};
use futures::future::join_all;
use serde::Serialize;

/// Off-chain indexing service, as used by the orchestrator
pub trait Indexer: Send + Sync {
    /// Ask the indexer to prioritize ingesting `transaction_hash` on `chain_id`
    fn notify(
        &self,
        transaction_hash: B256,
        chain_id: ChainId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Latest indexed state of a project
    fn fetch_project_snapshot(
        &self,
        project_id: &str,
    ) -> impl std::future::Future<Output = Result<ProjectSnapshot>> + Send;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListenerRequest {
    transaction_hash: String,
    chain_id: ChainId,
}

/// HTTP client for the indexer API
pub struct IndexerClient {
    base_url: String,
    client: reqwest::Client,
}

impl IndexerClient {
    pub fn new(config: &IndexerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("grant-attest/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .connect_timeout(std::time::Duration::from_secs(10))
            .use_rustls_tls()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl Indexer for IndexerClient {
    async fn notify(&self, transaction_hash: B256, chain_id: ChainId) -> Result<()> {
        let request = ListenerRequest {
            transaction_hash: transaction_hash.to_string(),
            chain_id,
        };

        let resp = self
            .client
            .post(self.url(ATTESTATION_LISTENER_PATH))
            .json(&request)
            .send()
            .await
            .context("Failed to reach attestation listener")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            eyre::bail!("Attestation listener rejected notification: {} - {}", status, body);
        }

        Ok(())
    }

    async fn fetch_project_snapshot(&self, project_id: &str) -> Result<ProjectSnapshot> {
        let resp = self
            .client
            .get(self.url(&format!("projects/{}", project_id)))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to query indexer")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            eyre::bail!("Indexer query failed: {} - {}", status, body);
        }

        resp.json()
            .await
            .context("Failed to parse project snapshot")
    }
}

/// Best-effort notification of every transaction in a submission
pub struct IndexerNotifier<'a, I> {
    indexer: &'a I,
}

impl<'a, I: Indexer> IndexerNotifier<'a, I> {
    pub fn new(indexer: &'a I) -> Self {
        Self { indexer }
    }

    /// Notify the indexer of every hash (or uid, when no hash exists)
    ///
    /// Failures are logged and never returned. Returns how many notifications landed.
    pub async fn notify(&self, submission: &SubmissionResult) -> usize {
        let chain_id = submission.chain_id;
        let calls = submission.notify_ids().iter().map(|&id| async move {
            self.indexer
                .notify(id, chain_id)
                .await
                .map_err(|source| NotifyError {
                    transaction_hash: id,
                    chain_id,
                    source,
                })
        });

        let mut delivered = 0;
        for result in join_all(calls).await {
            match result {
                Ok(()) => delivered += 1,
                Err(err) => tracing::warn!(error = ?err, "indexer notification failed"),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockIndexer;

    #[test]
    fn test_listener_body() {
        let body = serde_json::to_value(ListenerRequest {
            transaction_hash: B256::repeat_byte(0x11).to_string(),
            chain_id: 10,
        })
        .unwrap();
        assert_eq!(body["chainId"], 10);
        assert_eq!(
            body["transactionHash"],
            "0x1111111111111111111111111111111111111111111111111111111111111111"
        );
    }

    #[test]
    fn test_client_urls() {
        let config = IndexerConfig::default().with_base_url("http://localhost:3000/");
        let client = IndexerClient::new(&config).unwrap();
        assert_eq!(
            client.url(ATTESTATION_LISTENER_PATH),
            "http://localhost:3000/attestation-listener"
        );
    }

    #[tokio::test]
    async fn test_notifies_every_hash() {
        let indexer = MockIndexer::new("p");
        let mut submission = SubmissionResult::new(137);
        submission.transaction_hashes = vec![B256::repeat_byte(1), B256::repeat_byte(2)];

        let delivered = IndexerNotifier::new(&indexer).notify(&submission).await;
        assert_eq!(delivered, 2);
        assert_eq!(
            indexer.notifications(),
            vec![(B256::repeat_byte(1), 137), (B256::repeat_byte(2), 137)]
        );
    }

    #[tokio::test]
    async fn test_uid_fallback() {
        let indexer = MockIndexer::new("p");
        let mut submission = SubmissionResult::new(10);
        submission.uids = vec![B256::repeat_byte(7)];

        IndexerNotifier::new(&indexer).notify(&submission).await;
        assert_eq!(indexer.notifications(), vec![(B256::repeat_byte(7), 10)]);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let indexer = MockIndexer::new("p").failing_notifications();
        let mut submission = SubmissionResult::new(10);
        submission.transaction_hashes = vec![B256::repeat_byte(1)];

        let delivered = IndexerNotifier::new(&indexer).notify(&submission).await;
        assert_eq!(delivered, 0);
    }
}
