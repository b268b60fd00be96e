//! Complete one milestone merged into grants on two chains
//!
//! Run with: cargo run --example merged_milestone --features mock
//!
//! Uses the scripted wallet, attester and indexer from `grant_attest::mock`, with the
//! indexer lagging a few queries behind every submission.

use std::time::Duration;

use alloy::primitives::B256;
use grant_attest::mock::{MockAttester, MockIndexer, MockWallet};
use grant_attest::{
    AttestationOrchestrator, ChannelProgress, MilestoneRef, PollPolicy, TracingProgress,
    WalletHandle,
};
use serde_json::json;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let project = "demo-project";
    let indexer = MockIndexer::new(project).with_lag(2);

    // Same milestone, merged across three grants on Optimism and Arbitrum
    let refs = vec![
        MilestoneRef::new(B256::repeat_byte(0xa1), B256::repeat_byte(0x01), 10),
        MilestoneRef::new(B256::repeat_byte(0xa2), B256::repeat_byte(0x02), 42161),
        MilestoneRef::new(B256::repeat_byte(0xa3), B256::repeat_byte(0x03), 42161),
    ];
    for r in &refs {
        indexer.add_milestone(r.grant_uid, r.chain_id, r.milestone_uid);
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let orchestrator = AttestationOrchestrator::new(
        WalletHandle::new(MockWallet::on_chain(42161)),
        MockAttester::new(indexer.clone()),
        indexer.clone(),
        (TracingProgress, ChannelProgress::new(tx)),
    )
    .with_poll_policy(PollPolicy::new(10, Duration::from_millis(200)));

    let report = orchestrator
        .complete_merged_milestone(project, refs, json!({ "reason": "Shipped v1" }))
        .await;

    println!("\n=== PROGRESS ===");
    while let Ok(event) = rx.try_recv() {
        match &event.message {
            Some(message) => println!(
                "chain {:>6}  {:<9} ({} ops) {}",
                event.chain_id, event.phase, event.batch_size, message
            ),
            None => println!(
                "chain {:>6}  {:<9} ({} ops)",
                event.chain_id, event.phase, event.batch_size
            ),
        }
    }

    println!("\n=== REPORT ===");
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(success) => println!(
                "chain {:>6}: indexed after {} queries, {} tx",
                outcome.chain_id,
                success.poll_attempts,
                success.submission.transaction_hashes.len()
            ),
            Err(err) => println!("chain {:>6}: failed: {}", outcome.chain_id, err),
        }
    }
    println!("Success: {}", report.is_success());

    Ok(())
}
