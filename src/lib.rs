//! Grant attestation SDK for Rust
//!
//! Submit-then-confirm orchestration for grant and milestone attestations that live on
//! several EVM chains at once.
//!
//! # Features
//!
//! - Group operations into per-chain batches, current chain first
//! - Switch the wallet network once per batch, never concurrently
//! - Submit one transaction per operation, or one multi-target call for merged milestones
//! - Notify the indexer and poll until it reflects the change
//! - Per-chain progress events and a per-chain run report
//!
//! # Example
//!
//! ```rust,ignore
//! use grant_attest::{
//!     AttestationOrchestrator, EasAttester, IndexerClient, LocalWallet, Operation, RunRequest,
//!     SdkConfig, TracingProgress, WalletHandle,
//! };
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let config = SdkConfig::from_env()?;
//!     let wallet = LocalWallet::from_private_key("0x...", config.networks.clone())?;
//!     let orchestrator = AttestationOrchestrator::new(
//!         WalletHandle::new(wallet),
//!         EasAttester::new(config.networks.clone()),
//!         IndexerClient::new(&config.indexer)?,
//!         TracingProgress,
//!     )
//!     .with_poll_policy(config.poll);
//!
//!     let report = orchestrator
//!         .run(RunRequest::new("my-project", operations, chrono::Utc::now()))
//!         .await;
//!     println!("indexed on {:?}", report.indexed_chains());
//!     Ok(())
//! }
//! ```

pub mod attest;
pub mod config;
pub mod constants;
pub mod contracts;
pub mod error;
pub mod grouper;
pub mod indexer;
pub mod orchestrator;
pub mod poller;
pub mod predicate;
pub mod progress;
pub mod signer;
pub mod types;
pub mod wallet;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export main types for convenience
pub use attest::{AttestationSdk, AttestationSubmitter, EasAttester, Submission};
pub use config::{IndexerConfig, NetworkConfig, PollPolicy, SchemaSet, SdkConfig};
pub use error::{eyre, BatchError, Context, Report, Result};
pub use grouper::{group_by_chain, ChainGroup, ChainScoped};
pub use indexer::{Indexer, IndexerClient, IndexerNotifier};
pub use orchestrator::{AttestationOrchestrator, RunRequest};
pub use poller::{ConfirmationPoller, PollOutcome, PollState};
pub use predicate::{default_predicates, ConfirmationPredicate, PredicateFactory};
pub use progress::{ChannelProgress, ProgressSink, TracingProgress};
pub use signer::{LocalSigner, TransactionSigner, TxRequest};
pub use types::{
    BatchAction, BatchOutcome, BatchSuccess, ChainBatch, MilestoneRef, Operation, OperationKind,
    Phase, ProgressEvent, ProjectSnapshot, RunReport, SubmissionResult,
};
pub use wallet::{LocalWallet, WalletAdapter, WalletHandle, WalletLease};
