//! Scripted collaborators for tests and demos
//!
//! [`MockWallet`], [`MockAttester`] and [`MockIndexer`] stand in for a browser wallet,
//! the attestation SDK and the indexing service. The attester writes its effects into
//! the indexer, which only serves them after a configurable number of queries, the way
//! a real indexer lags behind the chain.

use crate::attest::{AttestationSdk, Submission};
use crate::indexer::Indexer;
use crate::progress::ProgressSink;
use crate::signer::{TransactionSigner, TxRequest};
use crate::types::{
    BatchAction, GrantSnapshot, MilestoneSnapshot, Operation, OperationKind, Phase,
    ProgressEvent, ProjectSnapshot,
};
use crate::wallet::WalletAdapter;
use alloy::primitives::{address, keccak256, Address, ChainId, TxHash, B256, U256};
use chrono::{DateTime, Utc};
use eyre::{bail, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

const MOCK_ADDRESS: Address = address!("0x00000000000000000000000000000000000a77e5");

/// Signer that "broadcasts" by hashing the calldata
#[derive(Debug, Clone)]
pub struct MockSigner {
    chain_id: ChainId,
    address: Address,
}

impl MockSigner {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            address: MOCK_ADDRESS,
        }
    }
}

impl TransactionSigner for MockSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    async fn sign_and_send(&self, tx: TxRequest) -> Result<TxHash> {
        let mut preimage = tx.to.to_vec();
        preimage.extend_from_slice(&self.chain_id.to_be_bytes());
        preimage.extend_from_slice(&tx.data);
        Ok(keccak256(preimage))
    }
}

#[derive(Debug, Default)]
struct WalletState {
    active: Option<ChainId>,
    declined: HashSet<ChainId>,
    unavailable: HashSet<ChainId>,
    disconnected: bool,
    switches: usize,
    in_flight: usize,
    max_in_flight: usize,
}

/// Wallet that switches instantly unless told to decline
#[derive(Debug, Default)]
pub struct MockWallet {
    state: Mutex<WalletState>,
}

impl MockWallet {
    /// Connected wallet sitting on `chain_id`
    pub fn on_chain(chain_id: ChainId) -> Self {
        let wallet = Self::default();
        wallet.state.lock().active = Some(chain_id);
        wallet
    }

    /// Reject switch requests to `chain_id`, as a user clicking "cancel" would
    pub fn declining(self, chain_id: ChainId) -> Self {
        self.state.lock().declined.insert(chain_id);
        self
    }

    /// Switch to `chain_id` fine, then fail to produce a signer there
    pub fn unavailable_on(self, chain_id: ChainId) -> Self {
        self.state.lock().unavailable.insert(chain_id);
        self
    }

    /// Drop the connection: no active chain, no signer
    pub fn disconnect(&self) {
        let mut state = self.state.lock();
        state.disconnected = true;
        state.active = None;
    }

    /// Completed network switches
    pub fn switch_count(&self) -> usize {
        self.state.lock().switches
    }

    /// Highest number of switches ever in progress at the same time
    pub fn max_concurrent_switches(&self) -> usize {
        self.state.lock().max_in_flight
    }
}

impl WalletAdapter for MockWallet {
    type Signer = MockSigner;

    fn active_chain(&self) -> Option<ChainId> {
        self.state.lock().active
    }

    fn is_connected(&self) -> bool {
        !self.state.lock().disconnected
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.disconnected {
                bail!("wallet not connected");
            }
            if state.declined.contains(&chain_id) {
                bail!("user rejected the request to switch to chain {}", chain_id);
            }
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }

        // Let anything else that wants the wallet run mid-switch
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        state.in_flight -= 1;
        state.switches += 1;
        state.active = Some(chain_id);
        Ok(())
    }

    async fn signer(&self, chain_id: ChainId) -> Result<MockSigner> {
        let state = self.state.lock();
        if state.disconnected {
            bail!("wallet not connected");
        }
        if state.unavailable.contains(&chain_id) {
            bail!("wallet client unavailable on chain {}", chain_id);
        }
        if state.active != Some(chain_id) {
            bail!("wallet is on chain {:?}, not {}", state.active, chain_id);
        }
        Ok(MockSigner::new(chain_id))
    }
}

#[derive(Debug, Clone)]
enum Effect {
    CompleteMilestone { uid: B256, data: Value },
    RemoveMilestone(B256),
    TouchGrant { uid: B256, at: DateTime<Utc> },
}

#[derive(Debug)]
struct PendingEffect {
    queries_left: u32,
    effect: Effect,
}

#[derive(Debug, Default)]
struct IndexerState {
    snapshot: ProjectSnapshot,
    lag: u32,
    pending: Vec<PendingEffect>,
    notifications: Vec<(B256, ChainId)>,
    failing_notifications: bool,
    failing_fetches: u32,
    fetches: u32,
}

impl IndexerState {
    fn grant_mut(&mut self, uid: B256, chain_id: ChainId) -> &mut GrantSnapshot {
        let grants = &mut self.snapshot.grants;
        let index = match grants.iter().position(|g| g.uid == uid) {
            Some(index) => index,
            None => {
                grants.push(GrantSnapshot {
                    uid,
                    chain_id,
                    updated_at: None,
                    milestones: Vec::new(),
                });
                grants.len() - 1
            }
        };
        &mut grants[index]
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::CompleteMilestone { uid, data } => {
                let milestone = self
                    .snapshot
                    .grants
                    .iter_mut()
                    .flat_map(|g| g.milestones.iter_mut())
                    .find(|m| m.uid == uid);
                if let Some(milestone) = milestone {
                    milestone.completed = Some(data);
                }
            }
            Effect::RemoveMilestone(uid) => {
                for grant in &mut self.snapshot.grants {
                    grant.milestones.retain(|m| m.uid != uid);
                }
            }
            Effect::TouchGrant { uid, at } => {
                if let Some(grant) = self.snapshot.grants.iter_mut().find(|g| g.uid == uid) {
                    grant.updated_at = Some(at);
                }
            }
        }
    }

    /// One query's worth of indexing progress
    fn advance(&mut self) {
        let mut ready = Vec::new();
        self.pending.retain_mut(|pending| {
            if pending.queries_left == 0 {
                ready.push(pending.effect.clone());
                false
            } else {
                pending.queries_left -= 1;
                true
            }
        });
        for effect in ready {
            self.apply(effect);
        }
    }

    fn queue(&mut self, effect: Effect) {
        let queries_left = self.lag;
        self.pending.push(PendingEffect {
            queries_left,
            effect,
        });
    }
}

/// In-memory indexer serving a single project
///
/// Clones share state, so the same instance can be handed to the attester and the
/// orchestrator.
#[derive(Debug, Clone)]
pub struct MockIndexer {
    state: Arc<Mutex<IndexerState>>,
}

impl MockIndexer {
    pub fn new(project_id: impl Into<String>) -> Self {
        let state = IndexerState {
            snapshot: ProjectSnapshot {
                uid: project_id.into(),
                grants: Vec::new(),
            },
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Writes become visible on the query after `queries` queries have seen them pending
    pub fn with_lag(self, queries: u32) -> Self {
        self.state.lock().lag = queries;
        self
    }

    /// Reject every notification
    pub fn failing_notifications(self) -> Self {
        self.state.lock().failing_notifications = true;
        self
    }

    /// Fail the next `count` snapshot queries
    pub fn fail_next_fetches(&self, count: u32) {
        self.state.lock().failing_fetches = count;
    }

    /// Snapshot queries received, failed ones included
    pub fn fetch_count(&self) -> u32 {
        self.state.lock().fetches
    }

    /// Accepted notifications, in arrival order
    pub fn notifications(&self) -> Vec<(B256, ChainId)> {
        self.state.lock().notifications.clone()
    }

    /// Index a grant right away
    pub fn add_grant(&self, grant: B256, chain_id: ChainId) {
        self.state.lock().grant_mut(grant, chain_id);
    }

    /// Index an open milestone under `grant` right away
    pub fn add_milestone(&self, grant: B256, chain_id: ChainId, milestone: B256) {
        self.state
            .lock()
            .grant_mut(grant, chain_id)
            .milestones
            .push(MilestoneSnapshot {
                uid: milestone,
                completed: None,
            });
    }

    /// Queue a completion of `milestone`
    pub fn complete_milestone(&self, milestone: B256) {
        self.complete_milestone_with(milestone, json!({}));
    }

    fn complete_milestone_with(&self, milestone: B256, data: Value) {
        // Completion data must be non-null to count as completed
        let data = if data.is_null() { json!({}) } else { data };
        self.state.lock().queue(Effect::CompleteMilestone {
            uid: milestone,
            data,
        });
    }

    /// Queue removal of `milestone`
    pub fn remove_milestone(&self, milestone: B256) {
        self.state.lock().queue(Effect::RemoveMilestone(milestone));
    }

    /// Queue an `updated_at` bump of `grant`
    pub fn touch_grant(&self, grant: B256, at: DateTime<Utc>) {
        self.state.lock().queue(Effect::TouchGrant { uid: grant, at });
    }

    /// What the indexer serves right now, without counting as a query
    pub fn current_snapshot(&self) -> ProjectSnapshot {
        self.state.lock().snapshot.clone()
    }
}

impl Indexer for MockIndexer {
    async fn notify(&self, transaction_hash: B256, chain_id: ChainId) -> Result<()> {
        let mut state = self.state.lock();
        if state.failing_notifications {
            bail!("attestation listener returned 503");
        }
        state.notifications.push((transaction_hash, chain_id));
        Ok(())
    }

    async fn fetch_project_snapshot(&self, project_id: &str) -> Result<ProjectSnapshot> {
        let mut state = self.state.lock();
        state.fetches += 1;

        if state.failing_fetches > 0 {
            state.failing_fetches -= 1;
            bail!("indexer returned 502");
        }
        if state.snapshot.uid != project_id {
            bail!("project {} not found", project_id);
        }

        state.advance();
        Ok(state.snapshot.clone())
    }
}

#[derive(Debug, Default)]
struct AttesterCounters {
    attempts: AtomicUsize,
    transactions: AtomicUsize,
    batch_calls: AtomicUsize,
    nonce: AtomicU64,
}

/// Attestation SDK that records submissions and writes their effects to a [`MockIndexer`]
#[derive(Debug, Clone)]
pub struct MockAttester {
    indexer: MockIndexer,
    supports_batch: bool,
    with_hashes: bool,
    failing: HashSet<ChainId>,
    failing_operations: HashSet<String>,
    counters: Arc<AttesterCounters>,
}

impl MockAttester {
    pub fn new(indexer: MockIndexer) -> Self {
        Self {
            indexer,
            supports_batch: true,
            with_hashes: true,
            failing: HashSet::new(),
            failing_operations: HashSet::new(),
            counters: Arc::default(),
        }
    }

    /// SDK without multi-target calls
    pub fn without_batch_support(mut self) -> Self {
        self.supports_batch = false;
        self
    }

    /// Submissions succeed but report no transaction hash
    pub fn without_hashes(mut self) -> Self {
        self.with_hashes = false;
        self
    }

    /// Every submission on `chain_id` fails
    pub fn failing_on(mut self, chain_id: ChainId) -> Self {
        self.failing.insert(chain_id);
        self
    }

    /// Submissions of the operation with this id fail
    pub fn failing_operation(mut self, id: impl Into<String>) -> Self {
        self.failing_operations.insert(id.into());
        self
    }

    /// Submission calls made, failed ones included
    pub fn attempt_count(&self) -> usize {
        self.counters.attempts.load(Ordering::SeqCst)
    }

    /// Transactions broadcast
    pub fn transaction_count(&self) -> usize {
        self.counters.transactions.load(Ordering::SeqCst)
    }

    /// Multi-target transactions broadcast
    pub fn batch_call_count(&self) -> usize {
        self.counters.batch_calls.load(Ordering::SeqCst)
    }

    fn begin(&self, chain_id: ChainId) -> Result<()> {
        self.counters.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&chain_id) {
            bail!("execution reverted on chain {}", chain_id);
        }
        self.counters.transactions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn next_hash(&self) -> TxHash {
        let nonce = self.counters.nonce.fetch_add(1, Ordering::SeqCst) + 1;
        B256::from(U256::from(nonce))
    }

    fn record(&self, operation: &Operation) {
        match operation.kind() {
            OperationKind::Create | OperationKind::Update => {
                // The indexer stamps the parent grant when anything lands under it
                let at = Utc::now() + chrono::Duration::seconds(1);
                self.indexer.touch_grant(operation.ref_uid(), at);
            }
            OperationKind::Complete { milestone } => self
                .indexer
                .complete_milestone_with(milestone, operation.payload().clone()),
            OperationKind::Revoke { target } => self.indexer.remove_milestone(target),
        }
    }
}

impl<S: TransactionSigner> AttestationSdk<S> for MockAttester {
    fn supports_batch(&self) -> bool {
        self.supports_batch
    }

    async fn submit(&self, signer: &S, operation: &Operation) -> Result<Submission> {
        if signer.chain_id() != operation.target_chain_id() {
            bail!(
                "signer for chain {} cannot submit to chain {}",
                signer.chain_id(),
                operation.target_chain_id()
            );
        }
        if self.failing_operations.contains(operation.id()) {
            self.counters.attempts.fetch_add(1, Ordering::SeqCst);
            bail!("execution reverted for {}", operation.id());
        }
        self.begin(signer.chain_id())?;
        self.record(operation);

        if self.with_hashes {
            Ok(Submission::from_hash(self.next_hash()))
        } else {
            Ok(Submission::default())
        }
    }

    async fn submit_batch(
        &self,
        signer: &S,
        chain_id: ChainId,
        action: BatchAction,
        targets: &[B256],
        payload: &Value,
    ) -> Result<Vec<TxHash>> {
        if signer.chain_id() != chain_id {
            bail!(
                "signer for chain {} cannot submit to chain {}",
                signer.chain_id(),
                chain_id
            );
        }
        self.begin(chain_id)?;
        self.counters.batch_calls.fetch_add(1, Ordering::SeqCst);

        for &target in targets {
            match action {
                BatchAction::Complete => self.indexer.complete_milestone_with(target, payload.clone()),
                BatchAction::Revoke => self.indexer.remove_milestone(target),
            }
        }

        if self.with_hashes {
            Ok(vec![self.next_hash()])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Progress sink that keeps every event
#[derive(Debug, Default)]
pub struct ProgressRecorder {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressRecorder {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    /// Phases emitted for `chain_id`, in order
    pub fn phases_for(&self, chain_id: ChainId) -> Vec<Phase> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.chain_id == chain_id)
            .map(|e| e.phase)
            .collect()
    }

    pub fn last_for(&self, chain_id: ChainId) -> Option<ProgressEvent> {
        self.events
            .lock()
            .iter()
            .rev()
            .find(|e| e.chain_id == chain_id)
            .cloned()
    }
}

impl ProgressSink for ProgressRecorder {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().push(event);
    }
}
