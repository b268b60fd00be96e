//! Progress sinks for per-chain lifecycle events

use crate::constants::chain_name;
use crate::types::{Phase, ProgressEvent};
use alloy::primitives::ChainId;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Receives progress events. Emission never fails from the orchestrator's view.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<T: ProgressSink + ?Sized> ProgressSink for Arc<T> {
    fn emit(&self, event: ProgressEvent) {
        (**self).emit(event)
    }
}

impl<T: ProgressSink + ?Sized> ProgressSink for &T {
    fn emit(&self, event: ProgressEvent) {
        (**self).emit(event)
    }
}

/// Fan out to two sinks
impl<A: ProgressSink, B: ProgressSink> ProgressSink for (A, B) {
    fn emit(&self, event: ProgressEvent) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }
}

/// Logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, event: ProgressEvent) {
        let network = chain_name(event.chain_id);
        match event.phase {
            Phase::Failed => tracing::warn!(
                chain_id = event.chain_id,
                network,
                batch_size = event.batch_size,
                message = event.message.as_deref().unwrap_or_default(),
                "batch failed"
            ),
            phase => tracing::info!(
                chain_id = event.chain_id,
                network,
                batch_size = event.batch_size,
                %phase,
                "batch progress"
            ),
        }
    }
}

/// Forwards events to a channel, e.g. a UI store. A closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgress {
    fn emit(&self, event: ProgressEvent) {
        // The view that started the run may be gone
        let _ = self.tx.send(event);
    }
}

/// Progress emitter bound to one chain batch
pub(crate) struct BatchProgress<'a, P: ?Sized> {
    sink: &'a P,
    chain_id: ChainId,
    batch_size: usize,
}

impl<'a, P: ProgressSink + ?Sized> BatchProgress<'a, P> {
    pub(crate) fn new(sink: &'a P, chain_id: ChainId, batch_size: usize) -> Self {
        Self {
            sink,
            chain_id,
            batch_size,
        }
    }

    pub(crate) fn phase(&self, phase: Phase) {
        self.sink
            .emit(ProgressEvent::new(phase, self.chain_id, self.batch_size));
    }

    pub(crate) fn failed(&self, message: impl Into<String>) {
        self.sink.emit(
            ProgressEvent::new(Phase::Failed, self.chain_id, self.batch_size).with_message(message),
        );
    }
}
