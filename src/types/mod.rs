//! Data model shared by the orchestration components

pub mod batch;
pub mod operation;
pub mod progress;
pub mod report;
pub mod snapshot;

pub use batch::{BatchAction, ChainBatch};
pub use operation::{MilestoneRef, Operation, OperationKind};
pub use progress::{Phase, ProgressEvent};
pub use report::{BatchOutcome, BatchSuccess, RunReport, SubmissionResult};
pub use snapshot::{GrantSnapshot, MilestoneSnapshot, ProjectSnapshot};
