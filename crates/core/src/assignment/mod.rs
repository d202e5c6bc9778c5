//! Printer work-queue assignment.
//!
//! Binds a pending order to a printer exactly once, tracks queue position and
//! advisory timing, and releases the printer when the job finishes. All
//! coordination happens through row locks in the backing store; there is no
//! in-process shared state.

mod completion;
mod engine;
mod error;
mod estimate;
mod ledger;
mod selector;
mod types;

pub use engine::AssignmentEngine;
pub use error::AssignmentError;
pub use estimate::{estimated_duration, QueueEstimate};
pub use ledger::{WorkQueueStore, WorkQueueTx};
pub use selector::{select_auto, select_preferred};
pub use types::{
    Assignment, AutoAssignRequest, AutoAssignResult, Candidate, CompleteAssignmentRequest,
};
