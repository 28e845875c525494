//! Dispatch-layer error model.

use thiserror::Error;

use crate::queue::QueueError;

/// Errors that abort a dispatch pass.
///
/// Per-item remote failures are handled inside the pass (logged, queue
/// mutated); only storage-layer faults propagate to the host.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Queue(#[from] QueueError),
}
