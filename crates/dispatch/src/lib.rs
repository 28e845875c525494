//! `resultwire-dispatch` — the dispatch pipeline.
//!
//! A periodically-invoked worker drains a durable queue of pending
//! test-result submissions, gated by a quiet-period retry model, and ships
//! each build's result artifact to the remote quality-management service
//! through the narrow client contract in `resultwire-client`. Outcomes are
//! recorded in a per-build audit trail.
//!
//! Delivery is at-least-once: the queue is the correctness source of truth,
//! and repeated passes are safe because relevance and file-existence checks
//! make re-attempts idempotent from the remote side's point of view.

pub mod audit;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod queue;
pub mod retry;
pub mod source;
pub mod worker;

pub use audit::AuditEvent;
pub use config::{ConfigStore, EventPublisher, StaticConfig};
pub use dispatcher::{Dispatcher, PassSummary, TEST_RESULT_FILE};
pub use error::DispatchError;
pub use queue::{QueueError, QueueItem, ResultQueue};
pub use retry::RetryModel;
pub use source::{BuildSource, InMemoryBuildSource};
pub use worker::DispatchWorker;
