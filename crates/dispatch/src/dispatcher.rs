//! The dispatch pass: drains the durable queue against the remote service.
//!
//! One pass works the queue front to back. A remote connection is obtained
//! and validated at most once per pass (and re-obtained after a submission
//! failure); the retry model gates the whole pass before any network call.
//! Items reach a terminal state only by removal; transient failures keep
//! them queued for a later pass.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use resultwire_client::{ClientError, ClientFactory, QualityClient};
use resultwire_core::{BuildHandle, ServerConfig};

use crate::audit;
use crate::config::{ConfigStore, EventPublisher};
use crate::error::DispatchError;
use crate::queue::{QueueItem, ResultQueue};
use crate::retry::RetryModel;
use crate::source::BuildSource;

/// File name of the test-result artifact, relative to the build root dir.
pub const TEST_RESULT_FILE: &str = "test_results.xml";

/// Outcome counters for one pass, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Items submitted and removed.
    pub submitted: usize,
    /// Items removed because their project/build no longer exists.
    pub removed_stale: usize,
    /// Items removed because the remote no longer wants them.
    pub removed_irrelevant: usize,
    /// Items removed because the result file disappeared.
    pub removed_missing_file: usize,
    /// Failed submission attempts recorded against items this pass.
    pub failed_attempts: usize,
    /// The pass stopped early because the service reported overload.
    pub deferred: bool,
}

type Session = (ServerConfig, Arc<dyn QualityClient>);

/// Drains the pending-submission queue against the remote service.
pub struct Dispatcher {
    queue: ResultQueue,
    retry: Arc<Mutex<RetryModel>>,
    clients: Arc<dyn ClientFactory>,
    builds: Arc<dyn BuildSource>,
    config: Arc<dyn ConfigStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl Dispatcher {
    pub fn new(
        queue: ResultQueue,
        retry: Arc<Mutex<RetryModel>>,
        clients: Arc<dyn ClientFactory>,
        builds: Arc<dyn BuildSource>,
        config: Arc<dyn ConfigStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            queue,
            retry,
            clients,
            builds,
            config,
            publisher,
        }
    }

    /// Run one dispatch pass.
    ///
    /// Returns early (without touching any item) on an empty queue, an
    /// active quiet period, incomplete configuration, suspended publishing,
    /// or a failed connection validation. Only storage faults are errors.
    pub async fn run_pass(&self) -> Result<PassSummary, DispatchError> {
        let mut summary = PassSummary::default();

        if self.queue.peek_first().await?.is_none() {
            return Ok(summary);
        }

        if self.retry.lock().await.is_quiet_period() {
            info!("pending test results, but in quiet period; deferring to next pass");
            return Ok(summary);
        }

        let mut session: Option<Session> = None;

        while let Some(item) = self.queue.peek_first().await? {
            let (config, client) = match session.clone() {
                Some(active) => active,
                None => match self.connect().await {
                    Some(fresh) => {
                        session = Some(fresh.clone());
                        fresh
                    }
                    None => return Ok(summary),
                },
            };

            if !self.builds.has_project(&item.build.project) {
                warn!(
                    project = %item.build.project,
                    "project no longer exists, pending test results can't be submitted"
                );
                self.queue.remove().await?;
                summary.removed_stale += 1;
                continue;
            }

            let Some(build) = self.builds.find_build(&item.build) else {
                warn!(
                    build = %item.build,
                    "build no longer exists, pending test results can't be submitted"
                );
                self.queue.remove().await?;
                summary.removed_stale += 1;
                continue;
            };

            let relevant = match client
                .is_result_relevant(self.config.identity(), build.job_name())
                .await
            {
                Ok(relevant) => relevant,
                Err(err) => {
                    warn!(build = %item.build, error = %err, "relevance check failed");
                    self.note_failed_attempt(&item, &mut session, &mut summary)
                        .await?;
                    continue;
                }
            };

            if !relevant {
                info!(build = %item.build, "test result not needed");
                self.queue.remove().await?;
                summary.removed_irrelevant += 1;
                continue;
            }

            let result_file = build.root_dir.join(TEST_RESULT_FILE);
            match client.submit_result(&result_file, false).await {
                Ok(id) => {
                    info!(
                        build = %item.build,
                        submission_id = id,
                        "successfully pushed test results"
                    );
                    self.audit(&build, &config, Some(id), false);
                    self.queue.remove().await?;
                    summary.submitted += 1;
                }
                Err(ClientError::FileNotFound(_)) => {
                    warn!(
                        build = %item.build,
                        "result file no longer exists, failed to push test results"
                    );
                    self.queue.remove().await?;
                    summary.removed_missing_file += 1;
                }
                Err(ClientError::TemporarilyUnavailable) => {
                    warn!(build = %item.build, "server temporarily unavailable, will try later");
                    self.audit(&build, &config, None, true);
                    summary.deferred = true;
                    break;
                }
                Err(err) => {
                    warn!(build = %item.build, error = %err, "failed to submit test results");
                    self.audit(&build, &config, None, false);
                    self.note_failed_attempt(&item, &mut session, &mut summary)
                        .await?;
                }
            }
        }

        Ok(summary)
    }

    /// Obtain and validate a connection for this pass.
    ///
    /// `None` means the pass must abort without touching any items.
    async fn connect(&self) -> Option<Session> {
        let config = self.config.server_config();
        if !config.is_complete() {
            warn!("pending test results, but no server location is configured");
            return None;
        }
        if self.publisher.is_suspended() {
            warn!("pending test results, but event publishing is suspended");
            return None;
        }

        info!(location = %config.location, "pending test results, connecting to the server");
        let client = self.clients.create(&config);
        match client.validate_configuration().await {
            Ok(()) => {
                self.retry.lock().await.success();
                Some((config, client))
            }
            Err(err) => {
                match &err {
                    ClientError::SpaceNotFound(_) => {
                        warn!(error = %err, "invalid shared space, pending test results can't be submitted");
                    }
                    ClientError::LoginFailed(_) => {
                        warn!(error = %err, "login failed, pending test results can't be submitted");
                    }
                    _ => {
                        warn!(error = %err, "problem communicating with the server, pending test results can't be submitted");
                    }
                }
                self.retry.lock().await.failure();
                None
            }
        }
    }

    /// Record a failed attempt and drop the cached connection so the next
    /// item (or pass) re-validates before retrying.
    async fn note_failed_attempt(
        &self,
        item: &QueueItem,
        session: &mut Option<Session>,
        summary: &mut PassSummary,
    ) -> Result<(), DispatchError> {
        if !self.queue.mark_failed(item).await? {
            warn!(
                build = %item.build,
                "maximum number of attempts reached, operation will not be re-attempted for this build"
            );
        }
        summary.failed_attempts += 1;
        *session = None;
        Ok(())
    }

    /// Audit writes are best-effort; a failure must not affect queue state.
    fn audit(
        &self,
        build: &BuildHandle,
        config: &ServerConfig,
        id: Option<i64>,
        temporarily_unavailable: bool,
    ) {
        if let Err(err) = audit::record(build, config, id, temporarily_unavailable) {
            warn!(build = %build.build, error = %err, "failed to append audit entry");
        }
    }
}
