//! Build trigger and completion wait
//!
//! A build is submitted once and then only observed: first through its queue
//! item until an executor assigns a build number, then through the build
//! itself until it stops building.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::application::error_ext::ApiResultExt;
use crate::application::ApplicationResult;
use crate::config::PollConfig;
use crate::domain::{BuildParams, BuildResult, JobPath};
use crate::infrastructure::traits::{Clock, JenkinsApi};

/// Progress reported while waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitProgress {
    /// Waiting for an executor to pick up the queue item.
    Queued { queue_id: u64 },
    /// The queue item turned into a running build.
    Started { number: u64 },
}

/// How a wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The build stopped building. `result` is `None` when the server sent none.
    Completed {
        number: u64,
        result: Option<BuildResult>,
        duration: Duration,
    },
    /// The queue item was cancelled before a build number was assigned.
    Cancelled { queue_id: u64 },
    /// The configured wait timeout expired.
    TimedOut { queue_id: u64, number: Option<u64> },
}

/// Service for triggering builds and waiting on them.
pub struct BuildService {
    api: Arc<dyn JenkinsApi>,
    clock: Arc<dyn Clock>,
    poll: PollConfig,
}

impl BuildService {
    /// Create a new build service.
    pub fn new(api: Arc<dyn JenkinsApi>, clock: Arc<dyn Clock>, poll: PollConfig) -> Self {
        Self { api, clock, poll }
    }

    /// Submit a build and return its queue id without waiting for it to start.
    pub fn trigger(&self, job: &JobPath, params: &BuildParams) -> ApplicationResult<u64> {
        job.require_job()?;
        debug!("trigger: job={}, params={}", job, params.len());
        let queue_id = self
            .api
            .build_job(job, params)
            .with_operation(format!("trigger build of {job}"))?;
        info!("trigger: job={} queued as {}", job, queue_id);
        Ok(queue_id)
    }

    /// Block until the queued build finishes, is cancelled, or times out.
    ///
    /// `timeout` overrides the configured wait timeout. Without either, the
    /// wait is unbounded: a build may sit in the queue for as long as no
    /// executor is free.
    pub fn wait(
        &self,
        job: &JobPath,
        queue_id: u64,
        timeout: Option<Duration>,
        on_progress: &mut dyn FnMut(&WaitProgress),
    ) -> ApplicationResult<WaitOutcome> {
        let timeout = timeout.or_else(|| self.poll.wait_timeout());
        // A deadline past what `Instant` can represent means no deadline.
        let deadline = timeout.and_then(|t| self.clock.now().checked_add(t));
        debug!("wait: job={}, queue_id={}, timeout={:?}", job, queue_id, timeout);

        on_progress(&WaitProgress::Queued { queue_id });
        let number = loop {
            self.clock.sleep(self.poll.queue_interval());
            let item = self
                .api
                .get_queue_item(queue_id)
                .with_operation(format!("poll queue item {queue_id}"))?;

            if let Some(number) = item.build_number() {
                break number;
            }
            if item.cancelled {
                info!("wait: queue item {} was cancelled", queue_id);
                return Ok(WaitOutcome::Cancelled { queue_id });
            }
            if self.expired(deadline) {
                return Ok(WaitOutcome::TimedOut {
                    queue_id,
                    number: None,
                });
            }
            debug!("wait: queue item {} still queued: {:?}", queue_id, item.why);
        };

        on_progress(&WaitProgress::Started { number });
        loop {
            let build = self
                .api
                .get_build_info(job, number)
                .with_operation(format!("poll build {job} #{number}"))?;

            if !build.building {
                info!("wait: {} #{} finished with {:?}", job, number, build.result);
                return Ok(WaitOutcome::Completed {
                    number,
                    result: build.result,
                    duration: Duration::from_millis(build.duration_ms),
                });
            }
            if self.expired(deadline) {
                return Ok(WaitOutcome::TimedOut {
                    queue_id,
                    number: Some(number),
                });
            }
            self.clock.sleep(self.poll.build_interval());
        }
    }

    fn expired(&self, deadline: Option<Instant>) -> bool {
        deadline.is_some_and(|d| self.clock.now() >= d)
    }
}
