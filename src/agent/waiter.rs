use super::JobService;
use crate::config::PollingConfig;
use crate::error::{Error, Result};
use crate::poll::{PollSchedule, poll_until};
use crate::types::{Job, JobId};

/// Polls a job until it reaches a terminal status or the deadline passes
///
/// Finished, failed and stopped all end the wait; the caller decides what a
/// non-finished terminal status means. Running out of time is an error.
#[derive(Clone, Copy, Debug)]
pub struct CompletionWaiter {
    schedule: PollSchedule,
}

impl CompletionWaiter {
    /// Create a waiter with an explicit interval and deadline
    pub fn new(interval: std::time::Duration, deadline: std::time::Duration) -> Self {
        Self {
            schedule: PollSchedule::new(interval, deadline),
        }
    }

    /// Create a waiter from the job settings of the polling configuration
    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.job_interval, config.job_deadline)
    }

    /// Wait for `job_id` to become terminal and return its final snapshot
    ///
    /// # Errors
    /// - [`Error::Timeout`] when the deadline passes with the job still active
    /// - any error from [`JobService::fetch`], which ends the wait immediately
    pub async fn wait(&self, jobs: &dyn JobService, job_id: &JobId) -> Result<Job> {
        let polled = poll_until(
            &self.schedule,
            move || async move {
                let job = jobs.fetch(job_id).await?;
                tracing::debug!(job_id = %job_id, status = %job.status, "polled agent task");
                Ok::<_, Error>(job)
            },
            |job| job.status.is_terminal(),
        )
        .await?;

        if !polled.satisfied {
            tracing::error!(
                job_id = %job_id,
                attempts = polled.attempts,
                last_status = %polled.value.status,
                "agent task did not finish before the deadline"
            );
            return Err(Error::Timeout {
                job_id: job_id.to_string(),
                waited: polled.elapsed,
            });
        }

        tracing::info!(
            job_id = %job_id,
            status = %polled.value.status,
            attempts = polled.attempts,
            elapsed_secs = polled.elapsed.as_secs_f64(),
            "agent task reached a terminal state"
        );
        Ok(polled.value)
    }
}
