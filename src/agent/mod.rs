//! Remote browser-agent jobs
//!
//! [`JobService`] is the seam the pipeline talks to; [`AgentClient`] is the
//! HTTP implementation and [`CompletionWaiter`] turns a submitted job into a
//! terminal snapshot.

use crate::error::Result;
use crate::types::{Job, JobId};
use async_trait::async_trait;

mod client;
pub mod instructions;
mod waiter;

pub use client::AgentClient;
pub use waiter::CompletionWaiter;

/// Submits jobs to the agent service and reads them back
#[async_trait]
pub trait JobService: Send + Sync {
    /// Create a job from natural-language instructions
    ///
    /// # Errors
    /// [`Error::Submission`](crate::Error::Submission) when the service rejects the job.
    async fn submit(&self, instructions: &str) -> Result<JobId>;

    /// Fetch the current snapshot of a job
    ///
    /// # Errors
    /// [`Error::Lookup`](crate::Error::Lookup) when the id is unknown or the detail is malformed.
    async fn fetch(&self, job_id: &JobId) -> Result<Job>;
}
