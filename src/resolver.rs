//! History-diff artifact resolution
//!
//! The agent job does not report which history item it produced. The
//! resolver recovers it by comparing a listing taken before the job was
//! submitted with listings taken after it completed:
//!
//! 1. [`ArtifactResolver::snapshot`] captures `before` ahead of submission.
//! 2. [`ArtifactResolver::resolve`] lists again every `history_interval`
//!    until some id absent from `before` shows up, and picks the newest such
//!    id ([`ResolutionMethod::Diff`]).
//! 3. If the ceiling passes with nothing new, one more listing is taken and
//!    its newest id is used ([`ResolutionMethod::FallbackLatest`]). That id
//!    may belong to an older generation.
//! 4. An empty final listing resolves to nothing ([`ResolutionMethod::Unresolved`]).
//!
//! `before` is only ever captured once, before submission. Re-capturing it
//! after completion would hide the item the job just produced.

use crate::config::PollingConfig;
use crate::poll::{PollSchedule, poll_until};
use crate::speech::HistoryLister;
use crate::types::{HistorySnapshot, ResolvedArtifact};
use std::convert::Infallible;
use std::sync::Arc;

/// The newest id in `after` that `before` does not contain
pub fn resolve_snapshots(before: &HistorySnapshot, after: &HistorySnapshot) -> Option<String> {
    after.new_since(before).first().map(|id| id.to_string())
}

/// Matches a completed job to the history item it generated
#[derive(Clone)]
pub struct ArtifactResolver {
    history: Arc<dyn HistoryLister>,
    schedule: PollSchedule,
}

impl ArtifactResolver {
    /// Create a resolver polling `history` on the given schedule
    pub fn new(history: Arc<dyn HistoryLister>, schedule: PollSchedule) -> Self {
        Self { history, schedule }
    }

    /// Create a resolver using the history settings of the polling configuration
    pub fn from_config(history: Arc<dyn HistoryLister>, config: &PollingConfig) -> Self {
        Self::new(
            history,
            PollSchedule::new(config.history_interval, config.history_ceiling),
        )
    }

    /// Capture the `before` listing; call this before submitting the job
    pub async fn snapshot(&self) -> HistorySnapshot {
        let before = self.history.list_ids().await;
        tracing::debug!(items = before.len(), "captured history before submission");
        before
    }

    /// Identify the artifact produced since `before` was captured
    pub async fn resolve(&self, before: &HistorySnapshot) -> ResolvedArtifact {
        let history = &self.history;
        let polled = poll_until(
            &self.schedule,
            move || async move { Ok::<_, Infallible>(history.list_ids().await) },
            |after| !after.new_since(before).is_empty(),
        )
        .await;

        let polled = match polled {
            Ok(polled) => polled,
            Err(never) => match never {},
        };

        if polled.satisfied {
            if let Some(id) = resolve_snapshots(before, &polled.value) {
                tracing::info!(
                    history_item_id = %id,
                    attempts = polled.attempts,
                    elapsed_secs = polled.elapsed.as_secs_f64(),
                    "resolved generated audio by history diff"
                );
                return ResolvedArtifact::diff(id);
            }
        }

        let latest = self.history.list_ids().await;
        match latest.latest() {
            Some(id) => {
                tracing::warn!(
                    history_item_id = %id,
                    waited_secs = polled.elapsed.as_secs_f64(),
                    "no new history item appeared, falling back to the most recent one"
                );
                ResolvedArtifact::fallback_latest(id)
            }
            None => {
                tracing::warn!(
                    waited_secs = polled.elapsed.as_secs_f64(),
                    "history is empty, no audio could be resolved"
                );
                ResolvedArtifact::unresolved()
            }
        }
    }
}
