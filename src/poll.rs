//! Fixed-interval polling with a deadline
//!
//! Both waiting loops in the pipeline (job completion and history
//! resolution) are instances of [`poll_until`]: probe, test a predicate,
//! sleep a fixed interval, repeat until the predicate holds or the deadline
//! would be crossed.
//!
//! Time is read from [`tokio::time`], so tests that run on a paused clock
//! (`#[tokio::test(start_paused = true)]`) observe exact, instantaneous
//! timing.
//!
//! # Example
//!
//! ```no_run
//! use script_voice_relay::poll::{PollSchedule, poll_until};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), std::io::Error> {
//! let schedule = PollSchedule::new(Duration::from_secs(2), Duration::from_secs(30));
//! let polled = poll_until(
//!     &schedule,
//!     || async { Ok::<_, std::io::Error>(42) },
//!     |value| *value == 42,
//! )
//! .await?;
//! assert!(polled.satisfied);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Interval between probes and the ceiling on total waiting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSchedule {
    /// Sleep between consecutive probes
    pub interval: Duration,
    /// Total time after which no further probe is started
    pub deadline: Duration,
}

impl PollSchedule {
    /// Create a schedule
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }
}

/// Result of a completed polling loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Polled<T> {
    /// The last probed value
    pub value: T,
    /// Whether the predicate held for `value`
    pub satisfied: bool,
    /// Number of probes issued
    pub attempts: u32,
    /// Time from the first probe until the loop returned
    pub elapsed: Duration,
}

/// Probe until `predicate` holds or the deadline is reached
///
/// The first probe runs immediately. After an unsatisfied probe the loop
/// sleeps `interval`, unless that sleep would carry it past the deadline: in
/// that case it sleeps only up to the deadline and returns the last value
/// with `satisfied == false`. No probe ever starts after the deadline, so
/// `attempts * interval <= deadline + interval`.
///
/// A probe error stops the loop immediately and is returned as-is.
pub async fn poll_until<F, Fut, T, E, P>(
    schedule: &PollSchedule,
    mut probe: F,
    predicate: P,
) -> Result<Polled<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    let start = Instant::now();
    let mut attempts = 0;

    loop {
        let value = probe().await?;
        attempts += 1;

        if predicate(&value) {
            return Ok(Polled {
                value,
                satisfied: true,
                attempts,
                elapsed: start.elapsed(),
            });
        }

        let elapsed = start.elapsed();
        if elapsed + schedule.interval > schedule.deadline {
            tokio::time::sleep(schedule.deadline.saturating_sub(elapsed)).await;
            tracing::debug!(
                attempts,
                deadline_secs = schedule.deadline.as_secs_f64(),
                "poll deadline reached"
            );
            return Ok(Polled {
                value,
                satisfied: false,
                attempts,
                elapsed: start.elapsed(),
            });
        }

        tokio::time::sleep(schedule.interval).await;
    }
}
