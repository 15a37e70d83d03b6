//! Convergence waiter.
//!
//! Lifecycle changes on real infrastructure take seconds to minutes, and the
//! control plane is eventually consistent: a query straight after a command
//! may still report the old state. The waiter polls the [`StateOracle`]
//! until the resource reports the target state or the deadline passes.
//!
//! ```text
//!            ┌──────────────────────────┐
//!            │         Polling          │◄─────┐
//!            └────────────┬─────────────┘      │ not yet / transient error
//!                         │                    │
//!        ┌────────────────┼────────────────┬───┘
//!        ▼                ▼                ▼
//!   ┌──────────┐    ┌──────────┐    ┌───────────┐
//!   │Converged │    │ TimedOut │    │ Cancelled │
//!   └──────────┘    └──────────┘    └───────────┘
//! ```
//!
//! Transient query failures are retried until the same deadline. The caller's
//! [`CancellationToken`] is checked at every iteration boundary and raced
//! against each sleep.

use std::time::Duration;

use powercycle_core::{LifecycleState, ResourceId};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::compute::ComputeApi;
use crate::error::{ControlError, Result};
use crate::oracle::StateOracle;

/// Floor for the poll interval so a zero interval cannot spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Cap on the deadline offset; larger waits are treated as unbounded.
const MAX_DEADLINE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// How often and how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Interval between polls.
    pub poll_interval: Duration,
    /// Upper bound on the wait.
    pub max_wait: Duration,
}

impl WaitPolicy {
    /// Create a new wait policy.
    #[must_use]
    pub const fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            poll_interval,
            max_wait,
        }
    }
}

/// Terminal result of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The resource was observed in the target state.
    Converged {
        /// The observed state (always the target).
        state: LifecycleState,
        /// Number of state queries made.
        polls: u32,
        /// Time spent waiting.
        elapsed: Duration,
    },
    /// The deadline passed first.
    TimedOut {
        /// The last successfully observed state.
        last_observed: Option<LifecycleState>,
        /// Number of state queries made.
        polls: u32,
        /// Time spent waiting.
        elapsed: Duration,
    },
    /// The caller cancelled the wait.
    Cancelled {
        /// The last successfully observed state.
        last_observed: Option<LifecycleState>,
        /// Number of state queries made.
        polls: u32,
    },
}

/// Polls until a resource reaches a target state.
pub struct ConvergenceWaiter<C: ComputeApi> {
    oracle: StateOracle<C>,
}

impl<C: ComputeApi> ConvergenceWaiter<C> {
    /// Create a waiter over the given oracle.
    #[must_use]
    pub fn new(oracle: StateOracle<C>) -> Self {
        Self { oracle }
    }

    /// Block until `resource_id` reports `target`, the policy's deadline
    /// passes, or `cancel` fires.
    ///
    /// At least one state check is always made, so a zero `max_wait` still
    /// reports `Converged` when the resource is already there.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ResourceNotFound` if the resource disappears
    /// mid-wait. Transient query failures never surface as errors.
    pub async fn wait_for(
        &self,
        resource_id: &ResourceId,
        target: LifecycleState,
        policy: &WaitPolicy,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome> {
        let started = Instant::now();
        let deadline = started
            .checked_add(policy.max_wait)
            .unwrap_or(started + MAX_DEADLINE);
        let interval = policy.poll_interval.max(MIN_POLL_INTERVAL);
        let mut last_observed = None;
        let mut polls = 0u32;

        loop {
            if cancel.is_cancelled() {
                tracing::warn!(resource_id = %resource_id, target = %target, polls, "Wait cancelled");
                return Ok(WaitOutcome::Cancelled {
                    last_observed,
                    polls,
                });
            }

            polls += 1;
            match self.oracle.current_state(resource_id).await {
                Ok(state) if state == target => {
                    let elapsed = started.elapsed();
                    tracing::info!(
                        resource_id = %resource_id,
                        state = %state,
                        polls,
                        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                        "Resource converged"
                    );
                    return Ok(WaitOutcome::Converged {
                        state,
                        polls,
                        elapsed,
                    });
                }
                Ok(state) => last_observed = Some(state),
                Err(ControlError::TransientQuery { message, .. }) => {
                    tracing::warn!(
                        resource_id = %resource_id,
                        error = %message,
                        "State query failed while waiting, will retry"
                    );
                }
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(
                    resource_id = %resource_id,
                    target = %target,
                    last_observed = ?last_observed,
                    polls,
                    "Timed out waiting for resource"
                );
                return Ok(WaitOutcome::TimedOut {
                    last_observed,
                    polls,
                    elapsed: now - started,
                });
            }

            let pause = interval.min(deadline - now);
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(pause) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mock::{MockCompute, Observation};
    use powercycle_core::LifecycleState::{Running, Stopped, Stopping};

    fn resource() -> ResourceId {
        ResourceId::new("i-0abc").unwrap()
    }

    fn waiter(compute: &Arc<MockCompute>) -> ConvergenceWaiter<MockCompute> {
        ConvergenceWaiter::new(StateOracle::new(Arc::clone(compute)))
    }

    fn policy(poll_secs: u64, max_secs: u64) -> WaitPolicy {
        WaitPolicy::new(Duration::from_secs(poll_secs), Duration::from_secs(max_secs))
    }

    #[tokio::test(start_paused = true)]
    async fn converges_after_intermediate_states() {
        let compute = Arc::new(MockCompute::new().with_resource(resource(), Running));
        compute.queue(&resource(), [Stopping, Stopping, Stopped]);

        let outcome = waiter(&compute)
            .wait_for(&resource(), Stopped, &policy(5, 60), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            WaitOutcome::Converged {
                state: Stopped,
                polls: 3,
                elapsed: Duration::from_secs(10),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_max_wait_checks_once() {
        let compute = Arc::new(MockCompute::new().with_resource(resource(), Stopping));

        let outcome = waiter(&compute)
            .wait_for(&resource(), Stopped, &policy(5, 0), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            WaitOutcome::TimedOut {
                last_observed: Some(Stopping),
                polls: 1,
                ..
            }
        ));
        assert_eq!(compute.describe_calls(&resource()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_max_wait_already_converged() {
        let compute = Arc::new(MockCompute::new().with_resource(resource(), Stopped));

        let outcome = waiter(&compute)
            .wait_for(&resource(), Stopped, &policy(5, 0), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(outcome, WaitOutcome::Converged { polls: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_at_deadline() {
        let compute = Arc::new(MockCompute::new().with_resource(resource(), Stopping));

        let outcome = waiter(&compute)
            .wait_for(&resource(), Stopped, &policy(4, 10), &CancellationToken::new())
            .await
            .unwrap();

        // Polls at t=0, 4, 8 and a final clamped poll at t=10.
        assert_eq!(
            outcome,
            WaitOutcome::TimedOut {
                last_observed: Some(Stopping),
                polls: 4,
                elapsed: Duration::from_secs(10),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let compute = Arc::new(MockCompute::new().with_resource(resource(), Stopping));
        compute.queue(
            &resource(),
            [
                Observation::Unavailable,
                Observation::Unavailable,
                Observation::State(Stopped),
            ],
        );

        let outcome = waiter(&compute)
            .wait_for(&resource(), Stopped, &policy(1, 60), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(outcome, WaitOutcome::Converged { polls: 3, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_until_deadline_time_out() {
        let compute = Arc::new(MockCompute::new().with_resource(resource(), Stopping));
        compute.queue(&resource(), [Observation::Unavailable; 16]);

        let outcome = waiter(&compute)
            .wait_for(&resource(), Stopped, &policy(1, 3), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            WaitOutcome::TimedOut {
                last_observed: None,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_resource_is_fatal() {
        let compute = Arc::new(MockCompute::new());

        let result = waiter(&compute)
            .wait_for(&resource(), Stopped, &policy(1, 60), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ControlError::ResourceNotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_first_poll() {
        let compute = Arc::new(MockCompute::new().with_resource(resource(), Stopping));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = waiter(&compute)
            .wait_for(&resource(), Stopped, &policy(1, 60), &cancel)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            WaitOutcome::Cancelled {
                last_observed: None,
                polls: 0,
            }
        );
        assert_eq!(compute.describe_calls(&resource()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_sleep() {
        let compute = Arc::new(MockCompute::new().with_resource(resource(), Stopping));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let outcome = waiter(&compute)
            .wait_for(&resource(), Stopped, &policy(60, 600), &cancel)
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            WaitOutcome::Cancelled {
                last_observed: Some(Stopping),
                polls: 1,
            }
        ));
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_max_wait_does_not_overflow() {
        let compute = Arc::new(MockCompute::new().with_resource(resource(), Stopped));

        let outcome = waiter(&compute)
            .wait_for(
                &resource(),
                Stopped,
                &policy(1, u64::MAX),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, WaitOutcome::Converged { polls: 1, .. }));
    }
}
