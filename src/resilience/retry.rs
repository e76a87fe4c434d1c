//! Retry logic.
//!
//! # Responsibilities
//! - Classify each attempt (data, not-modified, transient error)
//! - Drive a bounded number of attempts with a fixed delay between them
//! - Report exhaustion with the last observed error
//!
//! # State Transitions
//! ```text
//! Attempt → Success:          payload received
//! Attempt → SuccessNoChange:  304, consumes no retry budget
//! Attempt → Retry:            transient error, attempts < max
//! Attempt → Exhausted:        transient error, attempts == max
//! Retry   → Attempt:          after the fixed interval
//! ```

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::client::{FetchError, Fetched};
use crate::config::RetryConfig;
use crate::observability::metrics;

/// Retry bounds for one logical fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(1),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            interval: Duration::from_millis(config.interval_ms),
        }
    }
}

/// Phase of the retry state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Attempt,
    Success,
    SuccessNoChange,
    Retry,
    Exhausted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Success | Phase::SuccessNoChange | Phase::Exhausted)
    }
}

/// Classified result of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Data,
    NotModified,
    TransientError,
}

impl Outcome {
    pub fn of<T>(result: &Result<Fetched<T>, FetchError>) -> Self {
        match result {
            Ok(Fetched::Data(_)) => Outcome::Data,
            Ok(Fetched::NotModified) => Outcome::NotModified,
            Err(_) => Outcome::TransientError,
        }
    }
}

/// Transient bookkeeping for one logical fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    /// Attempts started so far.
    pub attempt: u32,
    /// Attempts that ended in a transient error.
    pub failures: u32,
    pub phase: Phase,
    policy: RetryPolicy,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            attempt: 0,
            failures: 0,
            phase: Phase::Attempt,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Mark the start of an attempt.
    pub fn begin_attempt(&mut self) {
        self.attempt += 1;
        self.phase = Phase::Attempt;
    }

    /// Apply the outcome of the running attempt and return the new phase.
    pub fn record(&mut self, outcome: Outcome) -> Phase {
        self.phase = transition(self.phase, outcome, self.attempt, &self.policy);
        if outcome == Outcome::TransientError {
            self.failures += 1;
        }
        self.phase
    }
}

/// Pure transition function of the retry state machine.
///
/// `attempt` is the 1-based number of the attempt that produced `outcome`.
/// Terminal phases absorb every outcome.
pub fn transition(phase: Phase, outcome: Outcome, attempt: u32, policy: &RetryPolicy) -> Phase {
    if phase.is_terminal() {
        return phase;
    }
    match outcome {
        Outcome::Data => Phase::Success,
        Outcome::NotModified => Phase::SuccessNoChange,
        Outcome::TransientError if attempt >= policy.max_attempts => Phase::Exhausted,
        Outcome::TransientError => Phase::Retry,
    }
}

/// Terminal failure after every attempt failed.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {last}")]
pub struct RetryError {
    pub attempts: u32,
    #[source]
    pub last: FetchError,
}

/// Runs fetch operations under a [`RetryPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Retrier {
    policy: RetryPolicy,
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `op` until it succeeds, reports not-modified, or attempts run out.
    ///
    /// `label` names the operation in logs and metrics.
    pub async fn run<T, F, Fut>(&self, label: &'static str, op: F) -> Result<Fetched<T>, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Fetched<T>, FetchError>>,
    {
        self.run_with_state(label, op).await.0
    }

    /// Like [`Retrier::run`], also returning the final state.
    pub async fn run_with_state<T, F, Fut>(
        &self,
        label: &'static str,
        mut op: F,
    ) -> (Result<Fetched<T>, RetryError>, RetryState)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Fetched<T>, FetchError>>,
    {
        let mut state = RetryState::new(self.policy);
        loop {
            state.begin_attempt();
            let result = op().await;

            match state.record(Outcome::of(&result)) {
                Phase::Success | Phase::SuccessNoChange => {
                    if state.failures > 0 {
                        tracing::info!(op = label, attempts = state.attempt, "Succeeded after retries");
                    }
                    return (result.map_err(|last| RetryError { attempts: state.attempt, last }), state);
                }
                Phase::Retry => {
                    if let Err(e) = &result {
                        tracing::warn!(
                            op = label,
                            attempt = state.attempt,
                            max_attempts = self.policy.max_attempts,
                            error = %e,
                            "Attempt failed, retrying"
                        );
                    }
                    metrics::record_retry(label);
                    tokio::time::sleep(self.policy.interval).await;
                }
                Phase::Exhausted => {
                    let attempts = state.attempt;
                    return match result {
                        Err(last) => {
                            tracing::error!(op = label, attempts, error = %last, "Over max retries, still failing");
                            (Err(RetryError { attempts, last }), state)
                        }
                        // record() only reaches Exhausted on an error.
                        Ok(fetched) => (Ok(fetched), state),
                    };
                }
                Phase::Attempt => {}
            }
        }
    }
}
