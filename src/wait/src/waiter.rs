// Copyright 2025 Stratus Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::target::{ConvergenceTarget, ObservedState};
use stratus_rpc::Result;
use stratus_rpc::error::Error;
use tokio::time::Instant;

/// The successful outcome of a convergence wait.
#[derive(Debug, PartialEq)]
pub enum FinalState {
    /// The object's status reached the success set. Carries the last
    /// observed attributes.
    Reached(ObservedState),
    /// The object is gone, and the target treats that as success.
    Deleted,
}

impl FinalState {
    /// The observed state, if the object still exists.
    pub fn observed(&self) -> Option<&ObservedState> {
        match self {
            Self::Reached(state) => Some(state),
            Self::Deleted => None,
        }
    }
}

/// Polls `describe` until the object converges on the target.
///
/// Each iteration calls `describe` once and matches the result:
/// - a not-found error is success when the target is a delete wait, and
///   otherwise counts as "not yet visible" and polling continues;
/// - any other describe error propagates immediately. Transient faults are
///   not retried at this layer; callers compose retries into `describe`
///   itself via [retry_loop][stratus_rpc::retry_loop::retry_loop];
/// - a status in the failure set stops the wait with a
///   [target-state error][Error::is_target_state_failed] carrying the
///   observed status. No further polls happen, even with time left in the
///   deadline;
/// - a status in the success set stops the wait and returns the refreshed
///   state.
///
/// Between polls the waiter sleeps for the target's poll interval. A sleep
/// that would end past the deadline is not started: the wait returns an
/// [exhausted error][Error::is_exhausted] carrying the last observed status
/// and the target set.
pub async fn wait_for<D>(describe: D, target: &ConvergenceTarget) -> Result<FinalState>
where
    D: AsyncFn() -> Result<ObservedState>,
{
    let deadline = Instant::now() + target.deadline;
    let mut poll_count = 0_u32;
    let mut last_observed = None;
    loop {
        poll_count += 1;
        match describe().await {
            Err(e) if e.is_not_found() => {
                if target.missing_means_deleted {
                    return Ok(FinalState::Deleted);
                }
                tracing::debug!(poll_count, "object not visible yet, polling again");
                last_observed = None;
            }
            Err(e) => return Err(e),
            Ok(state) => {
                tracing::debug!(poll_count, status = %state.status, "observed remote state");
                if target.is_failure(&state.status) {
                    return Err(Error::target_state(TargetStateFailed::new(&state.status)));
                }
                if target.is_success(&state.status) {
                    return Ok(FinalState::Reached(state));
                }
                last_observed = Some(state.status);
            }
        }
        if Instant::now() + target.poll_interval > deadline {
            return Err(Error::exhausted(ConvergenceTimeout::new(
                last_observed,
                target.success_states.clone(),
                poll_count,
            )));
        }
        tokio::time::sleep(target.poll_interval).await;
    }
}

/// Indicates that a convergence wait observed a recognized failure state.
#[derive(Debug)]
pub struct TargetStateFailed {
    observed: String,
}

impl TargetStateFailed {
    pub fn new<S: Into<String>>(observed: S) -> Self {
        Self {
            observed: observed.into(),
        }
    }

    /// The failure state that ended the wait.
    pub fn observed(&self) -> &str {
        &self.observed
    }
}

impl std::fmt::Display for TargetStateFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to reach the target status, the current status is {}",
            self.observed
        )
    }
}

impl std::error::Error for TargetStateFailed {}

/// Indicates that a convergence wait ran out of time.
#[derive(Debug)]
pub struct ConvergenceTimeout {
    last_observed: Option<String>,
    target: Vec<String>,
    poll_count: u32,
}

impl ConvergenceTimeout {
    pub fn new(last_observed: Option<String>, target: Vec<String>, poll_count: u32) -> Self {
        Self {
            last_observed,
            target,
            poll_count,
        }
    }

    /// The last status observed before the deadline, if the object was
    /// visible at all.
    pub fn last_observed(&self) -> Option<&str> {
        self.last_observed.as_deref()
    }

    /// The number of describe calls made.
    pub fn poll_count(&self) -> u32 {
        self.poll_count
    }
}

impl std::fmt::Display for ConvergenceTimeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "timed out waiting for the status to become one of {:?} after {} polls, the last observed status is {:?}",
            self.target, self.poll_count, self.last_observed
        )
    }
}

impl std::error::Error for ConvergenceTimeout {}
