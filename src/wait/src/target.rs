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

use std::time::Duration;

/// A snapshot of a remote object's observable state.
///
/// The describe boundary returns one of these per poll: the status label the
/// waiter matches against, plus whatever attributes the describe call
/// fetched, so a successful wait hands the refreshed object back to the
/// caller without another read.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct ObservedState {
    /// The object's current status label.
    pub status: String,

    /// The object's attributes as returned by the describe call.
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ObservedState {
    pub fn new<S: Into<String>>(
        status: S,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            status: status.into(),
            attributes,
        }
    }

    /// Builds an observed state from a describe response, reading the status
    /// from `status_field`.
    ///
    /// A missing or non-string status field maps to an empty status label,
    /// which never matches a success or failure set.
    pub fn from_response(
        response: serde_json::Map<String, serde_json::Value>,
        status_field: &str,
    ) -> Self {
        let status = response
            .get(status_field)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            attributes: response,
        }
    }
}

/// The conditions ending a convergence wait.
///
/// A wait ends successfully when the observed status is in the success set,
/// fails fast when it is in the failure set, and times out when neither
/// happens before the deadline. An empty failure set disables the fast-fail
/// path. When `missing_means_deleted` is set, a not-found describe result is
/// itself success; this is how delete operations wait for the object to be
/// gone.
#[derive(Clone, Debug)]
pub struct ConvergenceTarget {
    pub(crate) success_states: Vec<String>,
    pub(crate) failure_states: Vec<String>,
    pub(crate) poll_interval: Duration,
    pub(crate) deadline: Duration,
    pub(crate) missing_means_deleted: bool,
}

impl ConvergenceTarget {
    /// Creates a target with the given success states and the default
    /// polling configuration.
    pub fn new<I, S>(success_states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            success_states: success_states.into_iter().map(|s| s.into()).collect(),
            failure_states: Vec::new(),
            poll_interval: Duration::from_secs(5),
            deadline: Duration::from_secs(10 * 60),
            missing_means_deleted: false,
        }
    }

    /// Creates a target for a delete wait: success is the object no longer
    /// being visible.
    pub fn deleted() -> Self {
        let mut target = Self::new(Vec::<String>::new());
        target.missing_means_deleted = true;
        target
    }

    /// Sets the states that end the wait with an error.
    pub fn set_failure_states<I, S>(mut self, v: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure_states = v.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Sets the time between polls.
    pub fn set_poll_interval<V: Into<Duration>>(mut self, v: V) -> Self {
        self.poll_interval = v.into();
        self
    }

    /// Sets the overall deadline for the wait.
    pub fn set_deadline<V: Into<Duration>>(mut self, v: V) -> Self {
        self.deadline = v.into();
        self
    }

    /// Treat a not-found describe result as success.
    pub fn set_missing_means_deleted(mut self, v: bool) -> Self {
        self.missing_means_deleted = v;
        self
    }

    pub(crate) fn is_success(&self, status: &str) -> bool {
        self.success_states.iter().any(|s| s == status)
    }

    pub(crate) fn is_failure(&self, status: &str) -> bool {
        self.failure_states.iter().any(|s| s == status)
    }
}
