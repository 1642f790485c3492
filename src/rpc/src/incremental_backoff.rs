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

//! Linear backoff with a fixed increment.
//!
//! The vendor API recovers from flow control quickly, and its SDKs
//! conventionally wait `initial + increment * n` between attempts rather
//! than doubling. The delay is deterministic, which also makes budget
//! arithmetic easy: with a deadline `D` and initial delay `W`, the number
//! of attempts is bounded by `D / W`.

use std::time::Duration;

/// The error type for incremental backoff creation.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("the initial delay ({0:?}) should be greater than zero")]
    InvalidInitialDelay(Duration),
    #[error(
        "the maximum delay ({maximum:?}) should be greater than or equal to the initial delay ({initial:?})"
    )]
    EmptyRange {
        maximum: Duration,
        initial: Duration,
    },
}

/// A builder for [IncrementalBackoff].
///
/// # Example
/// ```
/// # use stratus_rpc::incremental_backoff::*;
/// use std::time::Duration;
/// let policy = IncrementalBackoffBuilder::new()
///     .with_initial_delay(Duration::from_secs(3))
///     .with_increment(Duration::from_secs(3))
///     .with_maximum_delay(Duration::from_secs(30))
///     .build()?;
/// # Ok::<(), Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct IncrementalBackoffBuilder {
    initial_delay: Duration,
    increment: Duration,
    maximum_delay: Duration,
}

impl IncrementalBackoffBuilder {
    pub fn new() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            increment: Duration::from_secs(3),
            maximum_delay: Duration::from_secs(60),
        }
    }

    /// Change the delay before the first retry.
    pub fn with_initial_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.initial_delay = v.into();
        self
    }

    /// Change the amount added to the delay after each failure.
    ///
    /// A zero increment produces a constant delay.
    pub fn with_increment<V: Into<Duration>>(mut self, v: V) -> Self {
        self.increment = v.into();
        self
    }

    /// Change the cap on the delay.
    pub fn with_maximum_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.maximum_delay = v.into();
        self
    }

    /// Creates the backoff policy, validating the configuration.
    pub fn build(self) -> Result<IncrementalBackoff, Error> {
        if self.initial_delay.is_zero() {
            return Err(Error::InvalidInitialDelay(self.initial_delay));
        }
        if self.maximum_delay < self.initial_delay {
            return Err(Error::EmptyRange {
                maximum: self.maximum_delay,
                initial: self.initial_delay,
            });
        }
        Ok(IncrementalBackoff {
            initial_delay: self.initial_delay,
            increment: self.increment,
            maximum_delay: self.maximum_delay,
        })
    }
}

impl Default for IncrementalBackoffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Implements linear backoff with a cap.
///
/// The delay before attempt `n + 1` is `initial + increment * (n - 1)`,
/// truncated at the maximum delay. No jitter is applied; the delays are
/// deterministic and monotonically non-decreasing.
#[derive(Clone, Debug)]
pub struct IncrementalBackoff {
    initial_delay: Duration,
    increment: Duration,
    maximum_delay: Duration,
}

impl Default for IncrementalBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            increment: Duration::from_secs(3),
            maximum_delay: Duration::from_secs(60),
        }
    }
}

impl crate::backoff_policy::BackoffPolicy for IncrementalBackoff {
    fn on_failure(&self, _loop_start: std::time::Instant, attempt_count: u32) -> Duration {
        let steps = attempt_count.saturating_sub(1);
        let delay = self
            .initial_delay
            .saturating_add(self.increment.saturating_mul(steps));
        std::cmp::min(delay, self.maximum_delay)
    }
}
