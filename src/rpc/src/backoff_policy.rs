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

//! Defines the trait implemented by all backoff strategies.
//!
//! Retry strategies should avoid immediately repeating a failed call, as the
//! service may need time to recover. The vendor API throttles aggressively,
//! so the default strategy grows the delay on every failure.
//!
//! Two implementations are provided: [IncrementalBackoff] grows the delay by
//! a fixed increment, [ExponentialBackoff] doubles it (by default) with full
//! jitter.
//!
//! [IncrementalBackoff]: crate::incremental_backoff::IncrementalBackoff
//! [ExponentialBackoff]: crate::exponential_backoff::ExponentialBackoff

/// Defines the trait implemented by all backoff strategies.
pub trait BackoffPolicy: Send + Sync + std::fmt::Debug {
    /// Returns the backoff delay after a failure.
    ///
    /// # Parameters
    /// * `loop_start` - when the retry loop started.
    /// * `attempt_count` - the number of attempts. This method is always
    ///   called after the first attempt, so the value is non-zero.
    fn on_failure(&self, loop_start: std::time::Instant, attempt_count: u32)
    -> std::time::Duration;
}
