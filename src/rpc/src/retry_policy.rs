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

//! Defines traits for retry policies and some common implementations.
//!
//! Remote calls are retried when they fail due to transient errors and the
//! call is idempotent, that is, it is safe to perform the call more than
//! once. Mutating calls that attach a client token are idempotent by this
//! definition: the service deduplicates the repeated request.
//!
//! # Example
//! ```
//! use stratus_rpc::retry_policy::{RetryPolicyExt, TransientErrors};
//! use std::time::Duration;
//! // Retry transient errors for at most five minutes.
//! let policy = TransientErrors.with_time_limit(Duration::from_secs(5 * 60));
//! ```

use crate::error::{Error, ErrorClass, classify_with};
use crate::loop_state::LoopState;
use std::time::{Duration, Instant};

/// Controls the retry loop behavior.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Query the retry policy after an error.
    ///
    /// # Parameters
    /// * `loop_start` - when the retry loop started.
    /// * `attempt_count` - the number of attempts so far, including the one
    ///   that just failed. Always non-zero.
    /// * `idempotent` - if `true`, assume the call is safe to repeat.
    /// * `error` - the last error received for the call.
    fn on_error(
        &self,
        loop_start: Instant,
        attempt_count: u32,
        idempotent: bool,
        error: Error,
    ) -> LoopState;

    /// The remaining time in the retry policy.
    ///
    /// For policies based on time, this returns the remaining time in the
    /// policy. The retry loop uses this value to avoid starting a backoff
    /// sleep that could not complete before the deadline. Policies that are
    /// not time based return `None`.
    fn remaining_time(&self, _loop_start: Instant, _attempt_count: u32) -> Option<Duration> {
        None
    }
}

/// Extension trait for [RetryPolicy].
pub trait RetryPolicyExt: RetryPolicy + Sized {
    /// Decorate a [RetryPolicy] to limit the total elapsed time in the retry
    /// loop.
    fn with_time_limit(self, maximum_duration: Duration) -> LimitedElapsedTime<Self> {
        LimitedElapsedTime::custom(self, maximum_duration)
    }

    /// Decorate a [RetryPolicy] to limit the number of attempts.
    fn with_attempt_limit(self, maximum_attempts: u32) -> LimitedAttemptCount<Self> {
        LimitedAttemptCount::custom(self, maximum_attempts)
    }
}

impl<T: RetryPolicy> RetryPolicyExt for T {}

/// A retry policy that continues on transient errors and stops on anything
/// else.
///
/// This policy should be decorated to limit the duration of the retry loop or
/// the number of attempts. The retry decision follows the
/// [classifier][crate::error::classify]: only errors classified as retryable
/// continue the loop, and only when the call is idempotent. Not-found errors
/// are permanent at this layer; the caller decides whether "already gone" is
/// acceptable.
#[derive(Clone, Debug)]
pub struct TransientErrors;

impl RetryPolicy for TransientErrors {
    fn on_error(
        &self,
        _loop_start: Instant,
        _attempt_count: u32,
        idempotent: bool,
        error: Error,
    ) -> LoopState {
        match error.classify() {
            ErrorClass::Retryable if idempotent => LoopState::Continue(error),
            ErrorClass::Retryable => {
                // The error itself may recover, but repeating a
                // non-idempotent mutation is not safe.
                LoopState::Permanent(error)
            }
            ErrorClass::NotFound | ErrorClass::Fatal => LoopState::Permanent(error),
        }
    }
}

/// A [TransientErrors] variant that also continues on caller-listed codes.
///
/// Some operations transiently fail with codes that are permanent
/// elsewhere. A describe call issued during a state transition may report
/// `IncorrectStatus` until the object settles; callers list those codes per
/// operation. The listed codes never override the not-found
/// classification.
///
/// # Example
/// ```
/// use stratus_rpc::retry_policy::{RetryPolicyExt, TransientErrorsWithCodes};
/// use std::time::Duration;
/// let policy = TransientErrorsWithCodes::new(["IncorrectStatus"])
///     .with_time_limit(Duration::from_secs(5 * 60));
/// ```
#[derive(Clone, Debug)]
pub struct TransientErrorsWithCodes {
    extra_retryable: Vec<String>,
}

impl TransientErrorsWithCodes {
    /// Creates a policy treating `codes` as retryable in addition to the
    /// default retryable set.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extra_retryable: codes.into_iter().map(|s| s.into()).collect(),
        }
    }
}

impl RetryPolicy for TransientErrorsWithCodes {
    fn on_error(
        &self,
        _loop_start: Instant,
        _attempt_count: u32,
        idempotent: bool,
        error: Error,
    ) -> LoopState {
        let extra: Vec<&str> = self.extra_retryable.iter().map(String::as_str).collect();
        match classify_with(&error, &extra) {
            ErrorClass::Retryable if idempotent => LoopState::Continue(error),
            ErrorClass::Retryable => LoopState::Permanent(error),
            ErrorClass::NotFound | ErrorClass::Fatal => LoopState::Permanent(error),
        }
    }
}

/// A retry policy decorator that limits the total time in the retry loop.
///
/// While the elapsed time (including time in backoff) is less than the
/// prescribed duration, `on_error()` returns the result of the inner policy.
/// After that it returns [Exhausted][LoopState::Exhausted] whenever the inner
/// policy returns [Continue][LoopState::Continue].
///
/// # Parameters
/// * `P` - the inner retry policy, defaults to [TransientErrors].
#[derive(Clone, Debug)]
pub struct LimitedElapsedTime<P = TransientErrors>
where
    P: RetryPolicy,
{
    inner: P,
    maximum_duration: Duration,
}

impl LimitedElapsedTime {
    /// Creates a new instance with the default inner policy.
    ///
    /// # Example
    /// ```
    /// use stratus_rpc::retry_policy::{LimitedElapsedTime, RetryPolicy};
    /// use std::time::{Duration, Instant};
    /// let policy = LimitedElapsedTime::new(Duration::from_secs(10));
    /// let start = Instant::now() - Duration::from_secs(20);
    /// assert!(policy.on_error(start, 1, true, transient()).is_exhausted());
    ///
    /// use stratus_rpc::error::{Error, Status};
    /// fn transient() -> Error { Error::service(Status::default().set_code("ServiceUnavailable")) }
    /// ```
    pub fn new(maximum_duration: Duration) -> Self {
        Self {
            inner: TransientErrors,
            maximum_duration,
        }
    }
}

impl<P> LimitedElapsedTime<P>
where
    P: RetryPolicy,
{
    /// Creates a new instance with a custom inner policy.
    pub fn custom(inner: P, maximum_duration: Duration) -> Self {
        Self {
            inner,
            maximum_duration,
        }
    }
}

impl<P> RetryPolicy for LimitedElapsedTime<P>
where
    P: RetryPolicy + 'static,
{
    fn on_error(&self, start: Instant, count: u32, idempotent: bool, error: Error) -> LoopState {
        match self.inner.on_error(start, count, idempotent, error) {
            LoopState::Permanent(e) => LoopState::Permanent(e),
            LoopState::Exhausted(e) => LoopState::Exhausted(e),
            LoopState::Continue(e) => {
                if Instant::now() >= start + self.maximum_duration {
                    LoopState::Exhausted(e)
                } else {
                    LoopState::Continue(e)
                }
            }
        }
    }

    fn remaining_time(&self, start: Instant, count: u32) -> Option<Duration> {
        let deadline = start + self.maximum_duration;
        let remaining = deadline.saturating_duration_since(Instant::now());
        if let Some(inner) = self.inner.remaining_time(start, count) {
            return Some(std::cmp::min(remaining, inner));
        }
        Some(remaining)
    }
}

/// A retry policy decorator that limits the number of attempts.
///
/// The policy passes through the results of the inner policy as long as
/// `attempt_count < maximum_attempts`. Once the maximum number of attempts is
/// reached, the policy replaces [Continue][LoopState::Continue] with
/// [Exhausted][LoopState::Exhausted].
///
/// # Parameters
/// * `P` - the inner retry policy, defaults to [TransientErrors].
#[derive(Clone, Debug)]
pub struct LimitedAttemptCount<P = TransientErrors>
where
    P: RetryPolicy,
{
    inner: P,
    maximum_attempts: u32,
}

impl LimitedAttemptCount {
    /// Creates a new instance with the default inner policy.
    pub fn new(maximum_attempts: u32) -> Self {
        Self {
            inner: TransientErrors,
            maximum_attempts,
        }
    }
}

impl<P> LimitedAttemptCount<P>
where
    P: RetryPolicy,
{
    /// Creates a new instance with a custom inner policy.
    ///
    /// # Example
    /// ```
    /// use stratus_rpc::retry_policy::*;
    /// use std::time::Instant;
    /// let policy = LimitedAttemptCount::custom(TransientErrors, 2);
    /// assert!(policy.on_error(Instant::now(), 1, true, transient()).is_continue());
    /// assert!(policy.on_error(Instant::now(), 2, true, transient()).is_exhausted());
    ///
    /// use stratus_rpc::error::{Error, Status};
    /// fn transient() -> Error { Error::service(Status::default().set_code("ServiceUnavailable")) }
    /// ```
    pub fn custom(inner: P, maximum_attempts: u32) -> Self {
        Self {
            inner,
            maximum_attempts,
        }
    }
}

impl<P> RetryPolicy for LimitedAttemptCount<P>
where
    P: RetryPolicy,
{
    fn on_error(&self, start: Instant, count: u32, idempotent: bool, error: Error) -> LoopState {
        match self.inner.on_error(start, count, idempotent, error) {
            LoopState::Permanent(e) => LoopState::Permanent(e),
            LoopState::Exhausted(e) => LoopState::Exhausted(e),
            LoopState::Continue(e) => {
                if count >= self.maximum_attempts {
                    LoopState::Exhausted(e)
                } else {
                    LoopState::Continue(e)
                }
            }
        }
    }

    fn remaining_time(&self, start: Instant, count: u32) -> Option<Duration> {
        self.inner.remaining_time(start, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    mockall::mock! {
        #[derive(Debug)]
        Policy {}
        impl RetryPolicy for Policy {
            fn on_error(&self, loop_start: Instant, attempt_count: u32, idempotent: bool, error: Error) -> LoopState;
            fn remaining_time(&self, loop_start: Instant, attempt_count: u32) -> Option<Duration>;
        }
    }

    fn transient() -> Error {
        Error::service(Status::default().set_code("ServiceUnavailable"))
    }

    fn not_found() -> Error {
        Error::service(Status::default().set_code("EntityNotExist.Instance"))
    }

    fn fatal() -> Error {
        Error::service(Status::default().set_code("PermissionDenied"))
    }

    #[test]
    fn transient_errors_policy() {
        let p = TransientErrors;
        let now = Instant::now();

        assert!(p.on_error(now, 1, true, transient()).is_continue());
        assert!(p.on_error(now, 1, false, transient()).is_permanent());

        assert!(p.on_error(now, 1, true, not_found()).is_permanent());
        assert!(p.on_error(now, 1, true, fatal()).is_permanent());

        let transport = Error::transport(std::io::Error::other("reset"));
        assert!(p.on_error(now, 1, true, transport).is_continue());

        assert!(p.remaining_time(now, 1).is_none());
    }

    #[test]
    fn transient_errors_with_codes_policy() {
        let incorrect = || Error::service(Status::default().set_code("IncorrectStatus"));
        let p = TransientErrorsWithCodes::new(["IncorrectStatus"]);
        let now = Instant::now();

        assert!(p.on_error(now, 1, true, incorrect()).is_continue());
        assert!(p.on_error(now, 1, false, incorrect()).is_permanent());

        // The default retryable and not-found sets still apply.
        assert!(p.on_error(now, 1, true, transient()).is_continue());
        assert!(p.on_error(now, 1, true, not_found()).is_permanent());
        assert!(p.on_error(now, 1, true, fatal()).is_permanent());

        // Without the listed code the same error is permanent.
        assert!(
            TransientErrors
                .on_error(now, 1, true, incorrect())
                .is_permanent()
        );
    }

    #[test]
    fn limited_time_within_budget() {
        let policy = LimitedElapsedTime::new(Duration::from_secs(20));
        let rf = policy.on_error(Instant::now() - Duration::from_secs(10), 1, true, transient());
        assert!(rf.is_continue(), "{policy:?}");
    }

    #[test]
    fn limited_time_budget_spent() {
        let policy = LimitedElapsedTime::new(Duration::from_secs(20));
        let rf = policy.on_error(Instant::now() - Duration::from_secs(30), 1, true, transient());
        assert!(rf.is_exhausted(), "{policy:?}");
        // Fatal errors stay permanent, even past the deadline.
        let rf = policy.on_error(Instant::now() - Duration::from_secs(30), 1, true, fatal());
        assert!(rf.is_permanent(), "{policy:?}");
    }

    #[test]
    fn limited_time_remaining() {
        let policy = LimitedElapsedTime::new(Duration::from_secs(60));
        let start = Instant::now() - Duration::from_secs(10);
        let remaining = policy.remaining_time(start, 1).unwrap();
        assert!(remaining <= Duration::from_secs(50), "{remaining:?}");
        assert!(remaining > Duration::from_secs(45), "{remaining:?}");

        let start = Instant::now() - Duration::from_secs(90);
        let remaining = policy.remaining_time(start, 1).unwrap();
        assert_eq!(remaining, Duration::ZERO);
    }

    #[test]
    fn limited_time_remaining_prefers_shorter_inner() {
        let mut mock = MockPolicy::new();
        mock.expect_remaining_time()
            .times(1)
            .returning(|_, _| Some(Duration::from_secs(5)));
        let policy = LimitedElapsedTime::custom(mock, Duration::from_secs(60));
        let remaining = policy.remaining_time(Instant::now(), 1).unwrap();
        assert_eq!(remaining, Duration::from_secs(5));
    }

    #[test]
    fn limited_time_forwards_inner_decision() {
        let mut mock = MockPolicy::new();
        mock.expect_on_error()
            .times(2)
            .returning(|_, _, _, e| LoopState::Permanent(e));
        let policy = LimitedElapsedTime::custom(mock, Duration::from_secs(60));
        let now = Instant::now();
        assert!(
            policy
                .on_error(now - Duration::from_secs(10), 1, true, transient())
                .is_permanent()
        );
        assert!(
            policy
                .on_error(now - Duration::from_secs(90), 1, true, transient())
                .is_permanent()
        );
    }

    #[test]
    fn limited_attempts() {
        let policy = LimitedAttemptCount::new(3);
        let now = Instant::now();
        assert!(policy.on_error(now, 1, true, transient()).is_continue());
        assert!(policy.on_error(now, 2, true, transient()).is_continue());
        assert!(policy.on_error(now, 3, true, transient()).is_exhausted());
        assert!(policy.on_error(now, 1, true, fatal()).is_permanent());
    }

    #[test]
    fn limited_attempts_forwards_remaining_time() {
        let mut mock = MockPolicy::new();
        mock.expect_remaining_time()
            .times(1)
            .returning(|_, _| Some(Duration::from_secs(123)));
        let policy = LimitedAttemptCount::custom(mock, 3);
        assert_eq!(
            policy.remaining_time(Instant::now(), 1),
            Some(Duration::from_secs(123))
        );
    }

    #[test]
    fn composed_decorators() {
        let policy = TransientErrors
            .with_time_limit(Duration::from_secs(60))
            .with_attempt_limit(2);
        let now = Instant::now();
        assert!(policy.on_error(now, 1, true, transient()).is_continue());
        assert!(policy.on_error(now, 2, true, transient()).is_exhausted());
    }
}
